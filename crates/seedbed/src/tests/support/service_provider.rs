//! Service providers that record start requests and support injected
//! failures or stalls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::services::{ServiceContext, ServiceKind, ServiceProvider, ServiceStartupError};

/// Service provider that records requests and supports injected failures.
#[derive(Clone, Default)]
pub struct RecordingServiceProvider {
    state: Arc<Mutex<ServiceState>>,
}

impl RecordingServiceProvider {
    /// Configures the provider to fail for the specified service.
    pub fn fail_on(&self, kind: ServiceKind, message: impl Into<String>) {
        let mut state = self.state.lock().expect("service state mutex poisoned");
        state.failures.insert(kind, message.into());
    }

    /// Returns all services that were requested.
    #[must_use]
    pub fn recorded_starts(&self) -> Vec<ServiceKind> {
        let state = self.state.lock().expect("service state mutex poisoned");
        state.starts.clone()
    }
}

#[async_trait]
impl ServiceProvider for RecordingServiceProvider {
    async fn start_service(
        &self,
        kind: ServiceKind,
        context: ServiceContext<'_>,
    ) -> Result<(), ServiceStartupError> {
        let failure = {
            let mut state = self.state.lock().expect("service state mutex poisoned");
            state.starts.push(kind);
            state.failures.get(&kind).cloned()
        };
        if let Some(message) = failure {
            return Err(ServiceStartupError::new(kind, message));
        }
        if kind == ServiceKind::SessionStore {
            context.store.init_session_store().await.map_err(|error| {
                ServiceStartupError::with_source(kind, "session store unavailable", error)
            })?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct ServiceState {
    starts: Vec<ServiceKind>,
    failures: HashMap<ServiceKind, String>,
}

/// Provider whose first service never finishes starting.
#[derive(Debug, Default, Clone, Copy)]
pub struct StalledServiceProvider;

#[async_trait]
impl ServiceProvider for StalledServiceProvider {
    async fn start_service(
        &self,
        _kind: ServiceKind,
        _context: ServiceContext<'_>,
    ) -> Result<(), ServiceStartupError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}
