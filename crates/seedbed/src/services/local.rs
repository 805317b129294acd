use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::{ServiceContext, ServiceKind, ServiceProvider, ServiceStartupError};

const SERVICES_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::services");
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const JOB_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct LocalState {
    server_addr: Option<SocketAddr>,
    realtime_origins: Option<String>,
    tasks: Vec<JoinHandle<()>>,
}

/// Runs every service inside the current tokio runtime.
///
/// The web listener accepts and closes connections, the realtime transport
/// records its allowed origins against that listener, and the job runners
/// tick on an interval. Background tasks are aborted when the provider is
/// dropped.
#[derive(Debug, Default)]
pub struct LocalServiceProvider {
    state: Mutex<LocalState>,
}

impl LocalServiceProvider {
    /// Builds a provider with nothing started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the web listener bound to.
    #[must_use]
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.state().server_addr
    }

    /// Origins the realtime transport accepts.
    #[must_use]
    pub fn realtime_origins(&self) -> Option<String> {
        self.state().realtime_origins.clone()
    }

    fn state(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn start_web_listener(&self, context: ServiceContext<'_>) -> Result<(), ServiceStartupError> {
        let host = context
            .config
            .get("bind_address")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BIND_ADDRESS);
        let listener = TcpListener::bind((host, context.config.port()))
            .await
            .map_err(|error| {
                ServiceStartupError::with_source(
                    ServiceKind::WebListener,
                    format!("failed to bind {host}:{}", context.config.port()),
                    error,
                )
            })?;
        let addr = listener.local_addr().map_err(|error| {
            ServiceStartupError::with_source(
                ServiceKind::WebListener,
                "listener has no local address",
                error,
            )
        })?;
        info!(target: SERVICES_TARGET, %addr, "web listener bound");

        let task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        debug!(target: SERVICES_TARGET, %peer, "connection accepted");
                        drop(stream);
                    }
                    Err(error) => {
                        debug!(target: SERVICES_TARGET, %error, "accept failed");
                    }
                }
            }
        });

        let mut state = self.state();
        state.server_addr = Some(addr);
        state.tasks.push(task);
        Ok(())
    }

    fn start_realtime(&self, context: ServiceContext<'_>) -> Result<(), ServiceStartupError> {
        let mut state = self.state();
        let Some(addr) = state.server_addr else {
            return Err(ServiceStartupError::new(
                ServiceKind::Realtime,
                "realtime transport requires a running web listener",
            ));
        };
        let origins = context.config.realtime_origins().to_string();
        info!(target: SERVICES_TARGET, %addr, origins = %origins, "realtime transport attached");
        state.realtime_origins = Some(origins);
        Ok(())
    }

    fn start_jobs(&self, kind: ServiceKind) {
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(JOB_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(target: SERVICES_TARGET, jobs = %kind, "job tick");
            }
        });
        self.state().tasks.push(task);
    }
}

#[async_trait]
impl ServiceProvider for LocalServiceProvider {
    async fn start_service(
        &self,
        kind: ServiceKind,
        context: ServiceContext<'_>,
    ) -> Result<(), ServiceStartupError> {
        match kind {
            ServiceKind::SessionStore => context.store.init_session_store().await.map_err(|error| {
                ServiceStartupError::with_source(kind, "session store initialisation failed", error)
            }),
            ServiceKind::WebListener => self.start_web_listener(context).await,
            ServiceKind::Realtime => self.start_realtime(context),
            ServiceKind::NotificationJobs | ServiceKind::UserJobs => {
                self.start_jobs(kind);
                Ok(())
            }
        }
    }
}

impl Drop for LocalServiceProvider {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in state.tasks.drain(..) {
            task.abort();
        }
    }
}
