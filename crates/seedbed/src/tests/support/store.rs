//! Spy store: delegates to [`MemoryStore`] while recording every call and
//! supporting injected failures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use seedbed_config::StoreTarget;

use crate::store::{MemoryStore, Store, StoreConnector, StoreError};

/// Store double that records operation names in call order.
#[derive(Clone, Default)]
pub struct SpyStore {
    inner: Arc<MemoryStore>,
    state: Arc<Mutex<SpyState>>,
}

#[derive(Default)]
struct SpyState {
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, String>,
}

impl SpyStore {
    /// Makes every later call to `operation` fail.
    pub fn fail_on(&self, operation: &'static str, message: impl Into<String>) {
        let mut state = self.state.lock().expect("spy store mutex poisoned");
        state.failures.insert(operation, message.into());
    }

    /// Clears an injected failure.
    pub fn recover(&self, operation: &str) {
        let mut state = self.state.lock().expect("spy store mutex poisoned");
        state.failures.remove(operation);
    }

    /// Operation names in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .expect("spy store mutex poisoned")
            .calls
            .clone()
    }

    /// Number of calls to `operation`.
    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|call| **call == operation).count()
    }

    /// Position of the first call to `operation`.
    #[must_use]
    pub fn first(&self, operation: &str) -> Option<usize> {
        self.calls().iter().position(|call| *call == operation)
    }

    /// Underlying store, bypassing the recorder.
    #[must_use]
    pub fn backing(&self) -> &MemoryStore {
        &self.inner
    }

    fn record(&self, operation: &'static str) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("spy store mutex poisoned");
        state.calls.push(operation);
        match state.failures.get(operation) {
            Some(message) => Err(StoreError::Operation {
                operation,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Store for SpyStore {
    async fn init(&self) -> Result<(), StoreError> {
        self.record("init")?;
        self.inner.init().await
    }

    async fn create_indices(&self) -> Result<(), StoreError> {
        self.record("create_indices")?;
        self.inner.create_indices().await
    }

    async fn empty(&self) -> Result<(), StoreError> {
        self.record("empty")?;
        self.inner.empty().await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.record("keys")?;
        self.inner.keys().await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.record("delete")?;
        self.inner.delete(key).await
    }

    async fn get_object(&self, key: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        self.record("get_object")?;
        self.inner.get_object(key).await
    }

    async fn set_object_field(
        &self,
        key: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.record("set_object_field")?;
        self.inner.set_object_field(key, field, value).await
    }

    async fn set_add(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        self.record("set_add")?;
        self.inner.set_add(key, members).await
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.record("set_members")?;
        self.inner.set_members(key).await
    }

    async fn is_set_member(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.record("is_set_member")?;
        self.inner.is_set_member(key, member).await
    }

    async fn sorted_set_add(&self, key: &str, entries: &[(i64, String)]) -> Result<(), StoreError> {
        self.record("sorted_set_add")?;
        self.inner.sorted_set_add(key, entries).await
    }

    async fn sorted_set_range(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.record("sorted_set_range")?;
        self.inner.sorted_set_range(key).await
    }

    async fn init_session_store(&self) -> Result<(), StoreError> {
        self.record("init_session_store")?;
        self.inner.init_session_store().await
    }
}

/// Connector that always hands out the same spy store.
#[derive(Clone, Default)]
pub struct SpyConnector {
    store: SpyStore,
    targets: Arc<Mutex<Vec<StoreTarget>>>,
}

impl SpyConnector {
    /// Builds a connector serving `store`.
    #[must_use]
    pub fn new(store: SpyStore) -> Self {
        Self {
            store,
            targets: Arc::default(),
        }
    }

    /// Targets connected to, in order.
    #[must_use]
    pub fn targets(&self) -> Vec<StoreTarget> {
        self.targets
            .lock()
            .expect("connector mutex poisoned")
            .clone()
    }
}

impl StoreConnector for SpyConnector {
    fn connect(&self, target: &StoreTarget) -> Result<Arc<dyn Store>, StoreError> {
        self.targets
            .lock()
            .expect("connector mutex poisoned")
            .push(target.clone());
        Ok(Arc::new(self.store.clone()))
    }
}
