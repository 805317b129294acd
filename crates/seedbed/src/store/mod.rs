//! Data-store capability set and the lifecycle controller wrapped around it.
//!
//! The bootstrap never talks to a storage engine directly. A
//! [`StoreConnector`] turns the resolved test [`StoreTarget`] into a [`Store`]
//! handle, and the [`StoreController`] drives the lifecycle calls on it:
//! connection, optional index creation, and the irreversible wipe. The wipe
//! requires a [`GuardPass`], which only the environment guard can mint.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use seedbed_config::{StoreEngine, StoreTarget};

use crate::guard::GuardPass;

pub use memory::MemoryStore;

const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// Errors reported by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No driver for the engine is compiled into this build.
    #[error("store engine '{engine}' is not available in this build")]
    UnsupportedEngine {
        /// Engine named by the configuration.
        engine: StoreEngine,
    },
    /// Establishing the connection failed.
    #[error("failed to connect to {target}: {message}")]
    Connection {
        /// Display form of the target.
        target: String,
        /// Driver message.
        message: String,
    },
    /// An operation ran before `init`.
    #[error("store used before initialisation")]
    NotInitialised,
    /// A key holds a different structure than the operation expects.
    #[error("key '{key}' holds a {found}, expected a {expected}")]
    WrongType {
        /// Offending key.
        key: String,
        /// Structure the operation needs.
        expected: &'static str,
        /// Structure found under the key.
        found: &'static str,
    },
    /// Any other driver failure.
    #[error("store operation '{operation}' failed: {message}")]
    Operation {
        /// Name of the failing call.
        operation: &'static str,
        /// Driver message.
        message: String,
    },
}

/// Operations the bootstrap and the seeder need from a data store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Establishes the connection. Calling it again on a live store is a no-op.
    async fn init(&self) -> Result<(), StoreError>;

    /// Builds secondary indices. Engines without indices keep the default.
    async fn create_indices(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Erases every record in the connected database.
    async fn empty(&self) -> Result<(), StoreError>;

    /// Lists every key currently stored.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Removes a key of any type.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Reads a hash.
    async fn get_object(&self, key: &str) -> Result<Option<Map<String, Value>>, StoreError>;

    /// Writes one hash field, creating the hash when absent.
    async fn set_object_field(&self, key: &str, field: &str, value: Value)
    -> Result<(), StoreError>;

    /// Adds members to a set.
    async fn set_add(&self, key: &str, members: &[String]) -> Result<(), StoreError>;

    /// Lists set members in lexical order.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Tests set membership.
    async fn is_set_member(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Adds scored members to a sorted set; existing members take the new score.
    async fn sorted_set_add(&self, key: &str, entries: &[(i64, String)]) -> Result<(), StoreError>;

    /// Lists sorted-set members by ascending score.
    async fn sorted_set_range(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Prepares the session store backed by this connection.
    async fn init_session_store(&self) -> Result<(), StoreError>;
}

/// Opens store handles for a target.
pub trait StoreConnector: Send + Sync {
    /// Returns an unconnected handle; `init` is driven by the controller.
    fn connect(&self, target: &StoreTarget) -> Result<Arc<dyn Store>, StoreError>;
}

/// Connector for the engines compiled into this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinConnector;

impl StoreConnector for BuiltinConnector {
    fn connect(&self, target: &StoreTarget) -> Result<Arc<dyn Store>, StoreError> {
        match target.engine() {
            StoreEngine::Memory => Ok(Arc::new(MemoryStore::new())),
            engine => {
                warn!(
                    target: STORE_TARGET,
                    %engine,
                    store = %target,
                    "no driver for configured engine"
                );
                Err(StoreError::UnsupportedEngine { engine })
            }
        }
    }
}

/// Lifecycle wrapper around the test store connection.
pub struct StoreController {
    store: Arc<dyn Store>,
    target: StoreTarget,
}

impl StoreController {
    /// Opens a handle for `target` through `connector`.
    pub fn connect(connector: &dyn StoreConnector, target: &StoreTarget) -> Result<Self, StoreError> {
        let store = connector.connect(target)?;
        Ok(Self {
            store,
            target: target.clone(),
        })
    }

    /// Establishes the connection.
    pub async fn init(&self) -> Result<(), StoreError> {
        self.store.init().await?;
        info!(target: STORE_TARGET, store = %self.target, "store connection established");
        Ok(())
    }

    /// Builds indices when the engine supports them.
    pub async fn create_indices(&self) -> Result<(), StoreError> {
        self.store.create_indices().await?;
        debug!(target: STORE_TARGET, store = %self.target, "store indices ready");
        Ok(())
    }

    /// Irreversibly erases the test database.
    pub async fn empty(&self, _pass: &GuardPass) -> Result<(), StoreError> {
        self.store.empty().await?;
        info!(target: STORE_TARGET, store = %self.target, "test store flushed");
        Ok(())
    }

    /// Shared handle for seeding and services.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Target this controller is connected to.
    #[must_use]
    pub fn target(&self) -> &StoreTarget {
        &self.target
    }
}
