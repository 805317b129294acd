//! BDD test world: owns the loader, spy store, reporter, provider, and the
//! harness or bootstrap error produced by a scenario.

use std::cell::RefCell;
use std::sync::Arc;

use serde_json::json;
use tokio::runtime::{Builder, Runtime};

use crate::bootstrap::{BootstrapError, bootstrap_with};
use crate::harness::Harness;
use crate::seed::{SETTINGS_KEY, extensions, privileges};
use crate::store::Store;

use super::config_loader::TestConfigLoader;
use super::reporter::RecordingHealthReporter;
use super::service_provider::RecordingServiceProvider;
use super::snapshot::{Snapshot, snapshot};
use super::store::{SpyConnector, SpyStore};

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    runtime: Runtime,
    pub loader: TestConfigLoader,
    pub store: SpyStore,
    pub reporter: Arc<RecordingHealthReporter>,
    pub provider: RecordingServiceProvider,
    harness: Option<Harness<RecordingServiceProvider>>,
    bootstrap_error: Option<BootstrapError>,
    reset_result: Option<Result<(), BootstrapError>>,
    baseline: Option<Snapshot>,
}

impl TestWorld {
    /// Builds a world with an isolated configuration.
    #[must_use]
    pub fn new() -> Self {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build test runtime");
        Self {
            runtime,
            loader: TestConfigLoader::new(),
            store: SpyStore::default(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            provider: RecordingServiceProvider::default(),
            harness: None,
            bootstrap_error: None,
            reset_result: None,
            baseline: None,
        }
    }

    /// Points the test store at the production database.
    pub fn use_identical_targets(&mut self) {
        let loader = std::mem::replace(&mut self.loader, TestConfigLoader::new());
        self.loader = loader.with_identical_targets();
    }

    /// Writes records the bootstrap is expected to discard.
    pub fn plant_stale_records(&self) {
        let store = self.store.backing();
        self.runtime.block_on(async {
            store.init().await.expect("store should connect");
            store
                .set_object_field("user:1", "username", json!("leftover"))
                .await
                .expect("stale record should be written");
            store
                .set_object_field(SETTINGS_KEY, "postDelay", json!(45))
                .await
                .expect("stale setting should be written");
        });
    }

    /// Creates a file the staging step is expected to discard.
    pub fn plant_stale_upload(&self) {
        self.loader.plant_upload("files/stale.png");
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.harness.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        let connector = SpyConnector::new(self.store.clone());
        let result = self.runtime.block_on(bootstrap_with(
            &self.loader,
            &connector,
            self.reporter.clone(),
            self.provider.clone(),
        ));
        match result {
            Ok(harness) => {
                let baseline = self.runtime.block_on(snapshot(harness.store().as_ref()));
                self.baseline = Some(baseline);
                self.harness = Some(harness);
            }
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Mutates store state the way a test suite would.
    pub fn dirty_environment(&self) {
        let Some(harness) = self.harness.as_ref() else {
            return;
        };
        let store = harness.store().as_ref();
        self.runtime.block_on(async {
            store
                .set_object_field(SETTINGS_KEY, "title", json!("Renamed by a suite"))
                .await
                .expect("setting should be written");
            store
                .set_object_field("post:7", "content", json!("hello"))
                .await
                .expect("post should be written");
            privileges::give(store, &["chat"], privileges::GUESTS)
                .await
                .expect("grant should be written");
            extensions::activate(store, "nodebb-plugin-emoji")
                .await
                .expect("extension should activate");
        });
        self.loader.plant_upload("profile/avatar.png");
    }

    /// Resets the harness back to its baseline.
    pub fn reset(&mut self) {
        let Some(harness) = self.harness.as_ref() else {
            return;
        };
        let result = self.runtime.block_on(harness.reset());
        self.reset_result = Some(result);
    }

    /// Returns the bootstrap error, if any.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns true when a ready harness is available.
    #[must_use]
    pub fn harness_ready(&self) -> bool {
        self.harness.is_some()
    }

    /// Returns the last reset outcome, if any.
    #[must_use]
    pub fn reset_result(&self) -> Option<&Result<(), BootstrapError>> {
        self.reset_result.as_ref()
    }

    /// Store state captured right after bootstrap.
    #[must_use]
    pub fn baseline(&self) -> Option<&Snapshot> {
        self.baseline.as_ref()
    }

    /// Current store state.
    #[must_use]
    pub fn current(&self) -> Option<Snapshot> {
        let harness = self.harness.as_ref()?;
        Some(self.runtime.block_on(snapshot(harness.store().as_ref())))
    }

    /// Whether `group` holds the global `privilege`.
    pub fn group_can(&self, privilege: &str, group: &str) -> Result<bool, String> {
        let harness = self
            .harness
            .as_ref()
            .ok_or_else(|| "no harness available".to_string())?;
        self.runtime
            .block_on(privileges::global_can(harness.store().as_ref(), privilege, group))
            .map_err(|error| error.to_string())
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
