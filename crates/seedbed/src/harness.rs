//! Ready environment handed to test suites.

use std::sync::Arc;

use camino::Utf8Path;
use tokio::sync::Mutex;

use seedbed_config::Config;

use crate::bootstrap::{BootstrapError, Phase, replenish};
use crate::guard;
use crate::health::HealthReporter;
use crate::seed::{Seeder, Settings};
use crate::services::Services;
use crate::staging::Stager;
use crate::store::{Store, StoreController};

struct ReadyState {
    controller: StoreController,
    seeder: Seeder,
    stager: Stager,
}

/// Environment in the ready state.
///
/// Suites share one harness and call [`Harness::reset`] between themselves.
/// Resets are serialised; services keep running across them.
pub struct Harness<P> {
    config: Arc<Config>,
    reporter: Arc<dyn HealthReporter>,
    store: Arc<dyn Store>,
    services: Services<P>,
    ready: Mutex<ReadyState>,
}

impl<P> Harness<P> {
    pub(crate) fn new(
        config: Arc<Config>,
        reporter: Arc<dyn HealthReporter>,
        controller: StoreController,
        seeder: Seeder,
        stager: Stager,
        services: Services<P>,
    ) -> Self {
        let store = Arc::clone(controller.store());
        Self {
            config,
            reporter,
            store,
            services,
            ready: Mutex::new(ReadyState {
                controller,
                seeder,
                stager,
            }),
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Seeded test store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Running services.
    #[must_use]
    pub fn services(&self) -> &Services<P> {
        &self.services
    }

    /// Test upload root recreated on every seed.
    #[must_use]
    pub fn upload_root(&self) -> &Utf8Path {
        self.config.test_upload_path()
    }

    /// Runtime settings as of the last seed.
    pub async fn settings(&self) -> Settings {
        self.ready.lock().await.seeder.settings().clone()
    }

    /// Returns the store and upload area to the seeded baseline.
    ///
    /// The guard is checked again against the retained targets before the
    /// store is emptied. Configuration is not re-resolved and services are
    /// not restarted.
    pub async fn reset(&self) -> Result<(), BootstrapError> {
        let mut ready = self.ready.lock().await;
        self.reporter.reseed_starting();
        self.reporter.phase_reached(Phase::Reseeding);

        match ready.reseed(&self.config).await {
            Ok(()) => {
                self.reporter.phase_reached(Phase::Ready);
                self.reporter.reseed_succeeded();
                Ok(())
            }
            Err(error) => {
                self.reporter.reseed_failed(&error);
                Err(error)
            }
        }
    }
}

impl ReadyState {
    async fn reseed(&mut self, config: &Config) -> Result<(), BootstrapError> {
        let pass = guard::check(self.controller.target(), config.production_store()).map_err(
            |source| BootstrapError::UnsafeEnvironment {
                phase: Phase::Reseeding,
                source,
            },
        )?;
        replenish(
            &self.controller,
            &pass,
            &mut self.seeder,
            &self.stager,
            Phase::Reseeding,
        )
        .await
    }
}
