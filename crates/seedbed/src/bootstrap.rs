//! Test environment bootstrap orchestration.
//!
//! The sequencer is a typestate machine. Each transition consumes the
//! previous state and runs exactly one component, so the store cannot be
//! emptied before the guard has passed and services cannot start against an
//! unseeded store.

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use strum::Display;
use thiserror::Error;
use tokio::time;

use seedbed_config::{Config, ConfigError};

use crate::cache::CacheRegistry;
use crate::guard::{self, GuardError, GuardPass};
use crate::harness::Harness;
use crate::health::HealthReporter;
use crate::seed::{SeedError, Seeder};
use crate::services::{ServiceContext, ServiceProvider, ServiceStartupError, Services};
use crate::staging::{Stager, StagingError};
use crate::store::{StoreConnector, StoreController, StoreError};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration snapshot.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that reads a JSON file through [`Config::load`].
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    path: Utf8PathBuf,
}

impl FileConfigLoader {
    /// Builds a loader for `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the loader reads.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load(&self.path)
    }
}

/// Loader returning a snapshot resolved earlier.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved snapshot.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// States of the bootstrap lifecycle.
///
/// The display form names the work that produces the state, which is what
/// diagnostics report when reaching it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Phase {
    /// Nothing has run.
    #[strum(serialize = "startup")]
    Unstarted,
    /// Configuration snapshot resolved.
    #[strum(serialize = "configuration")]
    ConfigResolved,
    /// Test store confirmed distinct from production.
    #[strum(serialize = "environment guard")]
    GuardPassed,
    /// Store connected and indexed.
    #[strum(serialize = "store connection")]
    StoreReady,
    /// Store emptied and seeded, uploads staged.
    #[strum(serialize = "seeding")]
    Seeded,
    /// Dependent services running.
    #[strum(serialize = "service startup")]
    ServicesUp,
    /// Environment ready for tests.
    #[strum(serialize = "bootstrap")]
    Ready,
    /// Reset back to the baseline in progress.
    #[strum(serialize = "reseed")]
    Reseeding,
}

/// Errors surfaced during bootstrap or reset.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The configuration source could not be read.
    #[error("configuration source unavailable: {source}")]
    ConfigMissing {
        /// Underlying resolver error.
        #[source]
        source: ConfigError,
    },
    /// The configuration was read but could not be resolved.
    #[error("configuration is invalid: {source}")]
    ConfigInvalid {
        /// Underlying resolver error.
        #[source]
        source: ConfigError,
    },
    /// The test store resolves to the production store.
    #[error("refusing to touch the store: {source}")]
    UnsafeEnvironment {
        /// Phase being entered.
        phase: Phase,
        /// Guard verdict.
        #[source]
        source: GuardError,
    },
    /// The store could not be reached or rejected an operation.
    #[error("test store unavailable: {source}")]
    StoreUnavailable {
        /// Phase being entered.
        phase: Phase,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// A seeding step failed.
    #[error("seeding failed: {source}")]
    SeedFailure {
        /// Phase being entered.
        phase: Phase,
        /// Underlying seeder error.
        #[source]
        source: SeedError,
    },
    /// Upload directories could not be recreated.
    #[error("upload staging failed: {source}")]
    FilesystemStagingFailure {
        /// Phase being entered.
        phase: Phase,
        /// Underlying filesystem error.
        #[source]
        source: StagingError,
    },
    /// A dependent service failed to start.
    #[error("{source}")]
    ServiceStartup {
        /// Underlying service error.
        #[source]
        source: ServiceStartupError,
    },
    /// The bootstrap exceeded its time budget.
    #[error("bootstrap did not finish within {budget:?}")]
    TimedOut {
        /// Budget that elapsed.
        budget: Duration,
    },
}

impl BootstrapError {
    /// Phase whose transition failed.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::ConfigMissing { .. } | Self::ConfigInvalid { .. } => Phase::ConfigResolved,
            Self::UnsafeEnvironment { phase, .. }
            | Self::StoreUnavailable { phase, .. }
            | Self::SeedFailure { phase, .. }
            | Self::FilesystemStagingFailure { phase, .. } => *phase,
            Self::ServiceStartup { .. } => Phase::ServicesUp,
            Self::TimedOut { .. } => Phase::Ready,
        }
    }

    pub(crate) fn from_config(source: ConfigError) -> Self {
        if source.is_missing_source() {
            Self::ConfigMissing { source }
        } else {
            Self::ConfigInvalid { source }
        }
    }
}

/// Initial state.
#[derive(Debug)]
pub struct Unstarted;

/// Configuration resolved.
#[derive(Debug)]
pub struct ConfigResolved {
    config: Arc<Config>,
}

/// Guard passed; the store may be emptied.
#[derive(Debug)]
pub struct GuardPassed {
    config: Arc<Config>,
    pass: GuardPass,
}

/// Store connected.
pub struct StoreReady {
    config: Arc<Config>,
    pass: GuardPass,
    controller: StoreController,
}

/// Store seeded and uploads staged.
pub struct Seeded {
    config: Arc<Config>,
    controller: StoreController,
    seeder: Seeder,
    stager: Stager,
}

/// Services running.
pub struct ServicesUp<P> {
    config: Arc<Config>,
    controller: StoreController,
    seeder: Seeder,
    stager: Stager,
    services: Services<P>,
}

/// Bootstrap sequencer in state `S`.
pub struct Bootstrap<S> {
    state: S,
    reporter: Arc<dyn HealthReporter>,
}

impl<S> Bootstrap<S> {
    fn enter(state: S, reporter: Arc<dyn HealthReporter>, phase: Phase) -> Self {
        reporter.phase_reached(phase);
        Self { state, reporter }
    }
}

impl Bootstrap<Unstarted> {
    /// Starts a sequence that reports to `reporter`.
    #[must_use]
    pub fn new(reporter: Arc<dyn HealthReporter>) -> Self {
        Self {
            state: Unstarted,
            reporter,
        }
    }

    /// Resolves the configuration snapshot.
    pub fn resolve_config(
        self,
        loader: &dyn ConfigLoader,
    ) -> Result<Bootstrap<ConfigResolved>, BootstrapError> {
        let config = loader.load().map_err(BootstrapError::from_config)?;
        let state = ConfigResolved {
            config: Arc::new(config),
        };
        Ok(Bootstrap::enter(state, self.reporter, Phase::ConfigResolved))
    }
}

impl Bootstrap<ConfigResolved> {
    /// Resolved snapshot.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Confirms the test store is not the production store.
    pub fn check_guard(self) -> Result<Bootstrap<GuardPassed>, BootstrapError> {
        let Self { state, reporter } = self;
        let config = state.config;
        let pass = guard::check(config.test_store(), config.production_store()).map_err(
            |source| BootstrapError::UnsafeEnvironment {
                phase: Phase::GuardPassed,
                source,
            },
        )?;
        Ok(Bootstrap::enter(GuardPassed { config, pass }, reporter, Phase::GuardPassed))
    }
}

impl Bootstrap<GuardPassed> {
    /// Connects to the test store and builds its indices.
    pub async fn open_store(
        self,
        connector: &dyn StoreConnector,
    ) -> Result<Bootstrap<StoreReady>, BootstrapError> {
        let unavailable = |source| BootstrapError::StoreUnavailable {
            phase: Phase::StoreReady,
            source,
        };
        let controller =
            StoreController::connect(connector, self.state.config.test_store()).map_err(unavailable)?;
        controller.init().await.map_err(unavailable)?;
        controller.create_indices().await.map_err(unavailable)?;

        let GuardPassed { config, pass } = self.state;
        let state = StoreReady {
            config,
            pass,
            controller,
        };
        Ok(Bootstrap::enter(state, self.reporter, Phase::StoreReady))
    }
}

impl Bootstrap<StoreReady> {
    /// Empties the store, seeds the baseline, and stages uploads.
    pub async fn seed(self, caches: CacheRegistry) -> Result<Bootstrap<Seeded>, BootstrapError> {
        let StoreReady {
            config,
            pass,
            controller,
        } = self.state;
        let mut seeder = Seeder::new(Arc::clone(controller.store()), Arc::clone(&config), caches)
            .map_err(|source| BootstrapError::SeedFailure {
                phase: Phase::Seeded,
                source,
            })?;
        let stager = Stager::from_config(&config);
        replenish(&controller, &pass, &mut seeder, &stager, Phase::Seeded).await?;

        let state = Seeded {
            config,
            controller,
            seeder,
            stager,
        };
        Ok(Bootstrap::enter(state, self.reporter, Phase::Seeded))
    }
}

impl Bootstrap<Seeded> {
    /// Starts every dependent service in order.
    pub async fn start_services<P>(
        self,
        provider: P,
    ) -> Result<Bootstrap<ServicesUp<P>>, BootstrapError>
    where
        P: ServiceProvider,
    {
        let Seeded {
            config,
            controller,
            seeder,
            stager,
        } = self.state;
        let context = ServiceContext {
            config: &config,
            store: controller.store(),
        };
        let services = Services::start_all(provider, context, self.reporter.as_ref())
            .await
            .map_err(|source| BootstrapError::ServiceStartup { source })?;

        let state = ServicesUp {
            config,
            controller,
            seeder,
            stager,
            services,
        };
        Ok(Bootstrap::enter(state, self.reporter, Phase::ServicesUp))
    }
}

impl<P> Bootstrap<ServicesUp<P>> {
    /// Enters the ready state.
    pub fn finish(self) -> Harness<P> {
        let ServicesUp {
            config,
            controller,
            seeder,
            stager,
            services,
        } = self.state;
        self.reporter.phase_reached(Phase::Ready);
        self.reporter.bootstrap_succeeded(&config);
        Harness::new(config, self.reporter, controller, seeder, stager, services)
    }
}

/// Empties the store, runs the seeder, and stages uploads.
pub(crate) async fn replenish(
    controller: &StoreController,
    pass: &GuardPass,
    seeder: &mut Seeder,
    stager: &Stager,
    phase: Phase,
) -> Result<(), BootstrapError> {
    controller
        .empty(pass)
        .await
        .map_err(|source| BootstrapError::StoreUnavailable { phase, source })?;
    seeder
        .seed()
        .await
        .map_err(|source| BootstrapError::SeedFailure { phase, source })?;
    stager
        .stage()
        .map_err(|source| BootstrapError::FilesystemStagingFailure { phase, source })
}

/// Bootstraps the test environment using the supplied collaborators.
pub async fn bootstrap_with<P>(
    loader: &dyn ConfigLoader,
    connector: &dyn StoreConnector,
    reporter: Arc<dyn HealthReporter>,
    provider: P,
) -> Result<Harness<P>, BootstrapError>
where
    P: ServiceProvider,
{
    reporter.bootstrap_starting();
    let result = run_sequence(loader, connector, Arc::clone(&reporter), provider).await;
    if let Err(error) = &result {
        reporter.bootstrap_failed(error);
    }
    result
}

/// Like [`bootstrap_with`], failing with [`BootstrapError::TimedOut`] when
/// the whole sequence exceeds `budget`.
pub async fn bootstrap_with_timeout<P>(
    budget: Duration,
    loader: &dyn ConfigLoader,
    connector: &dyn StoreConnector,
    reporter: Arc<dyn HealthReporter>,
    provider: P,
) -> Result<Harness<P>, BootstrapError>
where
    P: ServiceProvider,
{
    let observer = Arc::clone(&reporter);
    match time::timeout(budget, bootstrap_with(loader, connector, reporter, provider)).await {
        Ok(result) => result,
        Err(_) => {
            let error = BootstrapError::TimedOut { budget };
            observer.bootstrap_failed(&error);
            Err(error)
        }
    }
}

async fn run_sequence<P>(
    loader: &dyn ConfigLoader,
    connector: &dyn StoreConnector,
    reporter: Arc<dyn HealthReporter>,
    provider: P,
) -> Result<Harness<P>, BootstrapError>
where
    P: ServiceProvider,
{
    let harness = Bootstrap::new(reporter)
        .resolve_config(loader)?
        .check_guard()?
        .open_store(connector)
        .await?
        .seed(CacheRegistry::with_defaults())
        .await?
        .start_services(provider)
        .await?
        .finish();
    Ok(harness)
}
