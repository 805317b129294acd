//! Bootstrap orchestration for an isolated forum test environment.
//!
//! Before any test suite runs, the environment has to be brought to a known
//! baseline: configuration resolved, the test store confirmed distinct from
//! production, the store emptied and seeded with default settings,
//! privileges, extensions and theme, the upload area recreated, and the
//! dependent services started. The [`bootstrap`](crate::bootstrap_with)
//! sequence does this in that order and hands back a [`Harness`] in the ready
//! state. Suites call [`Harness::reset`] to return to the same baseline.
//!
//! Every phase reports through a [`HealthReporter`], and the first failure
//! aborts the sequence with a [`BootstrapError`] naming the phase. No partial
//! environment is ever handed out.

mod bootstrap;
pub mod cache;
mod cli;
mod guard;
mod harness;
mod health;
pub mod seed;
mod services;
mod shared;
mod staging;
pub mod store;
mod telemetry;

pub use bootstrap::{
    Bootstrap, BootstrapError, ConfigLoader, ConfigResolved, FileConfigLoader, GuardPassed, Phase,
    Seeded, ServicesUp, StaticConfigLoader, StoreReady, Unstarted, bootstrap_with,
    bootstrap_with_timeout,
};
pub use cache::{CacheRegistry, KeyValueCache, ResettableCache};
pub use cli::run;
pub use guard::{GuardError, GuardPass, check as check_environment};
pub use harness::Harness;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use seed::{SeedError, SeedStep, Seeder, Settings};
pub use services::{
    LocalServiceProvider, STARTUP_ORDER, ServiceContext, ServiceKind, ServiceKindParseError,
    ServiceProvider, ServiceStartupError, Services,
};
pub use shared::shared_harness;
pub use staging::{Stager, StagingError};
pub use store::{BuiltinConnector, MemoryStore, Store, StoreConnector, StoreController, StoreError};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

#[cfg(test)]
mod tests;
