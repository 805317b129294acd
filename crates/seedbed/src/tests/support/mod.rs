//! Test harness utilities for the bootstrap suites.

mod config_loader;
mod reporter;
mod service_provider;
mod snapshot;
mod store;
mod world;

pub use config_loader::{MissingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use service_provider::{RecordingServiceProvider, StalledServiceProvider};
pub use snapshot::{Snapshot, snapshot};
pub use store::{SpyConnector, SpyStore};
pub use world::{TestWorld, world};
