//! One harness per test process.

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use tokio::sync::OnceCell;

use crate::bootstrap::{BootstrapError, FileConfigLoader, bootstrap_with_timeout};
use crate::harness::Harness;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::services::LocalServiceProvider;
use crate::store::BuiltinConnector;

static SHARED: OnceCell<Harness<LocalServiceProvider>> = OnceCell::const_new();

/// Bootstraps the process-wide harness on first call and returns it.
///
/// Concurrent first calls wait on the same bootstrap. A failed bootstrap is
/// not memoised, so the next caller attempts it again.
pub async fn shared_harness(
    config_path: impl Into<Utf8PathBuf>,
    budget: Duration,
) -> Result<&'static Harness<LocalServiceProvider>, BootstrapError> {
    let loader = FileConfigLoader::new(config_path);
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    SHARED
        .get_or_try_init(|| {
            bootstrap_with_timeout(
                budget,
                &loader,
                &BuiltinConnector,
                reporter,
                LocalServiceProvider::new(),
            )
        })
        .await
}
