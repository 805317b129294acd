//! Refuses to run against the production data store.

use thiserror::Error;
use tracing::{error, info};

use seedbed_config::StoreTarget;

const GUARD_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::guard");

/// Raised when the test store resolves to the production store.
#[derive(Debug, Error)]
#[error("test store {test} addresses the production store {production}")]
pub struct GuardError {
    /// Target the bootstrap would have wiped.
    pub test: StoreTarget,
    /// Production target it collides with.
    pub production: StoreTarget,
}

/// Proof that the environment guard accepted the active targets.
///
/// Only [`check`] can produce a pass, and the destructive store operation
/// demands one, so the store cannot be emptied before the guard has run.
#[derive(Debug)]
pub struct GuardPass {
    _sealed: (),
}

/// Accepts the targets when they differ in host, port, or database.
pub fn check(test: &StoreTarget, production: &StoreTarget) -> Result<GuardPass, GuardError> {
    if test.same_environment(production) {
        error!(
            target: GUARD_TARGET,
            test = %test,
            production = %production,
            "test store collides with production store"
        );
        return Err(GuardError {
            test: test.clone(),
            production: production.clone(),
        });
    }
    info!(
        target: GUARD_TARGET,
        test = %test,
        "test store is isolated from production"
    );
    Ok(GuardPass { _sealed: () })
}
