//! Structured health reporting for bootstrap lifecycle events.

use std::sync::Arc;

use seedbed_config::Config;

use crate::bootstrap::{BootstrapError, Phase};
use crate::services::{ServiceKind, ServiceStartupError};

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked each time the sequencer enters a new phase.
    fn phase_reached(&self, phase: Phase);

    /// Invoked once the environment is ready for tests.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before a service is started.
    fn service_starting(&self, kind: ServiceKind);

    /// Invoked after a service starts successfully.
    fn service_ready(&self, kind: ServiceKind);

    /// Invoked when a service fails to start.
    fn service_failed(&self, error: &ServiceStartupError);

    /// Invoked when a reset begins.
    fn reseed_starting(&self);

    /// Invoked when a reset returns the environment to its baseline.
    fn reseed_succeeded(&self);

    /// Invoked when a reset fails.
    fn reseed_failed(&self, error: &BootstrapError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn phase_reached(&self, phase: Phase) {
        (**self).phase_reached(phase);
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn service_starting(&self, kind: ServiceKind) {
        (**self).service_starting(kind);
    }

    fn service_ready(&self, kind: ServiceKind) {
        (**self).service_ready(kind);
    }

    fn service_failed(&self, error: &ServiceStartupError) {
        (**self).service_failed(error);
    }

    fn reseed_starting(&self) {
        (**self).reseed_starting();
    }

    fn reseed_succeeded(&self) {
        (**self).reseed_succeeded();
    }

    fn reseed_failed(&self, error: &BootstrapError) {
        (**self).reseed_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: "seedbed::health",
            event = "bootstrap_starting",
            "starting test environment bootstrap"
        );
    }

    fn phase_reached(&self, phase: Phase) {
        tracing::debug!(
            target: "seedbed::health",
            event = "phase_reached",
            phase = %phase,
            "bootstrap phase reached"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: "seedbed::health",
            event = "bootstrap_succeeded",
            url = %config.url(),
            store = %config.test_store(),
            upload_root = %config.test_upload_path(),
            "test environment ready"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "seedbed::health",
            event = "bootstrap_failed",
            phase = %error.phase(),
            error = %error,
            "test environment bootstrap failed"
        );
    }

    fn service_starting(&self, kind: ServiceKind) {
        tracing::info!(
            target: "seedbed::health",
            event = "service_starting",
            service = %kind,
            "starting service"
        );
    }

    fn service_ready(&self, kind: ServiceKind) {
        tracing::info!(
            target: "seedbed::health",
            event = "service_ready",
            service = %kind,
            "service ready"
        );
    }

    fn service_failed(&self, error: &ServiceStartupError) {
        tracing::error!(
            target: "seedbed::health",
            event = "service_failed",
            service = %error.kind,
            message = %error.message(),
            error = ?error,
            "service failed to start"
        );
    }

    fn reseed_starting(&self) {
        tracing::info!(
            target: "seedbed::health",
            event = "reseed_starting",
            "resetting test environment"
        );
    }

    fn reseed_succeeded(&self) {
        tracing::info!(
            target: "seedbed::health",
            event = "reseed_succeeded",
            "test environment reset to baseline"
        );
    }

    fn reseed_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "seedbed::health",
            event = "reseed_failed",
            phase = %error.phase(),
            error = %error,
            "test environment reset failed"
        );
    }
}
