//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use seedbed_config::Config;

use crate::bootstrap::{BootstrapError, Phase};
use crate::health::HealthReporter;
use crate::services::{ServiceKind, ServiceStartupError};

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Sequencer entered a phase.
    PhaseReached(Phase),
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed in the given phase.
    BootstrapFailed(Phase),
    /// Service start initiated.
    ServiceStarting(ServiceKind),
    /// Service started successfully.
    ServiceReady(ServiceKind),
    /// Service failed to start with a message.
    ServiceFailed { kind: ServiceKind, message: String },
    /// Reset started.
    ReseedStarting,
    /// Reset completed.
    ReseedSucceeded,
    /// Reset failed in the given phase.
    ReseedFailed(Phase),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Phases reached, in order.
    #[must_use]
    pub fn phases(&self) -> Vec<Phase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::PhaseReached(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn phase_reached(&self, phase: Phase) {
        self.record(HealthEvent::PhaseReached(phase));
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.phase()));
    }

    fn service_starting(&self, kind: ServiceKind) {
        self.record(HealthEvent::ServiceStarting(kind));
    }

    fn service_ready(&self, kind: ServiceKind) {
        self.record(HealthEvent::ServiceReady(kind));
    }

    fn service_failed(&self, error: &ServiceStartupError) {
        self.record(HealthEvent::ServiceFailed {
            kind: error.kind,
            message: error.message().to_owned(),
        });
    }

    fn reseed_starting(&self) {
        self.record(HealthEvent::ReseedStarting);
    }

    fn reseed_succeeded(&self) {
        self.record(HealthEvent::ReseedSucceeded);
    }

    fn reseed_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::ReseedFailed(error.phase()));
    }
}
