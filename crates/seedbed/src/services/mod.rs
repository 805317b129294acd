//! Startup of the subsystems that depend on a seeded store.
//!
//! Services start in a fixed order, each awaited before the next: the
//! session store, the web listener, the realtime transport attached to the
//! listener, and the background job runners for notifications and users. A
//! failure stops the sequence; services already started are torn down with
//! the provider that owns them.

mod local;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use seedbed_config::Config;

use crate::health::HealthReporter;
use crate::store::Store;

pub use local::LocalServiceProvider;

/// Subsystems started after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Session persistence backed by the store.
    SessionStore,
    /// HTTP listener.
    WebListener,
    /// Realtime transport sharing the web listener.
    Realtime,
    /// Notification digest and pruning jobs.
    NotificationJobs,
    /// User maintenance jobs.
    UserJobs,
}

/// Order in which services are started.
pub const STARTUP_ORDER: [ServiceKind; 5] = [
    ServiceKind::SessionStore,
    ServiceKind::WebListener,
    ServiceKind::Realtime,
    ServiceKind::NotificationJobs,
    ServiceKind::UserJobs,
];

impl fmt::Display for ServiceKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SessionStore => "session-store",
            Self::WebListener => "web-listener",
            Self::Realtime => "realtime",
            Self::NotificationJobs => "notification-jobs",
            Self::UserJobs => "user-jobs",
        };
        formatter.write_str(label)
    }
}

/// Error returned when parsing a service kind fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported service kind: {0}")]
pub struct ServiceKindParseError(String);

impl FromStr for ServiceKind {
    type Err = ServiceKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "session-store" => Ok(Self::SessionStore),
            "web-listener" => Ok(Self::WebListener),
            "realtime" => Ok(Self::Realtime),
            "notification-jobs" => Ok(Self::NotificationJobs),
            "user-jobs" => Ok(Self::UserJobs),
            other => Err(ServiceKindParseError(other.to_string())),
        }
    }
}

/// Errors surfaced when a service fails to start.
#[derive(Debug, Error)]
#[error("service {kind} failed to start: {message}")]
pub struct ServiceStartupError {
    /// Service that failed.
    pub kind: ServiceKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ServiceStartupError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(kind: ServiceKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        kind: ServiceKind,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Collaborators a service may need while starting.
#[derive(Clone, Copy)]
pub struct ServiceContext<'a> {
    /// Resolved configuration.
    pub config: &'a Config,
    /// Seeded test store.
    pub store: &'a Arc<dyn Store>,
}

/// Starts individual services.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Starts `kind`, returning once it is ready to serve.
    async fn start_service(
        &self,
        kind: ServiceKind,
        context: ServiceContext<'_>,
    ) -> Result<(), ServiceStartupError>;
}

/// Services started by the bootstrap, with the provider that owns them.
#[derive(Debug)]
pub struct Services<P> {
    provider: P,
    started: Vec<ServiceKind>,
}

impl<P> Services<P> {
    /// Provider that started the services.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Services in the order they started.
    #[must_use]
    pub fn started(&self) -> &[ServiceKind] {
        self.started.as_slice()
    }
}

impl<P> Services<P>
where
    P: ServiceProvider,
{
    /// Starts every service in [`STARTUP_ORDER`].
    pub async fn start_all(
        provider: P,
        context: ServiceContext<'_>,
        reporter: &dyn HealthReporter,
    ) -> Result<Self, ServiceStartupError> {
        let mut started = Vec::with_capacity(STARTUP_ORDER.len());
        for kind in STARTUP_ORDER {
            reporter.service_starting(kind);
            match provider.start_service(kind, context).await {
                Ok(()) => {
                    reporter.service_ready(kind);
                    started.push(kind);
                }
                Err(error) => {
                    reporter.service_failed(&error);
                    return Err(error);
                }
            }
        }
        Ok(Self { provider, started })
    }
}
