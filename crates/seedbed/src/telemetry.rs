//! Process-wide `tracing` subscriber for the bootstrap and the harness.
//!
//! Output always goes to stderr so the binary's stdout carries only the
//! readiness line. The first successful call wins; a suite that bootstraps
//! several harnesses keeps logging through that first filter and format.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::{self, SetGlobalDefaultError};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{EnvFilter, fmt};

use seedbed_config::LogFormat;

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that a subscriber is installed for this process.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format of the subscriber that is actually installed.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The filter expression is not a valid `EnvFilter` directive list.
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),
    /// Another global subscriber was installed outside this module.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the stderr subscriber unless one is already in place.
pub fn initialise(filter: &str, format: LogFormat) -> Result<TelemetryHandle, TelemetryError> {
    let format = *INSTALLED.get_or_try_init(|| install(filter, format).map(|()| format))?;
    Ok(TelemetryHandle { format })
}

fn install(filter: &str, format: LogFormat) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(filter)?;
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_target(true);

    match format {
        LogFormat::Json => {
            subscriber::set_global_default(builder.json().flatten_event(true).finish())?;
        }
        LogFormat::Compact => subscriber::set_global_default(builder.compact().finish())?,
    }
    Ok(())
}
