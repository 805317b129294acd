//! Command-line entry point for the `seedbed` binary.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use tokio::runtime::Builder;

use seedbed_config::{Config, LogFormat};

use crate::bootstrap::{BootstrapError, StaticConfigLoader, bootstrap_with_timeout};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::services::LocalServiceProvider;
use crate::store::BuiltinConnector;
use crate::telemetry;

/// Prepares an isolated forum test environment.
#[derive(Parser, Debug)]
#[command(name = "seedbed", version)]
pub(crate) struct Cli {
    /// JSON configuration file.
    #[arg(long, env = "SEEDBED_CONFIG", default_value = "config.json")]
    pub(crate) config: Utf8PathBuf,
    /// Seconds the whole bootstrap may take.
    #[arg(long, default_value_t = 30)]
    pub(crate) timeout_secs: u64,
    /// Overrides the configured log filter.
    #[arg(long)]
    pub(crate) log_filter: Option<String>,
    /// Overrides the configured log format (`json` or `compact`).
    #[arg(long)]
    pub(crate) log_format: Option<LogFormat>,
    /// Keeps the environment up until interrupted.
    #[arg(long)]
    pub(crate) hold: bool,
}

/// Parses `args`, bootstraps the environment, and reports the outcome.
///
/// Returns a failure exit code with a single `seedbed: <phase> failed:
/// <cause>` line on `stderr` when any phase fails.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let rendered = error.render();
            return if error.use_stderr() {
                let _ = write!(stderr, "{rendered}");
                ExitCode::FAILURE
            } else {
                let _ = write!(stdout, "{rendered}");
                ExitCode::SUCCESS
            };
        }
    };

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(source) => return report(stderr, &BootstrapError::from_config(source)),
    };

    let filter = cli
        .log_filter
        .clone()
        .unwrap_or_else(|| config.log_filter().to_string());
    let format = cli.log_format.unwrap_or_else(|| config.log_format());
    if let Err(error) = telemetry::initialise(&filter, format) {
        let _ = writeln!(stderr, "seedbed: telemetry failed: {error}");
        return ExitCode::FAILURE;
    }

    let runtime = match Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let _ = writeln!(stderr, "seedbed: runtime failed: {error}");
            return ExitCode::FAILURE;
        }
    };

    let budget = Duration::from_secs(cli.timeout_secs);
    let loader = StaticConfigLoader::new(config);
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());

    runtime.block_on(async {
        let harness = match bootstrap_with_timeout(
            budget,
            &loader,
            &BuiltinConnector,
            reporter,
            LocalServiceProvider::new(),
        )
        .await
        {
            Ok(harness) => harness,
            Err(error) => return report(stderr, &error),
        };

        let address = harness
            .services()
            .provider()
            .server_addr()
            .map_or_else(|| harness.config().url().to_string(), |addr| addr.to_string());
        let _ = writeln!(stdout, "seedbed: ready on {address}");
        let _ = stdout.flush();

        if cli.hold {
            if let Err(error) = tokio::signal::ctrl_c().await {
                let _ = writeln!(stderr, "seedbed: signal handling failed: {error}");
                return ExitCode::FAILURE;
            }
        }
        ExitCode::SUCCESS
    })
}

fn report<E: Write>(stderr: &mut E, error: &BootstrapError) -> ExitCode {
    let _ = writeln!(stderr, "seedbed: {} failed: {error}", error.phase());
    ExitCode::FAILURE
}
