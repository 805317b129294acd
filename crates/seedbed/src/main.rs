//! CLI entrypoint for the seedbed bootstrap.
//!
//! Delegates to [`seedbed::run`], which resolves the configuration, installs
//! telemetry, and drives the bootstrap to the ready state.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    seedbed::run(std::env::args_os(), &mut stdout, &mut stderr)
}
