//! Log sink setup.
//!
//! Events go to an append-only file as plain text, one line each. `RUST_LOG`
//! overrides the default filter.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::CliError;

const DEFAULT_DIRECTIVES: &str = "warn,barflow=debug,barflow_core=debug";

/// Open `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber writing to `path`.
pub fn init(path: &Path) -> Result<(), CliError> {
    let file = open_log_file(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|error| CliError::Logging(error.to_string()))
}
