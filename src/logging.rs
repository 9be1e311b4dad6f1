//! Tracing subscriber setup
//!
//! Stdout carries the listener protocol, so log output goes to a file or to
//! stderr only.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogTarget, Settings};
use crate::error::AppError;

/// Install the global subscriber described by `settings`.
pub fn init(settings: &Settings) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match &settings.log_target {
        LogTarget::Stderr => builder.with_writer(io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::Logging(format!("{}: {}", path.display(), e)))?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
    };
    installed.map_err(|e| AppError::Logging(e.to_string()))
}
