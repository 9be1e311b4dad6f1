//! Top-level error type
//!
//! Maps every failure to the process exit status.

use std::error::Error as StdError;

use crate::config::ConfigError;
use crate::sequencer::SequencerError;

/// Exit status for configuration and startup validation failures.
pub const EXIT_CONFIG: u8 = 1;

/// Exit status for faults raised while sequencing.
pub const EXIT_RUNTIME: u8 = 2;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

impl AppError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Logging(_) => EXIT_CONFIG,
            AppError::Sequencer(_) => EXIT_RUNTIME,
        }
    }

    /// Whether the error happened before sequencing began.
    pub fn is_startup_error(&self) -> bool {
        self.exit_code() == EXIT_CONFIG
    }
}

/// Render an error and all of its sources as one line. A source whose
/// message already ends the rendered text is not repeated.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !rendered.ends_with(&message) {
            rendered.push_str(": ");
            rendered.push_str(&message);
        }
        source = cause.source();
    }
    rendered
}
