//! Supervisord control plane
//!
//! The sequencer needs two operations from supervisord: list every process
//! with its group, and start one process. `ControlPlane` abstracts them so
//! the sequencer can run against a fake in tests.

mod supervisorctl;

pub use supervisorctl::{parse_status_line, parse_status_output, SupervisorctlConfig, SupervisorctlControlPlane};

use ordered_startup_protocol::ProcessState;
use serde::{Deserialize, Serialize};

/// One process as reported by supervisord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
    pub group: String,
    pub state: ProcessState,
}

/// Control plane operations used by the sequencer.
pub trait ControlPlane {
    /// Every process supervisord knows about.
    fn list_processes(&self) -> Result<Vec<ProcessInfo>, ControlError>;

    /// Start a process by `name` or `group:name`. `wait` asks supervisord to
    /// confirm the start before returning.
    fn start_process(&self, name: &str, wait: bool) -> Result<(), ControlError>;
}

impl<T: ControlPlane + ?Sized> ControlPlane for &T {
    fn list_processes(&self) -> Result<Vec<ProcessInfo>, ControlError> {
        (**self).list_processes()
    }

    fn start_process(&self, name: &str, wait: bool) -> Result<(), ControlError> {
        (**self).start_process(name, wait)
    }
}

/// Control plane errors
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Start of '{name}' refused: {message}")]
    StartRefused { name: String, message: String },

    #[error("Unparsable process listing line: '{0}'")]
    InvalidListing(String),
}
