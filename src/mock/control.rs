//! Fake control plane.

use std::sync::Mutex;

use ordered_startup_protocol::ProcessState;

use crate::supervisor::{ControlError, ControlPlane, ProcessInfo};

#[derive(Debug, Default)]
struct Calls {
    list: usize,
    starts: Vec<(String, bool)>,
}

/// Control plane double that records calls.
#[derive(Debug, Default)]
pub struct FakeControlPlane {
    processes: Vec<ProcessInfo>,
    fail_listing: bool,
    refuse: Vec<String>,
    calls: Mutex<Calls>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `process` in `group` from `list_processes`.
    pub fn with_process(mut self, process: &str, group: &str) -> Self {
        self.processes.push(ProcessInfo {
            name: process.to_string(),
            group: group.to_string(),
            state: ProcessState::Stopped,
        });
        self
    }

    /// Make `list_processes` fail.
    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Refuse start commands for `name`.
    pub fn fail_start(mut self, name: &str) -> Self {
        self.refuse.push(name.to_string());
        self
    }

    /// Start commands received, as `(name, wait)`.
    pub fn starts(&self) -> Vec<(String, bool)> {
        self.calls.lock().map(|c| c.starts.clone()).unwrap_or_default()
    }

    /// Names passed to start commands.
    pub fn started_names(&self) -> Vec<String> {
        self.starts().into_iter().map(|(name, _)| name).collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls.lock().map(|c| c.list).unwrap_or_default()
    }
}

impl ControlPlane for FakeControlPlane {
    fn list_processes(&self) -> Result<Vec<ProcessInfo>, ControlError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.list += 1;
        }
        if self.fail_listing {
            return Err(ControlError::CommandFailed {
                command: "supervisorctl status".to_string(),
                status: "exit status: 2".to_string(),
                stderr: "unix:///var/run/supervisor.sock no such file".to_string(),
            });
        }
        Ok(self.processes.clone())
    }

    fn start_process(&self, name: &str, wait: bool) -> Result<(), ControlError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.starts.push((name.to_string(), wait));
        }
        if self.refuse.iter().any(|n| n == name) {
            return Err(ControlError::StartRefused {
                name: name.to_string(),
                message: format!("{}: ERROR (spawn error)", name),
            });
        }
        Ok(())
    }
}
