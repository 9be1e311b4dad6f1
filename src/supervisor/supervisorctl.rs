//! Control plane backed by the `supervisorctl` client.
//!
//! Each call spawns `supervisorctl` with connection flags derived from the
//! environment supervisord gives its event listeners, or from the primary
//! configuration file when no server URL is known.

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;

use ordered_startup_protocol::ProcessState;
use tracing::{debug, warn};

use super::{ControlError, ControlPlane, ProcessInfo};
use crate::config::Settings;

/// `status` exits 3 when any process is not running; the listing is still valid.
const STATUS_SOME_NOT_RUNNING: i32 = 3;

/// How to reach supervisord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorctlConfig {
    /// Client binary
    pub program: PathBuf,
    /// `-s` server URL
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `-c` configuration file, used when no server URL is set
    pub config_path: Option<PathBuf>,
}

impl SupervisorctlConfig {
    pub fn from_settings(settings: &Settings, config_path: Option<PathBuf>) -> Self {
        Self {
            program: settings.supervisorctl.clone(),
            server_url: settings.server_url.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            config_path,
        }
    }

    /// Connection arguments placed before the subcommand.
    pub fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match (&self.server_url, &self.config_path) {
            (Some(url), _) => {
                args.push("-s".to_string());
                args.push(url.clone());
            }
            (None, Some(path)) => {
                args.push("-c".to_string());
                args.push(path.display().to_string());
            }
            (None, None) => {}
        }
        if let Some(ref user) = self.username {
            args.push("-u".to_string());
            args.push(user.clone());
        }
        // supervisorctl only takes the password on its command line, where
        // other local users can read it from the process table.
        if let Some(ref password) = self.password {
            args.push("-p".to_string());
            args.push(password.clone());
        }
        args
    }
}

/// Production control plane.
pub struct SupervisorctlControlPlane {
    config: SupervisorctlConfig,
}

impl SupervisorctlControlPlane {
    pub fn new(config: SupervisorctlConfig) -> Self {
        Self { config }
    }

    fn command(&self, subcommand: &[&str]) -> Command {
        let mut args = self.config.connection_args();
        args.extend(subcommand.iter().map(|s| s.to_string()));
        debug!(program = %self.config.program.display(), ?subcommand, "invoking supervisorctl");

        let mut command = Command::new(&self.config.program);
        command.args(&args).stdin(Stdio::null());
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> ControlError {
        ControlError::Spawn {
            program: self.config.program.display().to_string(),
            source,
        }
    }

    fn run(&self, subcommand: &[&str]) -> Result<Output, ControlError> {
        self.command(subcommand)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| self.spawn_error(source))
    }

    /// Launch `supervisorctl start` and return without waiting for it. The
    /// child is reaped on a background thread and its outcome only logged.
    fn start_detached(&self, name: &str) -> Result<(), ControlError> {
        let mut child = self
            .command(&["start", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        let name = name.to_string();
        thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => debug!(name = %name, "detached start finished"),
            Ok(status) => warn!(name = %name, %status, "detached start reported failure"),
            Err(err) => warn!(name = %name, error = %err, "failed to reap detached start"),
        });
        Ok(())
    }

    fn command_failed(&self, subcommand: &str, output: &Output) -> ControlError {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        ControlError::CommandFailed {
            command: format!("supervisorctl {}", subcommand),
            status: output.status.to_string(),
            stderr: if stderr.is_empty() { stdout } else { stderr },
        }
    }
}

impl ControlPlane for SupervisorctlControlPlane {
    fn list_processes(&self) -> Result<Vec<ProcessInfo>, ControlError> {
        let output = self.run(&["status"])?;
        match output.status.code() {
            Some(0) | Some(STATUS_SOME_NOT_RUNNING) => {}
            _ => return Err(self.command_failed("status", &output)),
        }
        parse_status_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn start_process(&self, name: &str, wait: bool) -> Result<(), ControlError> {
        if !wait {
            return self.start_detached(name);
        }
        let output = self.run(&["start", name])?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if let Some(line) = stdout.lines().find(|line| line.contains("ERROR")) {
            return Err(ControlError::StartRefused {
                name: name.to_string(),
                message: line.trim().to_string(),
            });
        }
        if !output.status.success() {
            return Err(self.command_failed("start", &output));
        }
        Ok(())
    }
}

/// Parse the full `supervisorctl status` output, skipping blank lines.
pub fn parse_status_output(output: &str) -> Result<Vec<ProcessInfo>, ControlError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_status_line)
        .collect()
}

/// Parse one `<namespec> <STATE> <description>` line. A `group:name`
/// namespec yields that group; a bare name is its own group.
pub fn parse_status_line(line: &str) -> Result<ProcessInfo, ControlError> {
    let mut fields = line.split_whitespace();
    let (Some(namespec), Some(state)) = (fields.next(), fields.next()) else {
        return Err(ControlError::InvalidListing(line.to_string()));
    };
    let state: ProcessState = state
        .parse()
        .map_err(|_| ControlError::InvalidListing(line.to_string()))?;

    let (group, name) = match namespec.split_once(':') {
        Some((group, name)) if !group.is_empty() && !name.is_empty() => (group, name),
        Some(_) => return Err(ControlError::InvalidListing(line.to_string())),
        None => (namespec, namespec),
    };

    Ok(ProcessInfo {
        name: name.to_string(),
        group: group.to_string(),
        state,
    })
}
