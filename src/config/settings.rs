//! Runtime settings for the sequencer binary
//!
//! Read from the environment with built-in defaults. Supervisord exports the
//! `SUPERVISOR_*` variables to every event listener it spawns.

use std::env;
use std::path::PathBuf;

/// Default log file, relative to the listener's working directory.
pub const DEFAULT_LOG_FILE: &str = "ordered_startup.log";

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "debug";

/// Default control client binary.
pub const DEFAULT_SUPERVISORCTL: &str = "supervisorctl";

/// Where log output goes. Never stdout: that is the listener protocol channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Log destination (`ORDERED_STARTUP_LOG`, `-` for stderr)
    pub log_target: LogTarget,
    /// Tracing filter directive (`RUST_LOG`)
    pub log_filter: String,
    /// Control client binary (`SUPERVISORCTL`)
    pub supervisorctl: PathBuf,
    /// Supervisord RPC endpoint (`SUPERVISOR_SERVER_URL`)
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_target: LogTarget::File(PathBuf::from(DEFAULT_LOG_FILE)),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            supervisorctl: PathBuf::from(DEFAULT_SUPERVISORCTL),
            server_url: None,
            username: None,
            password: None,
        }
    }
}

impl Settings {
    /// Settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Settings from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let log_target = match get("ORDERED_STARTUP_LOG") {
            Some(v) if v == "-" => LogTarget::Stderr,
            Some(v) => LogTarget::File(PathBuf::from(v)),
            None => defaults.log_target,
        };

        Self {
            log_target,
            log_filter: get("RUST_LOG").unwrap_or(defaults.log_filter),
            supervisorctl: get("SUPERVISORCTL")
                .map(PathBuf::from)
                .unwrap_or(defaults.supervisorctl),
            server_url: get("SUPERVISOR_SERVER_URL"),
            username: get("SUPERVISOR_USERNAME"),
            password: get("SUPERVISOR_PASSWORD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.log_target, LogTarget::File(PathBuf::from("ordered_startup.log")));
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("ORDERED_STARTUP_LOG", "-"),
            ("RUST_LOG", "info"),
            ("SUPERVISORCTL", "/usr/local/bin/supervisorctl"),
            ("SUPERVISOR_SERVER_URL", "unix:///var/run/supervisor.sock"),
            ("SUPERVISOR_USERNAME", ""),
        ]));
        assert_eq!(settings.log_target, LogTarget::Stderr);
        assert_eq!(settings.log_filter, "info");
        assert_eq!(settings.supervisorctl, PathBuf::from("/usr/local/bin/supervisorctl"));
        assert_eq!(settings.server_url.as_deref(), Some("unix:///var/run/supervisor.sock"));
        assert_eq!(settings.username, None);
    }

    #[test]
    fn test_log_file_override() {
        let settings = Settings::from_lookup(lookup(&[("ORDERED_STARTUP_LOG", "/var/log/ordered.log")]));
        assert_eq!(settings.log_target, LogTarget::File(PathBuf::from("/var/log/ordered.log")));
    }
}
