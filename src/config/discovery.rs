//! Primary configuration file discovery.

use std::path::{Path, PathBuf};

use super::ConfigError;

/// Conventional locations probed when no path is given, in order.
///
/// `<here>` is two directory levels above the executable path, so an install
/// such as `/opt/app/bin/ordered-startup-supervisord` probes `/opt/app/etc`.
pub fn default_search_paths(argv0: &Path) -> Vec<PathBuf> {
    let here = argv0
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""));

    vec![
        here.join("etc").join("supervisord.conf"),
        here.join("supervisord.conf"),
        PathBuf::from("supervisord.conf"),
        PathBuf::from("etc/supervisord.conf"),
        PathBuf::from("/etc/supervisord.conf"),
        PathBuf::from("/etc/supervisor/supervisord.conf"),
    ]
}

/// First default location that exists.
pub fn find_default_config(argv0: &Path) -> Option<PathBuf> {
    default_search_paths(argv0)
        .into_iter()
        .find(|candidate| candidate.exists())
}

/// Resolve the configuration path from an optional explicit argument.
pub fn resolve_config_path(explicit: Option<&Path>, argv0: &Path) -> Result<PathBuf, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_default_config(argv0).ok_or(ConfigError::NoConfigFound)?,
    };
    if !path.exists() {
        return Err(ConfigError::NotFound(path));
    }
    Ok(path)
}
