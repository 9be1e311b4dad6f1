//! Supervisor configuration surface
//!
//! Locates the primary supervisord configuration file, expands its
//! `[include]` graph and reads every file into one ordered document:
//! 1. Discovery (explicit path or conventional default locations)
//! 2. Include expansion (glob patterns, recursive)
//! 3. INI parsing and merge (later files win per option)
//!
//! Runtime settings for the binary itself come from the environment.

mod discovery;
mod include;
mod ini;
mod settings;

pub use discovery::{default_search_paths, find_default_config, resolve_config_path};
pub use include::{collect_config_files, expand_pattern, expand_value};
pub use ini::ConfigDocument;
pub use settings::{LogTarget, Settings};

use std::path::{Path, PathBuf};

/// Section name prefix that marks a program definition.
pub const PROGRAM_SECTION_PREFIX: &str = "program:";

/// Reserved section holding include directives.
pub const INCLUDE_SECTION: &str = "include";

/// Errors raised while locating or reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to find a config file!")]
    NoConfigFound,

    #[error("Config path {} does not exist!", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("[{section}] {option} = '{value}' is not a valid {expected}")]
    InvalidValue {
        section: String,
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid include pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Load the full configuration rooted at `path`, following includes.
pub fn load(path: &Path) -> Result<ConfigDocument, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let files = collect_config_files(path)?;
    let mut document = ConfigDocument::new();
    for file in &files {
        document.read_file(file)?;
    }
    tracing::debug!(files = ?files, sections = document.section_count(), "configuration loaded");
    Ok(document)
}
