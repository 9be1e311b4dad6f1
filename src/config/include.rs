//! `[include]` expansion
//!
//! `files` holds whitespace-separated glob patterns. Relative patterns are
//! resolved against the directory of the file that declares them. Included
//! files may include further files; a file already visited is skipped.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use regex_lite::{Captures, Regex};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::ini::ConfigDocument;
use super::{ConfigError, INCLUDE_SECTION};

const GLOB_META: [char; 3] = ['*', '?', '['];

/// Every configuration file reachable from `root`: `root` first, then each
/// include in declaration order, depth first.
pub fn collect_config_files(root: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    collect(root, &mut visited, &mut files)?;
    Ok(files)
}

fn collect(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
    files: &mut Vec<PathBuf>,
) -> Result<(), ConfigError> {
    let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(key) {
        warn!(path = %path.display(), "configuration file included more than once, skipping");
        return Ok(());
    }
    files.push(path.to_path_buf());

    let mut document = ConfigDocument::new();
    document.read_file(path)?;
    let Some(patterns) = document.get(INCLUDE_SECTION, "files") else {
        return Ok(());
    };

    let base_dir = absolute_parent(path);
    let patterns = expand_value(patterns, &base_dir);
    for pattern in patterns.split_whitespace() {
        let pattern_path = Path::new(pattern);
        let full = if pattern_path.is_absolute() {
            pattern_path.to_path_buf()
        } else {
            base_dir.join(pattern_path)
        };

        let matches = expand_pattern(&full)?;
        if matches.is_empty() {
            debug!(pattern = %full.display(), "include pattern matched no files");
        }
        for included in matches {
            collect(&included, visited, files)?;
        }
    }
    Ok(())
}

/// Expand `%(here)s` and `%(ENV_NAME)s` references the way supervisord does
/// for include directives. Unknown names are left untouched.
pub fn expand_value(value: &str, here: &Path) -> String {
    let pattern = match Regex::new(r"%\(([A-Za-z0-9_]+)\)s") {
        Ok(re) => re,
        Err(_) => return value.to_string(),
    };
    pattern
        .replace_all(value, |caps: &Captures<'_>| {
            let name = &caps[1];
            if name == "here" {
                here.display().to_string()
            } else if let Some(var) = name.strip_prefix("ENV_") {
                env::var(var).unwrap_or_default()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Expand one glob pattern against the filesystem. Matches are files only,
/// sorted, and `*` never crosses a `/`. Hidden entries only match pattern
/// components that themselves start with `.`.
pub fn expand_pattern(pattern: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let pattern = if pattern.is_absolute() {
        pattern.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|source| ConfigError::Io {
                path: pattern.to_path_buf(),
                source,
            })?
            .join(pattern)
    };
    let text = pattern.to_string_lossy().into_owned();

    if !text.contains(GLOB_META) {
        return Ok(if pattern.is_file() { vec![pattern] } else { Vec::new() });
    }

    let mut root = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();
    for component in pattern.components() {
        let part = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !part.contains(GLOB_META) {
            root.push(component);
        } else {
            rest.push(part.into_owned());
        }
    }

    let matcher = GlobBuilder::new(&text)
        .literal_separator(true)
        .build()
        .map_err(|source| ConfigError::Pattern {
            pattern: text.clone(),
            source,
        })?
        .compile_matcher();

    let depth = rest.len();
    let walker = WalkDir::new(&root)
        .follow_links(true)
        .min_depth(depth)
        .max_depth(depth)
        .into_iter()
        .filter_entry(|entry| {
            let d = entry.depth();
            if d == 0 {
                return true;
            }
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            !hidden || rest.get(d - 1).is_some_and(|p| p.starts_with('.'))
        });

    let mut matches = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable path during include expansion");
                continue;
            }
        };
        if entry.file_type().is_file() && matcher.is_match(entry.path()) {
            matches.push(entry.into_path());
        }
    }
    matches.sort();
    Ok(matches)
}

fn absolute_parent(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, text: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_no_include_section() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("supervisord.conf");
        write(&root, "[program:a]\n");
        assert_eq!(collect_config_files(&root).unwrap(), vec![root]);
    }

    #[test]
    fn test_relative_and_absolute_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("supervisord.conf");
        let extra = tempfile::tempdir().unwrap();
        write(
            &root,
            &format!(
                "[include]\nfiles = conf.d/*.ini {}/*.conf\n",
                extra.path().display()
            ),
        );
        write(&dir.path().join("conf.d/b.ini"), "[program:b]\n");
        write(&dir.path().join("conf.d/a.ini"), "[program:a]\n");
        write(&dir.path().join("conf.d/skip.conf"), "[program:skip]\n");
        write(&extra.path().join("x.conf"), "[program:x]\n");

        let files = collect_config_files(&root).unwrap();
        assert_eq!(
            files,
            vec![
                root.clone(),
                dir.path().join("conf.d/a.ini"),
                dir.path().join("conf.d/b.ini"),
                extra.path().join("x.conf"),
            ]
        );
    }

    #[test]
    fn test_nested_includes_are_depth_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("supervisord.conf");
        write(&root, "[include]\nfiles = one.conf two.conf\n");
        write(&dir.path().join("one.conf"), "[include]\nfiles = nested/*.conf\n");
        write(&dir.path().join("nested/deep.conf"), "[program:deep]\n");
        write(&dir.path().join("two.conf"), "[program:two]\n");

        let files = collect_config_files(&root).unwrap();
        assert_eq!(
            files,
            vec![
                root.clone(),
                dir.path().join("one.conf"),
                dir.path().join("nested/deep.conf"),
                dir.path().join("two.conf"),
            ]
        );
    }

    #[test]
    fn test_include_cycle_is_broken() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("supervisord.conf");
        write(&root, "[include]\nfiles = loop.conf\n");
        write(&dir.path().join("loop.conf"), "[include]\nfiles = supervisord.conf\n");

        let files = collect_config_files(&root).unwrap();
        assert_eq!(files, vec![root.clone(), dir.path().join("loop.conf")]);
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("top.conf"), "");
        write(&dir.path().join("sub/inner.conf"), "");
        write(&dir.path().join(".hidden.conf"), "");

        let matches = expand_pattern(&dir.path().join("*.conf")).unwrap();
        assert_eq!(matches, vec![dir.path().join("top.conf")]);
    }

    #[test]
    fn test_literal_path_without_meta() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("only.conf"), "");
        assert_eq!(
            expand_pattern(&dir.path().join("only.conf")).unwrap(),
            vec![dir.path().join("only.conf")]
        );
        assert!(expand_pattern(&dir.path().join("absent.conf")).unwrap().is_empty());
    }

    #[test]
    fn test_expand_here() {
        let expanded = expand_value("%(here)s/conf.d/*.conf %(other)s", Path::new("/etc/supervisor"));
        assert_eq!(expanded, "/etc/supervisor/conf.d/*.conf %(other)s");
    }
}
