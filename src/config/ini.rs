//! Supervisor-compatible INI reader
//!
//! Follows the dialect supervisord accepts:
//! - `[section]` headers, names kept verbatim
//! - `key = value` or `key: value`, option names lower-cased
//! - full-line comments with `;` or `#`, inline comments after whitespace
//! - indented continuation lines
//!
//! Reading several files into one document merges them: sections keep
//! first-seen order and a repeated option takes the last value read.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::ConfigError;

const COMMENT_PREFIXES: [char; 2] = [';', '#'];

type Options = IndexMap<String, String>;

#[derive(Debug, Clone, Default)]
struct Section {
    options: Options,
    /// File the section was first declared in.
    origin: PathBuf,
}

/// Parsed configuration: ordered sections of ordered options.
#[derive(Debug, Clone, Default)]
pub struct ConfigDocument {
    sections: IndexMap<String, Section>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from a single string.
    pub fn from_str_with_origin(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut document = Self::new();
        document.merge_str(text, origin)?;
        Ok(document)
    }

    /// Read `path` and merge it into this document.
    pub fn read_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_str(&text, path)
    }

    /// Parse `text` and merge it into this document. `origin` is used for
    /// error messages and recorded as the file of newly declared sections.
    pub fn merge_str(&mut self, text: &str, origin: &Path) -> Result<(), ConfigError> {
        let parse_error = |line: usize, reason: String| ConfigError::Parse {
            path: origin.to_path_buf(),
            line,
            reason,
        };

        let mut current: Option<String> = None;
        let mut last_option: Option<String> = None;
        // Blank lines seen since the last value line; kept if a continuation follows.
        let mut blank_run = 0usize;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                blank_run += 1;
                continue;
            }
            if trimmed.starts_with(COMMENT_PREFIXES) {
                continue;
            }

            let content = strip_inline_comment(raw);
            if content.trim().is_empty() {
                continue;
            }

            let indented = raw.starts_with([' ', '\t']);
            if indented {
                if let (Some(section), Some(option)) = (&current, &last_option) {
                    if let Some(value) = self
                        .sections
                        .get_mut(section)
                        .and_then(|s| s.options.get_mut(option))
                    {
                        for _ in 0..=blank_run {
                            value.push('\n');
                        }
                        value.push_str(content.trim());
                        blank_run = 0;
                        continue;
                    }
                }
            }
            blank_run = 0;

            let content = content.trim();
            if let Some(header) = content.strip_prefix('[') {
                let name = header
                    .rfind(']')
                    .map(|end| header[..end].trim())
                    .ok_or_else(|| parse_error(line_no, format!("unterminated section header: {}", content)))?;
                if name.is_empty() {
                    return Err(parse_error(line_no, "empty section name".to_string()));
                }
                self.sections.entry(name.to_string()).or_insert_with(|| Section {
                    options: Options::new(),
                    origin: origin.to_path_buf(),
                });
                current = Some(name.to_string());
                last_option = None;
                continue;
            }

            let Some(section) = &current else {
                return Err(parse_error(
                    line_no,
                    format!("option outside of any section: {}", content),
                ));
            };

            let split = content
                .find(['=', ':'])
                .ok_or_else(|| parse_error(line_no, format!("expected 'key = value': {}", content)))?;
            let key = content[..split].trim().to_lowercase();
            let value = content[split + 1..].trim().to_string();
            if key.is_empty() {
                return Err(parse_error(line_no, format!("missing option name: {}", content)));
            }

            if let Some(entry) = self.sections.get_mut(section) {
                entry.options.insert(key.clone(), value);
            }
            last_option = Some(key);
        }

        Ok(())
    }

    /// Section names in first-seen order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Raw value of `option` in `section`. Option names are case-insensitive.
    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.options.get(&option.to_lowercase()))
            .map(String::as_str)
    }

    /// File that first declared `section`.
    pub fn section_origin(&self, section: &str) -> Option<&Path> {
        self.sections.get(section).map(|s| s.origin.as_path())
    }

    /// Boolean option. `Ok(None)` when absent.
    pub fn get_bool(&self, section: &str, option: &str) -> Result<Option<bool>, ConfigError> {
        let Some(value) = self.get(section, option) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(Some(true)),
            "0" | "no" | "false" | "off" => Ok(Some(false)),
            _ => Err(self.invalid(section, option, value, "boolean")),
        }
    }

    /// Integer option. `Ok(None)` when absent.
    pub fn get_int(&self, section: &str, option: &str) -> Result<Option<i64>, ConfigError> {
        let Some(value) = self.get(section, option) else {
            return Ok(None);
        };
        value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| self.invalid(section, option, value, "integer"))
    }

    fn invalid(&self, section: &str, option: &str, value: &str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidValue {
            section: section.to_string(),
            option: option.to_lowercase(),
            value: value.to_string(),
            expected,
        }
    }
}

/// Drop an inline comment: a `;` or `#` preceded by whitespace.
fn strip_inline_comment(line: &str) -> &str {
    let mut previous_is_space = false;
    for (index, ch) in line.char_indices() {
        if previous_is_space && COMMENT_PREFIXES.contains(&ch) {
            return &line[..index];
        }
        previous_is_space = ch.is_whitespace();
    }
    line
}
