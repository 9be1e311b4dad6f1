//! `key:value` token lines.
//!
//! Supervisord encodes both the listener header line and the body of most
//! event payloads as space-separated `key:value` tokens.

use crate::error::ProtocolError;

/// Ordered set of tokens from one line. A repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    entries: Vec<(String, String)>,
}

impl Tokens {
    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or a `MissingField` error.
    pub fn require(&self, key: &'static str) -> Result<&str, ProtocolError> {
        self.get(key).ok_or(ProtocolError::MissingField(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }
}

/// Parse a token line such as `processname:cat groupname:cat pid:2766`.
///
/// Only the first `:` in a token separates key from value.
pub fn parse_tokens(line: &str) -> Result<Tokens, ProtocolError> {
    let mut tokens = Tokens::default();
    for token in line.split_whitespace() {
        let (key, value) = token
            .split_once(':')
            .ok_or_else(|| ProtocolError::MalformedToken(token.to_string()))?;
        if key.is_empty() {
            return Err(ProtocolError::MalformedToken(token.to_string()));
        }
        tokens.insert(key, value);
    }
    Ok(tokens)
}
