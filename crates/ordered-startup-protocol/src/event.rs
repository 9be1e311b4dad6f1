//! Event notifications.
//!
//! A notification is one header line followed by exactly `len` payload bytes.
//! Process-state events carry the new state in the event name and the
//! process identity in the payload's first token line.

use crate::error::ProtocolError;
use crate::state::ProcessState;
use crate::tokens::{parse_tokens, Tokens};

/// Event name prefix shared by every process state transition event.
pub const PROCESS_STATE_PREFIX: &str = "PROCESS_STATE_";

/// Parsed listener header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHeaders {
    tokens: Tokens,
}

impl EventHeaders {
    /// Parse a header line, validating the fields the listener depends on.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let tokens = parse_tokens(line)?;
        tokens.require("eventname")?;
        let headers = Self { tokens };
        headers.payload_len()?;
        Ok(headers)
    }

    /// The `eventname` header.
    pub fn event_name(&self) -> &str {
        self.tokens.get("eventname").unwrap_or_default()
    }

    /// Number of payload bytes that follow the header line.
    pub fn payload_len(&self) -> Result<usize, ProtocolError> {
        let raw = self.tokens.require("len")?;
        raw.parse::<usize>()
            .map_err(|_| ProtocolError::InvalidLength(raw.to_string()))
    }

    pub fn tokens(&self) -> &Tokens {
        &self.tokens
    }
}

/// One event delivered to the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub headers: EventHeaders,
    pub payload: String,
}

/// A decoded process state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStateChange {
    /// Bare program name that generated the event.
    pub process_name: String,
    pub group_name: Option<String>,
    pub from_state: Option<ProcessState>,
    /// New state taken from the event name suffix. `None` when the suffix is
    /// not a known state.
    pub state: Option<ProcessState>,
    /// Raw suffix after `PROCESS_STATE_`.
    pub state_token: String,
}

impl Notification {
    pub fn new(headers: EventHeaders, payload: impl Into<String>) -> Self {
        Self {
            headers,
            payload: payload.into(),
        }
    }

    pub fn event_name(&self) -> &str {
        self.headers.event_name()
    }

    /// Payload token line (the first payload line).
    pub fn payload_tokens(&self) -> Result<Tokens, ProtocolError> {
        parse_tokens(self.payload.lines().next().unwrap_or_default())
    }

    /// Decode a process state transition, or `None` for other event kinds.
    pub fn process_state_change(&self) -> Result<Option<ProcessStateChange>, ProtocolError> {
        let Some(state_token) = self.event_name().strip_prefix(PROCESS_STATE_PREFIX) else {
            return Ok(None);
        };
        let tokens = self.payload_tokens()?;
        let process_name = tokens.require("processname")?.to_string();

        Ok(Some(ProcessStateChange {
            process_name,
            group_name: tokens.get("groupname").map(str::to_string),
            from_state: tokens.get("from_state").and_then(|s| s.parse().ok()),
            state: state_token.parse().ok(),
            state_token: state_token.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(event: &str, payload: &str) -> Notification {
        let line = format!("ver:3.0 server:supervisor serial:1 pool:ordered poolserial:1 eventname:{} len:{}", event, payload.len());
        Notification::new(EventHeaders::parse(&line).unwrap(), payload)
    }

    #[test]
    fn test_headers_require_eventname_and_len() {
        assert!(matches!(
            EventHeaders::parse("ver:3.0 len:4").unwrap_err(),
            ProtocolError::MissingField("eventname")
        ));
        assert!(matches!(
            EventHeaders::parse("eventname:TICK_5").unwrap_err(),
            ProtocolError::MissingField("len")
        ));
        assert!(matches!(
            EventHeaders::parse("eventname:TICK_5 len:-1").unwrap_err(),
            ProtocolError::InvalidLength(v) if v == "-1"
        ));
    }

    #[test]
    fn test_process_state_change_decoded() {
        let event = notification(
            "PROCESS_STATE_RUNNING",
            "processname:db groupname:backend from_state:STARTING pid:2766",
        );
        let change = event.process_state_change().unwrap().unwrap();
        assert_eq!(change.process_name, "db");
        assert_eq!(change.group_name.as_deref(), Some("backend"));
        assert_eq!(change.from_state, Some(ProcessState::Starting));
        assert_eq!(change.state, Some(ProcessState::Running));
        assert_eq!(change.state_token, "RUNNING");
    }

    #[test]
    fn test_non_process_state_event_is_none() {
        let event = notification("TICK_5", "when:1201063880");
        assert!(event.process_state_change().unwrap().is_none());
    }

    #[test]
    fn test_unknown_state_suffix_kept_raw() {
        let event = notification("PROCESS_STATE_WEIRD", "processname:db groupname:db");
        let change = event.process_state_change().unwrap().unwrap();
        assert_eq!(change.state, None);
        assert_eq!(change.state_token, "WEIRD");
    }

    #[test]
    fn test_missing_processname_is_error() {
        let event = notification("PROCESS_STATE_EXITED", "groupname:db expected:1 pid:10");
        assert!(matches!(
            event.process_state_change().unwrap_err(),
            ProtocolError::MissingField("processname")
        ));
    }

    #[test]
    fn test_only_first_payload_line_is_tokenized() {
        let event = notification("PROCESS_STATE_RUNNING", "processname:db groupname:db\nfree text here");
        let change = event.process_state_change().unwrap().unwrap();
        assert_eq!(change.process_name, "db");
    }
}
