//! Supervisor Event Listener Protocol Types
//!
//! Defines the wire vocabulary shared between supervisord and an event
//! listener: process states, `key:value` token lines, listener frames and
//! process-state notifications.

pub mod error;
pub mod event;
pub mod frame;
pub mod state;
pub mod tokens;

pub use error::ProtocolError;
pub use event::{EventHeaders, Notification, ProcessStateChange, PROCESS_STATE_PREFIX};
pub use frame::{result_frame, ACK_BODY, READY_FRAME};
pub use state::{ProcessState, UnknownProcessState};
pub use tokens::{parse_tokens, Tokens};

/// Header version supervisord announces in the `ver` token.
pub const LISTENER_PROTOCOL_VERSION: &str = "3.0";
