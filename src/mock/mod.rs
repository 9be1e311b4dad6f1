//! In-process fakes for the sequencer's collaborators
//!
//! Lets the sequencer run without a supervisord:
//!
//! - `FakeControlPlane`: configurable process listing, records every start
//!   command, optional failure injection
//! - `ScriptedEvents`: replays a fixed list of notifications and checks the
//!   one-acknowledgement-per-event contract
//! - notification builders for process state and tick events

mod control;
mod events;

pub use control::FakeControlPlane;
pub use events::ScriptedEvents;

use ordered_startup_protocol::{
    EventHeaders, Notification, ProcessState, LISTENER_PROTOCOL_VERSION, PROCESS_STATE_PREFIX,
};

/// Build a notification with the given event name and payload.
///
/// # Panics
///
/// Panics if `event_name` contains whitespace.
pub fn event(event_name: &str, payload: &str) -> Notification {
    let line = format!(
        "ver:{} server:supervisor serial:1 pool:ordered_startup poolserial:1 eventname:{} len:{}",
        LISTENER_PROTOCOL_VERSION,
        event_name,
        payload.len()
    );
    let headers = EventHeaders::parse(&line).expect("mock event header must parse");
    Notification::new(headers, payload)
}

/// A `PROCESS_STATE_<state>` notification for `process` in `group`.
pub fn process_state_event(process: &str, group: &str, state: ProcessState) -> Notification {
    event(
        &format!("{}{}", PROCESS_STATE_PREFIX, state),
        &format!("processname:{} groupname:{} from_state:STARTING pid:4242", process, group),
    )
}

/// A `TICK_5` notification.
pub fn tick_event() -> Notification {
    event("TICK_5", "when:1201063880")
}
