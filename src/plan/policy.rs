//! Per-program ordering policy.

use ordered_startup_protocol::ProcessState;
use serde::Serialize;
use tracing::warn;

use crate::config::ConfigDocument;

/// How one program takes part in ordered startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderingPolicy {
    /// Supervisord launches this program by itself.
    pub autostart: bool,
    /// The program can trigger the next start.
    pub start_in_order: bool,
    /// Reaching the trigger state starts the next program; when false the
    /// sequence ends here. Defaults to `start_in_order`.
    pub start_next: bool,
    /// Trigger state.
    pub start_next_after: ProcessState,
}

impl OrderingPolicy {
    /// Read the policy from a `[program:*]` section. Unparsable values fall
    /// back to their defaults.
    pub fn from_section(document: &ConfigDocument, section: &str) -> Self {
        let flag = |option: &str, default: bool| match document.get_bool(section, option) {
            Ok(value) => value.unwrap_or(default),
            Err(err) => {
                warn!(error = %err, file = ?document.section_origin(section), default, "using default value");
                default
            }
        };

        let autostart = flag("autostart", false);
        let start_in_order = flag("startinorder", false);
        let start_next = flag("startnext", start_in_order);
        let start_next_after = document
            .get(section, "startnextafter")
            .map(|raw| {
                raw.parse().unwrap_or_else(|_| {
                    warn!(
                        section,
                        file = ?document.section_origin(section),
                        value = raw,
                        "unknown startnextafter state, using RUNNING"
                    );
                    ProcessState::Running
                })
            })
            .unwrap_or_default();

        Self {
            autostart,
            start_in_order,
            start_next,
            start_next_after,
        }
    }
}
