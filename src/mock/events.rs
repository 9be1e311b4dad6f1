//! Scripted notification source.

use std::collections::VecDeque;

use ordered_startup_protocol::{Notification, ProtocolError};

use crate::listener::EventSource;

/// Replays notifications in order, then reports the channel closed.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    queue: VecDeque<Notification>,
    delivered: usize,
    acknowledged: usize,
    pending: bool,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = Notification>) -> Self {
        Self {
            queue: events.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn acknowledged(&self) -> usize {
        self.acknowledged
    }

    /// Notifications not yet delivered.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl EventSource for ScriptedEvents {
    fn next_event(&mut self) -> Result<Option<Notification>, ProtocolError> {
        // The transport never delivers a new event before the last one is acknowledged.
        assert!(!self.pending, "next_event called with an unacknowledged notification");
        let next = self.queue.pop_front();
        if next.is_some() {
            self.delivered += 1;
            self.pending = true;
        }
        Ok(next)
    }

    fn acknowledge(&mut self) -> Result<(), ProtocolError> {
        if !self.pending {
            return Err(ProtocolError::NothingToAcknowledge);
        }
        self.pending = false;
        self.acknowledged += 1;
        Ok(())
    }
}
