//! Sequencer lifecycle
//!
//! SEQUENCING → FINISHED, one way. Once finished, every later event is
//! acknowledged and otherwise ignored.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SequencerError;

/// Why sequencing stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinishReason {
    /// A program with `startnext=false` reached its trigger state.
    EndOfSequence { program: String },
    /// The last program in the plan reached its trigger state.
    LastProgramReached { program: String },
    /// `program` was started and no program from it onwards is ordered.
    SequenceComplete { program: String },
}

impl FinishReason {
    pub fn program(&self) -> &str {
        match self {
            Self::EndOfSequence { program }
            | Self::LastProgramReached { program }
            | Self::SequenceComplete { program } => program,
        }
    }
}

/// Sequencer state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SequencerState {
    #[default]
    Sequencing,
    Finished {
        reason: FinishReason,
        at: DateTime<Utc>,
    },
}

impl SequencerState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// Transition to FINISHED.
    pub fn finish(&mut self, reason: FinishReason) -> Result<(), SequencerError> {
        if let Self::Finished { reason: existing, .. } = self {
            return Err(SequencerError::AlreadyFinished(existing.clone()));
        }
        *self = Self::Finished {
            reason,
            at: Utc::now(),
        };
        Ok(())
    }

    pub fn finish_reason(&self) -> Option<&FinishReason> {
        match self {
            Self::Sequencing => None,
            Self::Finished { reason, .. } => Some(reason),
        }
    }
}
