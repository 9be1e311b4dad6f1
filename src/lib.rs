//! Ordered Startup for Supervisord
//!
//! Runs as a supervisord event listener and starts programs one after
//! another: program N+1 is only started once program N has reached its
//! configured state. Programs are ordered by `priority` and opt in with
//! `startinorder=true` in their `[program:x]` section.

pub mod app;
pub mod config;
pub mod error;
pub mod listener;
pub mod logging;
pub mod mock;
pub mod plan;
pub mod sequencer;
pub mod supervisor;

pub use config::{ConfigDocument, ConfigError, Settings};
pub use error::AppError;
pub use listener::{EventSource, StdioListener};
pub use mock::{FakeControlPlane, ScriptedEvents};
pub use plan::{OrderingPolicy, Program, StartupPlan};
pub use sequencer::{Decision, FinishReason, RunReport, Sequencer, SequencerError, SequencerState};
pub use supervisor::{ControlError, ControlPlane, ProcessInfo, SupervisorctlControlPlane};

pub use ordered_startup_protocol::{Notification, ProcessState};
