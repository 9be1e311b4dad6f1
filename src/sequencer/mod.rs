//! Ordered startup sequencer
//!
//! Starts the first program (unless supervisord autostarts it), then reacts
//! to process state events. Each event is matched against the plan from the
//! top: the first program that is ordered, has the event's process name and
//! has the event's state as its trigger decides the outcome. At most one
//! program is started per event.

mod state;

pub use state::{FinishReason, SequencerState};

use ordered_startup_protocol::{Notification, ProcessState, ProtocolError};
use tracing::{debug, info, warn};

use crate::listener::EventSource;
use crate::plan::{Program, StartupPlan};
use crate::supervisor::{ControlError, ControlPlane};

/// Sequencer errors. All of them end the sequencer.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("control plane error: {0}")]
    Control(#[from] ControlError),

    #[error("event protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("sequencing already finished at '{}'", .0.program())]
    AlreadyFinished(FinishReason),
}

/// Outcome of scanning the plan for one process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance<'a> {
    /// No ordered program has this trigger.
    Nothing,
    /// `trigger` reached its state; `next` is the program after it and
    /// `rest` the plan from `next` onwards.
    Start {
        trigger: &'a Program,
        next: &'a Program,
        rest: &'a [Program],
    },
    /// `trigger` reached its state and does not start a successor.
    EndOfSequence(&'a Program),
    /// `trigger` reached its state but is the last program.
    Exhausted(&'a Program),
}

/// Scan `programs` in order for the trigger matching `process_name`/`state`.
///
/// The program after the trigger is started even if it is not itself
/// ordered.
pub fn scan<'a>(programs: &'a [Program], process_name: &str, state: ProcessState) -> Advance<'a> {
    let mut trigger: Option<&Program> = None;
    for (index, program) in programs.iter().enumerate() {
        if let Some(trigger) = trigger {
            return Advance::Start {
                trigger,
                next: program,
                rest: &programs[index..],
            };
        }
        let policy = &program.options;
        if policy.start_in_order && program.name == process_name && policy.start_next_after == state {
            if !policy.start_next {
                return Advance::EndOfSequence(program);
            }
            trigger = Some(program);
        }
    }
    match trigger {
        Some(program) => Advance::Exhausted(program),
        None => Advance::Nothing,
    }
}

/// What the sequencer did with one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Not a process state event, or sequencing already finished.
    Ignored,
    /// Process state event that triggers nothing.
    NoMatch,
    /// A start command was issued for `procname`.
    Started { procname: String },
    /// Sequencing ended with this event.
    Finished(FinishReason),
}

/// Counters for a completed event loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub received: usize,
    pub acknowledged: usize,
    /// Start commands issued by the loop, in order.
    pub started: Vec<String>,
}

/// Ordered startup state machine.
pub struct Sequencer<C> {
    plan: StartupPlan,
    control: C,
    state: SequencerState,
}

impl<C: ControlPlane> Sequencer<C> {
    pub fn new(plan: StartupPlan, control: C) -> Self {
        Self {
            plan,
            control,
            state: SequencerState::default(),
        }
    }

    pub fn plan(&self) -> &StartupPlan {
        &self.plan
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Resolve groups and start the first program unless supervisord
    /// autostarts it. Returns the name passed to the start command.
    ///
    /// The first start uses the bare program name and does not wait, even
    /// when the program belongs to a group.
    pub fn bootstrap(&mut self) -> Result<Option<String>, SequencerError> {
        let processes = self.control.list_processes()?;
        self.plan.resolve_groups(&processes);

        info!(order = ?self.plan.names(), "programs in order");
        match serde_json::to_string(&self.plan) {
            Ok(plan) => debug!(%plan, "startup plan"),
            Err(err) => debug!(error = %err, "startup plan not serializable"),
        }

        let Some(first) = self.plan.first() else {
            warn!("no programs configured, nothing to sequence");
            return Ok(None);
        };
        if first.options.autostart {
            debug!(program = %first.name, "first program is autostarted by supervisord");
            return Ok(None);
        }

        info!(program = %first.name, "starting first process");
        self.control.start_process(&first.name, false)?;
        Ok(Some(first.name.clone()))
    }

    /// Apply one notification.
    pub fn handle(&mut self, notification: &Notification) -> Result<Decision, SequencerError> {
        if self.state.is_finished() {
            return Ok(Decision::Ignored);
        }
        let Some(change) = notification.process_state_change()? else {
            return Ok(Decision::Ignored);
        };
        debug!(headers = ?notification.headers.tokens(), payload = %notification.payload, "process state event");
        debug!(
            process = %change.process_name,
            group = ?change.group_name,
            from = ?change.from_state,
            to = %change.state_token,
            "process state transition"
        );

        let Some(state) = change.state else {
            debug!(state = %change.state_token, "unrecognized process state");
            return Ok(Decision::NoMatch);
        };

        match scan(self.plan.programs(), &change.process_name, state) {
            Advance::Nothing => Ok(Decision::NoMatch),
            Advance::Start { trigger, next, rest } => {
                info!(%state, program = %trigger.name, "received trigger state, starting next process");
                info!(procname = %next.procname, "starting process");
                self.control.start_process(&next.procname, true)?;

                let decision = Decision::Started {
                    procname: next.procname.clone(),
                };
                // Nothing from here on can trigger another start.
                if rest.iter().all(|p| !p.options.start_in_order) {
                    let reason = FinishReason::SequenceComplete {
                        program: next.name.clone(),
                    };
                    self.finish(reason)?;
                }
                Ok(decision)
            }
            Advance::EndOfSequence(trigger) => {
                info!(%state, program = %trigger.name, "received trigger state with startnext disabled");
                let reason = FinishReason::EndOfSequence {
                    program: trigger.name.clone(),
                };
                self.finish(reason.clone())?;
                Ok(Decision::Finished(reason))
            }
            Advance::Exhausted(trigger) => {
                info!(%state, program = %trigger.name, "received trigger state for last program");
                let reason = FinishReason::LastProgramReached {
                    program: trigger.name.clone(),
                };
                self.finish(reason.clone())?;
                Ok(Decision::Finished(reason))
            }
        }
    }

    /// Process notifications until the source closes. Every notification is
    /// acknowledged exactly once after it has been handled.
    pub fn run<E: EventSource + ?Sized>(&mut self, events: &mut E) -> Result<RunReport, SequencerError> {
        let mut report = RunReport::default();
        while let Some(notification) = events.next_event()? {
            report.received += 1;
            if let Decision::Started { procname } = self.handle(&notification)? {
                report.started.push(procname);
            }
            events.acknowledge()?;
            report.acknowledged += 1;
        }
        info!(received = report.received, started = report.started.len(), "event channel closed");
        Ok(report)
    }

    fn finish(&mut self, reason: FinishReason) -> Result<(), SequencerError> {
        self.state.finish(reason)?;
        info!("no more processes to start for initial startup, ignoring all future events");
        Ok(())
    }
}
