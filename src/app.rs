//! Wiring between configuration, collaborators and the sequencer.

use std::path::Path;

use tracing::info;

use crate::config::{self, ConfigError};
use crate::listener::EventSource;
use crate::plan::StartupPlan;
use crate::sequencer::{RunReport, Sequencer, SequencerError};
use crate::supervisor::ControlPlane;

/// Read the configuration rooted at `config_path` and build the plan.
pub fn load_plan(config_path: &Path) -> Result<StartupPlan, ConfigError> {
    let document = config::load(config_path)?;
    let plan = StartupPlan::from_config(&document);
    info!(config = %config_path.display(), programs = plan.len(), "startup plan built");
    Ok(plan)
}

/// Bootstrap the sequence and process events until the source closes.
pub fn run_sequence<C, E>(plan: StartupPlan, control: C, events: &mut E) -> Result<RunReport, SequencerError>
where
    C: ControlPlane,
    E: EventSource + ?Sized,
{
    let mut sequencer = Sequencer::new(plan, control);
    sequencer.bootstrap()?;
    sequencer.run(events)
}
