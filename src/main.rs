//! Ordered startup event listener
//!
//! Entry point for the `ordered-startup-supervisord` binary. Configure it in
//! supervisord as an event listener subscribed to `PROCESS_STATE` events.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ordered_startup::config::{self, Settings};
use ordered_startup::error::{error_chain, AppError};
use ordered_startup::supervisor::{SupervisorctlConfig, SupervisorctlControlPlane};
use ordered_startup::{app, logging, StdioListener};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ordered-startup-supervisord")]
#[command(about = "Start supervisord programs in priority order", version)]
struct Cli {
    /// Path to supervisord.conf (default: probe conventional locations)
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = Settings::from_env();

    match run(cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_startup_error() {
                eprintln!("{}", e);
            }
            error!(error = %error_chain(&e), "ordered startup aborted");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli, settings: &Settings) -> Result<(), AppError> {
    let argv0 = std::env::args_os().next().map(PathBuf::from).unwrap_or_default();
    let config_path = config::resolve_config_path(cli.config.as_deref(), &argv0)?;

    logging::init(settings)?;
    info!(config = %config_path.display(), "ordered startup listener starting");

    let plan = app::load_plan(&config_path)?;

    let control = SupervisorctlControlPlane::new(SupervisorctlConfig::from_settings(
        settings,
        Some(config_path),
    ));
    let mut listener = StdioListener::stdio();

    let report = app::run_sequence(plan, control, &mut listener)?;
    info!(
        received = report.received,
        acknowledged = report.acknowledged,
        started = ?report.started,
        "ordered startup listener exiting"
    );
    Ok(())
}
