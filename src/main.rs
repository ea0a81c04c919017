//! animstate - Runs a tick script against a state machine definition.
//!
//! The definition, script, time step and clip lengths all come from
//! configuration (ANIMSTATE_CONFIG, then ANIMSTATE_* overrides).

use animstate_host::{load_machine, Config, Runner, Script};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Load configuration (from file if ANIMSTATE_CONFIG is set, then env overrides)
    let config_path = std::env::var("ANIMSTATE_CONFIG").ok();
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) if config_path.is_some() => {
            // A config file was explicitly specified, so fail on error
            eprintln!("failed to load config: {}", e);
            return Err(e.into());
        }
        Err(e) => {
            eprintln!("invalid configuration ({}), using defaults", e);
            Config::default()
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str())),
        )
        .init();

    if let Some(path) = &config_path {
        tracing::info!("Loaded config from {}", path);
    }

    let mut machine = match load_machine(&config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Failed to load machine: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = machine.validate() {
        tracing::error!("Machine is not runnable: {}", e);
        return Err(e.into());
    }

    let script = match &config.machine.script {
        Some(path) => Script::from_file(path)?,
        None => {
            tracing::warn!("No script configured, nothing to run");
            return Ok(ExitCode::SUCCESS);
        }
    };

    let runner = Runner::from_config(&config.simulation);
    tracing::info!(
        "Running {} step(s), {} tick(s) at dt={}s",
        script.steps.len(),
        script.total_ticks(),
        runner.dt()
    );

    let report = runner.run(&mut machine, &script);

    for failure in &report.failures {
        tracing::error!(
            "step {} (tick {}): expected '{}', found {}",
            failure.step,
            failure.tick,
            failure.expected,
            failure.actual.as_deref().unwrap_or("<none>")
        );
    }
    for error in &report.errors {
        tracing::error!("{}", error);
    }
    if report.truncated {
        tracing::error!("Run stopped at the tick limit ({})", config.simulation.max_ticks);
    }

    tracing::info!(
        "Finished after {} tick(s), {} state change(s), final state {}",
        report.ticks,
        report.changes.len(),
        report.final_state.as_deref().unwrap_or("<none>")
    );

    if report.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
