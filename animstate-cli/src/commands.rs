//! Command execution.

use crate::{Commands, Format};
use animstate_core::{MachineDefinition, ResolvedTransition};
use animstate_host::{load_definition, ClipPlayer, Config, RunReport, Runner, Script};
use colored::Colorize;
use std::path::Path;

/// Executes a command and returns the formatted output.
pub fn execute(cmd: Commands, config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl { .. } => unreachable!(),

        Commands::Check { definition } => {
            let def = load_definition(&definition)?;
            def.build(ClipPlayer::new(config.player.clone()))?.validate()?;
            Ok(describe_definition(&definition, &def))
        }

        Commands::Print { definition, format } => {
            let def = load_definition(&definition)?;
            match format {
                Format::Json => Ok(serde_json::to_string_pretty(&def.to_json()?)?),
                Format::Yaml => Ok(def.to_yaml()?),
            }
        }

        Commands::Run {
            definition,
            script,
            verbose,
        } => {
            let def = load_definition(&definition)?;
            let mut machine = def.build(ClipPlayer::new(config.player.clone()))?;
            let script = Script::from_file(&script)?;

            let report = Runner::from_config(&config.simulation).run(&mut machine, &script);
            let output = format_report(&report, verbose);
            if report.passed() {
                Ok(output)
            } else {
                Err(output.into())
            }
        }
    }
}

fn describe_definition(path: &Path, def: &MachineDefinition) -> String {
    let mut output = format!(
        "{} {} (checksum: {})\n",
        "Valid".green(),
        path.display().to_string().cyan(),
        def.checksum
    );
    output.push_str(&format!("  Origin: {}\n", def.origin().yellow()));

    output.push_str(&format!("  Parameters ({}):\n", def.parameter_count()));
    for (name, value) in &def.raw.parameters {
        output.push_str(&format!("    {}: {} = {}\n", name.cyan(), value.kind(), value));
    }

    output.push_str(&format!("  States ({}):\n", def.state_count()));
    for state in &def.raw.states {
        output.push_str(&format!("    {}", state.name().cyan()));
        match state.clip() {
            Some(clip) if clip != state.name() => {
                output.push_str(&format!(" (clip {}, speed {})\n", clip, state.speed()))
            }
            _ => output.push_str(&format!(" (speed {})\n", state.speed())),
        }
    }

    output.push_str(&format!("  Transitions ({}):\n", def.transitions().len()));
    for transition in def.transitions() {
        output.push_str(&format!("    {}\n", describe_transition(transition)));
    }

    output
}

/// One-line rendering of a transition, e.g. `Walk -> Run when Speed > 10`.
pub fn describe_transition(t: &ResolvedTransition) -> String {
    let mut line = format!("{} -> {}", t.from.as_deref().unwrap_or("*"), t.to);
    if !t.conditions.is_empty() {
        let conditions: Vec<_> = t.conditions.iter().map(|c| c.to_string()).collect();
        line.push_str(&format!(" when {}", conditions.join(" && ")));
    }
    if let Some(exit_time) = t.exit_time {
        line.push_str(&format!(" after {}", exit_time));
    }
    if t.can_transition_to_self {
        line.push_str(" (self)");
    }
    line
}

fn format_report(report: &RunReport, verbose: bool) -> String {
    let mut output = String::new();

    if verbose {
        for recorded in &report.changes {
            output.push_str(&format!(
                "[{}] {} -> {}\n",
                recorded.tick.to_string().cyan(),
                recorded.change.from.as_deref().unwrap_or("<none>"),
                recorded.change.to.yellow()
            ));
        }
    }

    for failure in &report.failures {
        output.push_str(&format!(
            "{} step {} (tick {}): expected {}, found {}\n",
            "FAIL".red(),
            failure.step,
            failure.tick,
            failure.expected.yellow(),
            failure.actual.as_deref().unwrap_or("<none>")
        ));
    }
    for error in &report.errors {
        output.push_str(&format!("{} {}\n", "ERROR".red(), error));
    }
    if report.truncated {
        output.push_str(&format!("{} tick limit reached\n", "STOPPED".red()));
    }

    let status = if report.passed() {
        "Passed".green()
    } else {
        "Failed".red()
    };
    output.push_str(&format!(
        "{} after {} tick(s), {} change(s), final state {}",
        status,
        report.ticks,
        report.changes.len(),
        report.final_state.as_deref().unwrap_or("<none>").yellow()
    ));
    output
}
