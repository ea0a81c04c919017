//! Interactive REPL.

use animstate_core::StateMachine;
use animstate_host::{load_definition, ClipPlayer, Config, Runner, ScriptValue};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::Path;

const HELP_TEXT: &str = r#"
Available commands:
  help                          Show this help

  params                        List parameters and their values
  set <name> <value>            Set a parameter (true/false, integer or float)
  remove <name>                 Remove a parameter

  states                        List states
  state                         Show the active state and its transitions
  any                           Show any-state transitions

  tick [n]                      Advance playback and tick n times (default 1,
                                at most simulation.max_ticks)
  progress                      Show clip playback progress
  reset                         Clear the active state

  quit, exit                    Exit the REPL
"#;

pub fn run(definition: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "animstate REPL".bold().cyan());

    let def = load_definition(definition)?;
    let mut machine = def.build(ClipPlayer::new(config.player.clone()))?;
    machine.validate()?;
    let runner = Runner::from_config(&config.simulation);
    println!(
        "Loaded {} ({} states, checksum {}), dt={}s",
        definition.display().to_string().cyan(),
        def.state_count(),
        def.checksum,
        runner.dt()
    );

    // Create readline editor
    let rl_config = rustyline::Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(rl_config)?;

    // Load history
    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".animstate_history"))
        .unwrap_or_else(|_| ".animstate_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    let mut ticks: u64 = 0;
    loop {
        let active = machine.current_state_name().unwrap_or("-").to_string();
        let prompt = format!("{} ", format!("{}>", active).cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_command(&mut machine, &runner, &mut ticks, line) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break, // Exit command
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    // Save history
    let _ = rl.save_history(&history_path);

    Ok(())
}

fn execute_repl_command(
    machine: &mut StateMachine<ClipPlayer>,
    runner: &Runner,
    ticks: &mut u64,
    line: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(Some(String::new()));
    }

    let cmd = parts[0].to_lowercase();
    let args = &parts[1..];

    match cmd.as_str() {
        "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

        "quit" | "exit" | "q" => Ok(None),

        "params" | "p" => {
            let params = machine.params().sorted();
            if params.is_empty() {
                return Ok(Some("No parameters".yellow().to_string()));
            }
            let mut output = String::new();
            for param in params {
                output.push_str(&format!(
                    "  {}: {} = {}\n",
                    param.name().cyan(),
                    param.kind(),
                    param.value()
                ));
            }
            Ok(Some(output))
        }

        "set" | "s" => {
            if args.len() != 2 {
                return Ok(Some("Usage: set <name> <value>".to_string()));
            }
            let name = args[0];
            let kind = machine.get_param(name)?.kind();
            let value = ScriptValue::parse(args[1])
                .and_then(|v| v.to_param_value(kind))
                .ok_or_else(|| format!("'{}' is not a valid {} value", args[1], kind))?;
            machine.set_param(name, value)?;
            Ok(Some(format!("{} = {}", name.cyan(), value)))
        }

        "remove" | "rm" => {
            if args.len() != 1 {
                return Ok(Some("Usage: remove <name>".to_string()));
            }
            if machine.remove_param(args[0]) {
                Ok(Some(format!("{} {}", "Removed".green(), args[0].cyan())))
            } else {
                Ok(Some(format!("No parameter {}", args[0]).yellow().to_string()))
            }
        }

        "states" => {
            let mut output = String::new();
            for name in machine.state_names() {
                let marker = if machine.current_state_name() == Some(name) {
                    "*"
                } else {
                    " "
                };
                output.push_str(&format!("{} {}\n", marker, name.cyan()));
            }
            Ok(Some(output))
        }

        "state" => match machine.current_state() {
            Some(state) => {
                let mut output = format!(
                    "{} (clip {}, speed {})\n",
                    state.name().yellow(),
                    state.clip(),
                    state.speed()
                );
                for transition in state.transitions() {
                    output.push_str(&format!("  -> {}\n", describe(transition)));
                }
                Ok(Some(output))
            }
            None => Ok(Some("Not started (tick to enter the origin)".yellow().to_string())),
        },

        "any" => {
            let transitions = machine.any_state().transitions();
            if transitions.is_empty() {
                return Ok(Some("No any-state transitions".yellow().to_string()));
            }
            let mut output = String::new();
            for transition in transitions {
                output.push_str(&format!("  * -> {}\n", describe(transition)));
            }
            Ok(Some(output))
        }

        "tick" | "t" => {
            let count: u64 = match args.first() {
                Some(n) => n.parse()?,
                None => 1,
            };
            let limit = runner.max_ticks();
            if limit > 0 && count > limit {
                return Ok(Some(format!(
                    "{} tick(s) exceeds simulation.max_ticks ({})",
                    count, limit
                )));
            }
            let mut output = String::new();
            for _ in 0..count {
                *ticks += 1;
                if let Some(change) = runner.step(machine) {
                    output.push_str(&format!(
                        "[{}] {} -> {}\n",
                        ticks.to_string().cyan(),
                        change.from.as_deref().unwrap_or("<none>"),
                        change.to.yellow()
                    ));
                }
            }
            if output.is_empty() {
                output = format!("No change ({} tick(s))", count).dimmed().to_string();
            }
            Ok(Some(output))
        }

        "progress" => match machine.animator().playing() {
            Some(playing) => Ok(Some(format!(
                "{} {:.3} ({:.3}s of {:.3}s{})",
                playing.clip.cyan(),
                playing.normalized(),
                playing.elapsed,
                playing.length,
                if playing.looping { ", looping" } else { "" }
            ))),
            None => Ok(Some("Nothing playing".yellow().to_string())),
        },

        "reset" => {
            machine.reset();
            Ok(Some(format!("{} (origin {})", "Reset".green(), machine.origin())))
        }

        _ => Ok(Some(format!(
            "Unknown command: {}. Type 'help' for help.",
            cmd
        ))),
    }
}

fn describe(transition: &animstate_core::Transition) -> String {
    let mut line = transition.target().to_string();
    if !transition.conditions().is_empty() {
        let conditions: Vec<_> = transition.conditions().iter().map(|c| c.to_string()).collect();
        line.push_str(&format!(" when {}", conditions.join(" && ")));
    }
    if let Some(exit_time) = transition.exit_time() {
        line.push_str(&format!(" after {}", exit_time));
    }
    line
}
