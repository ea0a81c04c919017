//! animstate-cli - Command-line interface for animstate machines
//!
//! Checks and prints definitions, runs tick scripts, and provides a REPL
//! for stepping a machine by hand.

mod commands;
mod repl;

use animstate_host::Config;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "animstate-cli")]
#[command(about = "Command-line interface for animstate state machines")]
#[command(version)]
struct Cli {
    /// Host configuration file (YAML)
    #[arg(short, long, env = "ANIMSTATE_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds of playback per tick (overrides the config)
    #[arg(long, env = "ANIMSTATE_DT")]
    dt: Option<f32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a definition and print a summary
    Check {
        /// Definition file (YAML or JSON)
        definition: PathBuf,
    },

    /// Print a definition in normalized form
    Print {
        /// Definition file (YAML or JSON)
        definition: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: Format,
    },

    /// Run a tick script against a definition
    Run {
        /// Definition file (YAML or JSON)
        definition: PathBuf,

        /// Script file
        #[arg(short, long)]
        script: PathBuf,

        /// Print every state change
        #[arg(short, long)]
        verbose: bool,
    },

    /// Step a machine interactively
    Repl {
        /// Definition file (YAML or JSON)
        definition: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env(),
    };
    if let Some(dt) = cli.dt {
        config.simulation.dt_secs = dt;
    }
    if let Err(e) = config.validate() {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    }

    match cli.command {
        Commands::Repl { definition } => {
            repl::run(&definition, &config)?;
        }
        cmd => match commands::execute(cmd, &config) {
            Ok(output) => {
                println!("{}", output);
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
