//! animstate-host - Runs state machines outside of an engine.
//!
//! Loads definitions and configuration, simulates clip playback on a fixed
//! time step, and replays tick scripts against a machine.

pub mod config;
pub mod error;
pub mod player;
pub mod runner;
pub mod script;

pub use config::{Config, ConfigError, LogConfig, MachineConfig, PlayerConfig, SimulationConfig};
pub use error::HostError;
pub use player::{ClipPlayer, Playing};
pub use runner::{ExpectFailure, RecordedChange, RunReport, Runner};
pub use script::{Script, ScriptValue, Step};

use animstate_core::{MachineDefinition, StateMachine};
use std::path::Path;

/// Loads a machine definition. Files ending in `.json` are read as JSON,
/// everything else as YAML.
pub fn load_definition(path: impl AsRef<Path>) -> Result<MachineDefinition, HostError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| HostError::io(path, e))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let definition = if is_json {
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(animstate_core::CoreError::from)?;
        MachineDefinition::from_json(&value)?
    } else {
        MachineDefinition::from_yaml(&text)?
    };

    tracing::info!(
        "loaded definition {} (checksum {}, {} states, {} parameters)",
        path.display(),
        definition.checksum,
        definition.state_count(),
        definition.parameter_count()
    );
    Ok(definition)
}

/// Builds the configured machine with a clip player from `config.player`.
pub fn load_machine(config: &Config) -> Result<StateMachine<ClipPlayer>, HostError> {
    config.validate()?;
    let path = config
        .machine
        .definition
        .as_ref()
        .ok_or(HostError::MissingDefinition)?;
    let definition = load_definition(path)?;
    Ok(definition.build(ClipPlayer::new(config.player.clone()))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION_YAML: &str = "origin: Idle\nstates: [Idle, Walk]\n";

    #[test]
    fn test_load_yaml_and_json_definitions() {
        let dir = tempfile::TempDir::new().unwrap();

        let yaml = dir.path().join("machine.yaml");
        std::fs::write(&yaml, DEFINITION_YAML).unwrap();
        let from_yaml = load_definition(&yaml).unwrap();

        let json = dir.path().join("machine.json");
        std::fs::write(&json, r#"{"origin": "Idle", "states": ["Idle", "Walk"]}"#).unwrap();
        let from_json = load_definition(&json).unwrap();

        assert_eq!(from_yaml.checksum, from_json.checksum);
        assert_eq!(from_json.state_count(), 2);
    }

    #[test]
    fn test_load_machine_requires_definition() {
        let config = Config::default();
        assert!(matches!(
            load_machine(&config),
            Err(HostError::MissingDefinition)
        ));
    }

    #[test]
    fn test_load_machine() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("machine.yml");
        std::fs::write(&path, DEFINITION_YAML).unwrap();

        let mut config = Config::default();
        config.machine.definition = Some(path);
        let mut machine = load_machine(&config).unwrap();

        machine.tick();
        assert_eq!(machine.current_state_name(), Some("Idle"));
        assert_eq!(machine.animator().clips_started(), 1);
    }

    #[test]
    fn test_load_machine_rejects_invalid_player_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("machine.yaml");
        std::fs::write(&path, DEFINITION_YAML).unwrap();

        let mut config = Config::default();
        config.machine.definition = Some(path);
        config.player.default_clip_secs = 0.0;
        assert!(matches!(
            load_machine(&config),
            Err(HostError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load_definition("/nonexistent/machine.yaml");
        assert!(matches!(result, Err(HostError::Io { .. })));
    }
}
