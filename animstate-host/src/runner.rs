//! Fixed-step simulation loop.
//!
//! Each tick advances the clip player by `dt` seconds and then evaluates the
//! machine once, so exit times see the progress made since the last tick.

use crate::config::SimulationConfig;
use crate::player::ClipPlayer;
use crate::script::{Script, ScriptValue, Step};
use animstate_core::{StateChange, StateMachine};
use std::collections::BTreeMap;

/// A state change and the tick that produced it (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedChange {
    pub tick: u64,
    pub change: StateChange,
}

/// An `expect` step that did not hold.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectFailure {
    /// Index of the step in the script.
    pub step: usize,
    pub tick: u64,
    pub expected: String,
    pub actual: Option<String>,
}

/// Outcome of a script run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub ticks: u64,
    pub changes: Vec<RecordedChange>,
    pub failures: Vec<ExpectFailure>,
    /// Rejected parameter writes and removals.
    pub errors: Vec<String>,
    /// True when the tick limit stopped the run early.
    pub truncated: bool,
    pub final_state: Option<String>,
}

impl RunReport {
    /// True when every expectation held and no step was rejected.
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty() && !self.truncated
    }
}

/// Runs scripts against a machine on a fixed time step.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    dt: f32,
    max_ticks: u64,
}

impl Runner {
    pub fn new(dt: f32, max_ticks: u64) -> Self {
        Self { dt, max_ticks }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.dt_secs, config.max_ticks)
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Tick limit for a single run, 0 for unlimited.
    pub fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Advances playback and ticks once.
    pub fn step(&self, machine: &mut StateMachine<ClipPlayer>) -> Option<StateChange> {
        machine.animator_mut().advance(self.dt);
        machine.tick()
    }

    /// Runs every step of `script`.
    pub fn run(&self, machine: &mut StateMachine<ClipPlayer>, script: &Script) -> RunReport {
        let mut report = RunReport::default();

        'steps: for (index, step) in script.steps.iter().enumerate() {
            match step {
                Step::Set(values) => apply_set(machine, values, &mut report),
                Step::Tick(count) => {
                    for _ in 0..*count {
                        if self.max_ticks > 0 && report.ticks >= self.max_ticks {
                            tracing::warn!("tick limit {} reached, stopping run", self.max_ticks);
                            report.truncated = true;
                            break 'steps;
                        }
                        report.ticks += 1;
                        if let Some(change) = self.step(machine) {
                            tracing::info!(
                                "tick {}: {} -> {}",
                                report.ticks,
                                change.from.as_deref().unwrap_or("<none>"),
                                change.to
                            );
                            report.changes.push(RecordedChange {
                                tick: report.ticks,
                                change,
                            });
                        }
                    }
                }
                Step::Expect(expected) => {
                    let actual = machine.current_state_name();
                    if actual != Some(expected.as_str()) {
                        tracing::warn!(
                            "step {}: expected state '{}', found {:?}",
                            index,
                            expected,
                            actual
                        );
                        report.failures.push(ExpectFailure {
                            step: index,
                            tick: report.ticks,
                            expected: expected.clone(),
                            actual: actual.map(str::to_string),
                        });
                    }
                }
                Step::Remove(name) => {
                    if !machine.remove_param(name) {
                        tracing::warn!("step {}: no parameter '{}' to remove", index, name);
                        report
                            .errors
                            .push(format!("step {}: no parameter '{}' to remove", index, name));
                    }
                }
                Step::Reset => machine.reset(),
            }
        }

        report.final_state = machine.current_state_name().map(str::to_string);
        report
    }
}

fn apply_set(
    machine: &mut StateMachine<ClipPlayer>,
    values: &BTreeMap<String, ScriptValue>,
    report: &mut RunReport,
) {
    for (name, value) in values {
        let kind = match machine.get_param(name) {
            Ok(param) => param.kind(),
            Err(e) => {
                report.errors.push(e.to_string());
                continue;
            }
        };
        let Some(converted) = value.to_param_value(kind) else {
            tracing::warn!("cannot assign {} to {} parameter '{}'", value, kind, name);
            report.errors.push(format!(
                "cannot assign {} to {} parameter '{}'",
                value, kind, name
            ));
            continue;
        };
        if let Err(e) = machine.set_param(name, converted) {
            report.errors.push(e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use animstate_core::{ChangeCause, MachineDefinition};

    const LOCOMOTION: &str = r#"
origin: Idle
parameters:
  IsMoving: { bool: false }
  Speed: { float: 0.0 }
  Attack: { bool: false }
states:
  - Idle
  - Walk
  - Run
  - Attack
transitions:
  - from: Idle
    to: Walk
    conditions: ["IsMoving"]
  - from: Walk
    to: Run
    conditions: ["Speed > 10"]
  - from: [Walk, Run]
    to: Idle
    conditions: ["!IsMoving"]
  - from: Attack
    to: Idle
    exit_time: 1.0
any_state:
  - to: Attack
    conditions: ["Attack"]
"#;

    fn machine() -> StateMachine<ClipPlayer> {
        let mut player = PlayerConfig::default();
        player.clip_secs.insert("Attack".to_string(), 0.5);
        MachineDefinition::from_yaml(LOCOMOTION)
            .unwrap()
            .build(ClipPlayer::new(player))
            .unwrap()
    }

    #[test]
    fn test_run_records_changes() {
        let script = Script::from_yaml(
            r#"
steps:
  - tick: 1
  - expect: Idle
  - set: { IsMoving: true, Speed: 12 }
  - tick: 2
  - expect: Run
"#,
        )
        .unwrap();

        let mut machine = machine();
        let report = Runner::new(0.125, 0).run(&mut machine, &script);

        assert!(report.passed(), "{:?}", report);
        assert_eq!(report.ticks, 3);
        assert_eq!(report.final_state.as_deref(), Some("Run"));
        let summary: Vec<_> = report
            .changes
            .iter()
            .map(|c| (c.tick, c.change.to.as_str(), c.change.cause))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "Idle", ChangeCause::Entry),
                (2, "Walk", ChangeCause::Transition),
                (3, "Run", ChangeCause::Transition),
            ]
        );
    }

    #[test]
    fn test_exit_time_follows_playback() {
        let script = Script::from_yaml(
            r#"
steps:
  - tick: 1
  - set: { Attack: true }
  - tick: 1
  - expect: Attack
  - set: { Attack: false }
  - tick: 3
  - expect: Attack
  - tick: 1
  - expect: Idle
"#,
        )
        .unwrap();

        // 0.5s clip advanced 0.125s per tick reaches the end on the fourth tick
        let mut machine = machine();
        let report = Runner::new(0.125, 0).run(&mut machine, &script);

        assert!(report.passed(), "{:?}", report);
        let last = report.changes.last().unwrap();
        assert_eq!(last.tick, 6);
        assert_eq!(last.change.from.as_deref(), Some("Attack"));
        assert_eq!(last.change.to, "Idle");
    }

    #[test]
    fn test_expect_failure_is_reported() {
        let script = Script::from_yaml("steps:\n  - tick: 1\n  - expect: Run\n").unwrap();
        let mut machine = machine();
        let report = Runner::new(0.1, 0).run(&mut machine, &script);

        assert!(!report.passed());
        assert_eq!(
            report.failures,
            vec![ExpectFailure {
                step: 1,
                tick: 1,
                expected: "Run".to_string(),
                actual: Some("Idle".to_string()),
            }]
        );
    }

    #[test]
    fn test_rejected_writes_are_reported() {
        let script = Script::from_yaml(
            r#"
steps:
  - set: { Missing: 1, IsMoving: 3, Speed: 4 }
  - remove: Missing
  - tick: 1
"#,
        )
        .unwrap();

        let mut machine = machine();
        let report = Runner::new(0.1, 0).run(&mut machine, &script);

        assert_eq!(report.errors.len(), 3);
        assert_eq!(machine.get_float("Speed").unwrap(), 4.0);
        assert!(!machine.get_bool("IsMoving").unwrap());
    }

    #[test]
    fn test_removed_parameter_blocks_transition() {
        let script = Script::from_yaml(
            r#"
steps:
  - tick: 1
  - remove: IsMoving
  - tick: 5
  - expect: Idle
"#,
        )
        .unwrap();

        let mut machine = machine();
        let report = Runner::new(0.1, 0).run(&mut machine, &script);
        assert!(report.passed(), "{:?}", report);
        assert_eq!(report.changes.len(), 1);
    }

    #[test]
    fn test_reset_reenters_origin() {
        let script = Script::from_yaml(
            r#"
steps:
  - set: { IsMoving: true }
  - tick: 2
  - expect: Walk
  - reset
  - tick: 1
  - expect: Idle
"#,
        )
        .unwrap();

        let mut machine = machine();
        let report = Runner::new(0.1, 0).run(&mut machine, &script);
        assert!(report.passed(), "{:?}", report);
        assert_eq!(report.changes[2].change.cause, ChangeCause::Entry);
    }

    #[test]
    fn test_exit_time_from_looping_clip() {
        for exit_time in ["0.9", "1.0"] {
            let yaml = format!(
                "origin: Run\nstates: [Run, Idle]\ntransitions:\n  - {{ from: Run, to: Idle, exit_time: {} }}",
                exit_time
            );
            let mut player = PlayerConfig::default();
            player.looping.push("Run".to_string());
            let mut machine = MachineDefinition::from_yaml(&yaml)
                .unwrap()
                .build(ClipPlayer::new(player))
                .unwrap();

            let script = Script::from_yaml(
                "steps:\n  - tick: 4\n  - expect: Run\n  - tick: 1\n  - expect: Idle\n",
            )
            .unwrap();
            let report = Runner::new(0.25, 0).run(&mut machine, &script);
            assert!(report.passed(), "exit_time {}: {:?}", exit_time, report);
            assert_eq!(report.changes.last().unwrap().tick, 5);
        }
    }

    #[test]
    fn test_tick_limit_truncates() {
        let script = Script::from_yaml("steps:\n  - tick: 10\n  - expect: Idle\n").unwrap();
        let mut machine = machine();
        let report = Runner::new(0.1, 4).run(&mut machine, &script);

        assert!(report.truncated);
        assert_eq!(report.ticks, 4);
        assert!(report.failures.is_empty());
        assert!(!report.passed());
    }
}
