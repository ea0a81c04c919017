//! Serializable machine definitions.
//!
//! Definitions are authored as JSON or YAML:
//!
//! ```yaml
//! origin: Idle
//! parameters:
//!   IsMoving: { bool: false }
//!   Speed: { float: 0.0 }
//!   Jumps: { int: 0 }
//! states:
//!   - Idle
//!   - { name: Run, speed: 1.5, clip: run_loop }
//!   - Jump
//! transitions:
//!   - { from: Idle, to: Run, conditions: ["IsMoving", "Speed > 0.1"] }
//!   - { from: [Idle, Run], to: Jump, conditions: ["Jumps > 0"], exit_time: 0.5 }
//! any_state:
//!   - { to: Idle, conditions: ["!IsMoving"] }
//! ```
//!
//! Conditions use the syntax described in [`crate::condition`] and are
//! resolved against the declared parameter kinds when the definition is
//! validated.

use crate::animator::Animator;
use crate::condition::{Condition, ConditionExpr};
use crate::error::CoreError;
use crate::machine::StateMachine;
use crate::param::ParamValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A state entry: either a bare name or a name with playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateDef {
    Name(String),
    Detailed(StateSpec),
}

/// A state with explicit playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpec {
    pub name: String,

    #[serde(default = "default_speed")]
    pub speed: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
}

fn default_speed() -> f32 {
    1.0
}

impl StateDef {
    pub fn name(&self) -> &str {
        match self {
            StateDef::Name(name) => name,
            StateDef::Detailed(spec) => &spec.name,
        }
    }

    pub fn speed(&self) -> f32 {
        match self {
            StateDef::Name(_) => default_speed(),
            StateDef::Detailed(spec) => spec.speed,
        }
    }

    pub fn clip(&self) -> Option<&str> {
        match self {
            StateDef::Name(_) => None,
            StateDef::Detailed(spec) => spec.clip.as_deref(),
        }
    }
}

/// A transition between named states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDef {
    /// Source state(s). Can be a single state or multiple.
    #[serde(deserialize_with = "deserialize_from_states")]
    pub from: Vec<String>,

    /// Target state.
    pub to: String,

    /// Conditions, all of which must hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,

    /// Normalized clip progress required before firing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<f32>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub can_transition_to_self: bool,
}

/// A transition reachable from any state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyTransitionDef {
    pub to: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<f32>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub can_transition_to_self: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn deserialize_from_states<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct FromStatesVisitor;

    impl<'de> Visitor<'de> for FromStatesVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut states = Vec::new();
            while let Some(s) = seq.next_element::<String>()? {
                states.push(s);
            }
            Ok(states)
        }
    }

    deserializer.deserialize_any(FromStatesVisitor)
}

/// Raw machine definition as authored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineDefinitionRaw {
    /// State entered on the first tick.
    pub origin: String,

    /// Parameters and their initial values.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,

    /// All states.
    pub states: Vec<StateDef>,

    /// Transitions between states.
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,

    /// Transitions checked from every state.
    #[serde(default)]
    pub any_state: Vec<AnyTransitionDef>,

    /// Optional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// A transition with its conditions resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTransition {
    /// Source state, `None` for any-state transitions.
    pub from: Option<String>,
    pub to: String,
    pub conditions: Vec<Condition>,
    pub exit_time: Option<f32>,
    pub can_transition_to_self: bool,
}

/// Validated machine definition.
#[derive(Debug, Clone)]
pub struct MachineDefinition {
    /// Transitions in evaluation order, state transitions first.
    transitions: Vec<ResolvedTransition>,

    /// Raw definition as authored.
    pub raw: MachineDefinitionRaw,

    /// Hash of the definition for integrity checks.
    pub checksum: String,
}

impl MachineDefinition {
    /// Parses and validates a machine definition from JSON.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoreError> {
        let raw: MachineDefinitionRaw = serde_json::from_value(json.clone())?;
        Self::from_raw(raw)
    }

    /// Parses and validates a machine definition from YAML text.
    ///
    /// Tagged values such as parameters are written as single-key maps
    /// (`{ bool: false }`), the same shape as in JSON.
    pub fn from_yaml(yaml: &str) -> Result<Self, CoreError> {
        let json: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_json(&json)
    }

    /// Validates a raw definition.
    pub fn from_raw(raw: MachineDefinitionRaw) -> Result<Self, CoreError> {
        // Build state set
        let mut states = HashSet::new();
        for state in &raw.states {
            let name = state.name();
            if name.is_empty() {
                return Err(invalid("state name cannot be empty".to_string()));
            }
            if !states.insert(name) {
                return Err(invalid(format!("duplicate state '{}'", name)));
            }
            if !state.speed().is_finite() {
                return Err(invalid(format!("state '{}' has a non-finite speed", name)));
            }
        }

        // Validate origin state
        if !states.contains(raw.origin.as_str()) {
            return Err(invalid(format!(
                "origin state '{}' not in states list",
                raw.origin
            )));
        }

        let mut transitions = Vec::new();
        let mut seen = HashSet::new();
        for t in &raw.transitions {
            if t.from.is_empty() {
                return Err(invalid(format!(
                    "transition to '{}' has no source state",
                    t.to
                )));
            }
            if !states.contains(t.to.as_str()) {
                return Err(invalid(format!(
                    "transition target '{}' not in states list",
                    t.to
                )));
            }
            validate_exit_time(t.exit_time, &t.to)?;
            let conditions = resolve_conditions(&raw.parameters, &t.conditions, &t.to)?;

            // Add transition for each source state
            for from in &t.from {
                if !states.contains(from.as_str()) {
                    return Err(invalid(format!(
                        "transition source '{}' not in states list",
                        from
                    )));
                }
                if !seen.insert((Some(from.as_str()), t.to.as_str())) {
                    return Err(invalid(format!(
                        "duplicate transition from '{}' to '{}'",
                        from, t.to
                    )));
                }

                transitions.push(ResolvedTransition {
                    from: Some(from.clone()),
                    to: t.to.clone(),
                    conditions: conditions.clone(),
                    exit_time: t.exit_time,
                    can_transition_to_self: t.can_transition_to_self,
                });
            }
        }

        for t in &raw.any_state {
            if !states.contains(t.to.as_str()) {
                return Err(invalid(format!(
                    "any-state transition target '{}' not in states list",
                    t.to
                )));
            }
            if !seen.insert((None, t.to.as_str())) {
                return Err(invalid(format!(
                    "duplicate any-state transition to '{}'",
                    t.to
                )));
            }
            validate_exit_time(t.exit_time, &t.to)?;

            transitions.push(ResolvedTransition {
                from: None,
                to: t.to.clone(),
                conditions: resolve_conditions(&raw.parameters, &t.conditions, &t.to)?,
                exit_time: t.exit_time,
                can_transition_to_self: t.can_transition_to_self,
            });
        }

        // Compute checksum
        let json_bytes = serde_json::to_vec(&raw)?;
        let checksum = format!("{:08x}", crc32c::crc32c(&json_bytes));

        Ok(Self {
            transitions,
            raw,
            checksum,
        })
    }

    pub fn origin(&self) -> &str {
        &self.raw.origin
    }

    /// Resolved transitions, state-owned first then any-state, each group in
    /// declaration order.
    pub fn transitions(&self) -> &[ResolvedTransition] {
        &self.transitions
    }

    pub fn state_count(&self) -> usize {
        self.raw.states.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.raw.parameters.len()
    }

    /// Builds a ready-to-tick machine driving `animator`.
    pub fn build<A: Animator>(&self, animator: A) -> Result<StateMachine<A>, CoreError> {
        let mut machine = StateMachine::new(self.raw.origin.clone(), animator);

        for (name, value) in &self.raw.parameters {
            machine.add_param(name.clone(), *value)?;
        }

        for def in &self.raw.states {
            machine
                .add_state(def.name())
                .set_speed(def.speed())
                .set_clip(def.clip().map(str::to_string));
        }

        for resolved in &self.transitions {
            let transition = match &resolved.from {
                Some(from) => machine.add_transition(from, resolved.to.clone())?,
                None => machine.add_any_transition(resolved.to.clone()),
            };
            for condition in &resolved.conditions {
                transition.add_condition(condition.clone());
            }
            transition
                .set_exit_time(resolved.exit_time)
                .set_can_transition_to_self(resolved.can_transition_to_self);
        }

        tracing::debug!(
            "built machine from definition {} ({} states, {} transitions)",
            self.checksum,
            self.state_count(),
            self.transitions.len()
        );

        Ok(machine)
    }

    /// Returns the raw definition as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        Ok(serde_json::to_value(&self.raw)?)
    }

    /// Returns the raw definition as YAML, with tagged values as single-key maps.
    pub fn to_yaml(&self) -> Result<String, CoreError> {
        let mut buf = Vec::new();
        {
            let mut serializer = serde_yaml::Serializer::new(&mut buf);
            serde_yaml::with::singleton_map_recursive::serialize(&self.raw, &mut serializer)?;
        }
        String::from_utf8(buf)
            .map_err(|e| invalid(format!("YAML output is not UTF-8: {}", e)))
    }
}

fn invalid(reason: String) -> CoreError {
    CoreError::InvalidDefinition { reason }
}

fn validate_exit_time(exit_time: Option<f32>, to: &str) -> Result<(), CoreError> {
    match exit_time {
        Some(t) if !(0.0..=1.0).contains(&t) => Err(invalid(format!(
            "exit_time {} on transition to '{}' must be within [0, 1]",
            t, to
        ))),
        _ => Ok(()),
    }
}

fn resolve_conditions(
    parameters: &BTreeMap<String, ParamValue>,
    sources: &[String],
    to: &str,
) -> Result<Vec<Condition>, CoreError> {
    let mut conditions: Vec<Condition> = Vec::with_capacity(sources.len());

    for source in sources {
        let expr = ConditionExpr::parse(source).map_err(|e| {
            invalid(format!(
                "condition '{}' on transition to '{}': {}",
                source, to, e
            ))
        })?;

        let Some(value) = parameters.get(&expr.param) else {
            return Err(invalid(format!(
                "condition '{}' on transition to '{}' references undeclared parameter '{}'",
                source, to, expr.param
            )));
        };

        let condition = expr.resolve(value.kind()).map_err(|e| {
            invalid(format!(
                "condition '{}' on transition to '{}': {}",
                source, to, e
            ))
        })?;

        if conditions.iter().any(|c| c.param() == condition.param()) {
            return Err(invalid(format!(
                "transition to '{}' has more than one condition on '{}'",
                to, expr.param
            )));
        }
        conditions.push(condition);
    }

    Ok(conditions)
}
