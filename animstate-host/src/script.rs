//! Tick scripts.
//!
//! A script is a list of steps run against a machine:
//!
//! ```yaml
//! steps:
//!   - set: { IsMoving: true, Speed: 3.5 }
//!   - tick: 10
//!   - expect: Run
//!   - remove: Speed
//!   - reset
//! ```

use crate::error::HostError;
use animstate_core::{ParamKind, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A literal value in a `set` step, converted to the parameter's kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ScriptValue {
    /// Converts to a parameter value of `kind`.
    pub fn to_param_value(self, kind: ParamKind) -> Option<ParamValue> {
        match (kind, self) {
            (ParamKind::Boolean, ScriptValue::Bool(b)) => Some(ParamValue::Boolean(b)),
            (ParamKind::Integer, ScriptValue::Int(i)) => {
                i32::try_from(i).ok().map(ParamValue::Integer)
            }
            (ParamKind::Scalar, ScriptValue::Int(i)) => Some(ParamValue::Scalar(i as f32)),
            (ParamKind::Scalar, ScriptValue::Float(f)) => Some(ParamValue::Scalar(f as f32)),
            _ => None,
        }
    }

    /// Parses a value typed at a prompt.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "true" => Some(ScriptValue::Bool(true)),
            "false" => Some(ScriptValue::Bool(false)),
            _ => s
                .parse::<i64>()
                .map(ScriptValue::Int)
                .or_else(|_| s.parse::<f64>().map(ScriptValue::Float))
                .ok(),
        }
    }
}

impl std::fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptValue::Bool(v) => write!(f, "{}", v),
            ScriptValue::Int(v) => write!(f, "{}", v),
            ScriptValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One script step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Set parameters before the next tick.
    Set(BTreeMap<String, ScriptValue>),
    /// Run this many ticks.
    Tick(u64),
    /// Check the active state.
    Expect(String),
    /// Remove a parameter.
    Remove(String),
    /// Clear the active state so the origin is entered again.
    Reset,
}

/// A sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    /// Parses a script from YAML (or JSON) text.
    ///
    /// Steps are single-key maps (`tick: 3`) or bare names (`reset`).
    pub fn from_yaml(text: &str) -> Result<Self, HostError> {
        let json: serde_json::Value =
            serde_yaml::from_str(text).map_err(|e| HostError::Script(e.to_string()))?;
        serde_json::from_value(json).map_err(|e| HostError::Script(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| HostError::io(path, e))?;
        Self::from_yaml(&text)
    }

    /// Total ticks the script asks for.
    pub fn total_ticks(&self) -> u64 {
        self.steps
            .iter()
            .map(|s| match s {
                Step::Tick(n) => *n,
                _ => 0,
            })
            .sum()
    }
}
