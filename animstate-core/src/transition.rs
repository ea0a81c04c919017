//! Transitions between states.

use crate::condition::{CompareMode, Condition};
use crate::error::CoreError;
use crate::param::ParameterStore;

/// An edge to a target state.
///
/// All conditions must hold for the transition to fire. Conditions are
/// keyed by parameter name: a transition holds at most one condition per
/// parameter and the first one registered wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    target: String,
    conditions: Vec<Condition>,
    has_exit_time: bool,
    exit_time: f32,
    can_transition_to_self: bool,
}

impl Transition {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            conditions: Vec::new(),
            has_exit_time: false,
            exit_time: 0.0,
            can_transition_to_self: false,
        }
    }

    /// Name of the state this transition leads to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Conditions in registration order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn condition(&self, param: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.param() == param)
    }

    /// Adds a condition unless one already exists for the same parameter.
    ///
    /// Returns true if the condition was inserted.
    pub fn add_condition(&mut self, condition: Condition) -> bool {
        if self.condition(condition.param()).is_some() {
            tracing::warn!(
                "transition to '{}' already has a condition on '{}', ignoring",
                self.target,
                condition.param()
            );
            return false;
        }
        self.conditions.push(condition);
        true
    }

    pub fn add_scalar_condition(
        &mut self,
        param: impl Into<String>,
        mode: CompareMode,
        value: f32,
    ) -> bool {
        self.add_condition(Condition::scalar(param, mode, value))
    }

    pub fn add_integer_condition(
        &mut self,
        param: impl Into<String>,
        mode: CompareMode,
        value: i32,
    ) -> bool {
        self.add_condition(Condition::integer(param, mode, value))
    }

    pub fn add_boolean_condition(&mut self, param: impl Into<String>, value: bool) -> bool {
        self.add_condition(Condition::boolean(param, value))
    }

    /// Removes the condition on `param`, returning whether one was present.
    pub fn remove_condition(&mut self, param: &str) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.param() != param);
        self.conditions.len() != before
    }

    /// Sets or clears the exit-time gate.
    ///
    /// `Some(t)` requires the playing clip to have reached normalized
    /// progress `t` (clamped to `[0, 1]`) before the transition may fire.
    pub fn set_exit_time(&mut self, exit_time: Option<f32>) -> &mut Self {
        match exit_time {
            Some(t) => {
                self.has_exit_time = true;
                self.exit_time = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
            }
            None => {
                self.has_exit_time = false;
                self.exit_time = 0.0;
            }
        }
        self
    }

    pub fn has_exit_time(&self) -> bool {
        self.has_exit_time
    }

    /// Exit time if the gate is enabled.
    pub fn exit_time(&self) -> Option<f32> {
        self.has_exit_time.then_some(self.exit_time)
    }

    /// Allows this transition to fire while its target is already active.
    pub fn set_can_transition_to_self(&mut self, allow: bool) -> &mut Self {
        self.can_transition_to_self = allow;
        self
    }

    pub fn can_transition_to_self(&self) -> bool {
        self.can_transition_to_self
    }

    /// Returns whether the exit-time gate is open for the given progress.
    ///
    /// Without a progress source the gate stays closed.
    pub fn exit_time_reached(&self, progress: Option<f32>) -> bool {
        if !self.has_exit_time {
            return true;
        }
        progress.map(|p| p >= self.exit_time).unwrap_or(false)
    }

    /// Evaluates every condition against `params`, then the exit-time gate.
    ///
    /// Stops at the first condition that is false or fails to evaluate.
    pub fn evaluate(
        &self,
        params: &ParameterStore,
        progress: Option<f32>,
    ) -> Result<bool, CoreError> {
        for condition in &self.conditions {
            if !condition.evaluate_in(params)? {
                return Ok(false);
            }
        }
        Ok(self.exit_time_reached(progress))
    }
}
