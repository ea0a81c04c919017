//! State machine evaluator - owns parameters, states and the active state,
//! and drives the animator.

use crate::animator::{Animator, NullAnimator};
use crate::error::{CoreError, EntryKind};
use crate::param::{ParamKind, ParamValue, Parameter, ParameterStore};
use crate::state::{AnyState, State};
use crate::transition::Transition;
use std::collections::HashMap;

/// Why the active state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    /// The machine entered its origin state on its first tick.
    Entry,
    /// A transition of the previously active state fired.
    Transition,
    /// A transition of the any-state fired.
    AnyState,
}

/// Result of a tick that changed the active state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    /// Previously active state, `None` on entry.
    pub from: Option<String>,
    pub to: String,
    pub cause: ChangeCause,
}

type Observer = Box<dyn FnMut(&StateChange)>;

/// A finite state machine evaluated once per tick.
///
/// The machine is single-threaded: every mutator and [`tick`](Self::tick)
/// take `&mut self`. Misuse of names or kinds is logged and returned as an
/// error from mutators; during evaluation it only prevents a transition from
/// firing.
pub struct StateMachine<A: Animator = NullAnimator> {
    params: ParameterStore,
    states: HashMap<String, State>,
    any_state: AnyState,
    current: Option<String>,
    origin: String,
    animator: A,
    observer: Option<Observer>,
}

impl StateMachine<NullAnimator> {
    /// Creates a machine that drives no animator.
    pub fn headless(origin: impl Into<String>) -> Self {
        Self::new(origin, NullAnimator)
    }
}

impl<A: Animator> StateMachine<A> {
    /// Creates an empty machine that will enter `origin` on its first tick.
    pub fn new(origin: impl Into<String>, animator: A) -> Self {
        Self {
            params: ParameterStore::new(),
            states: HashMap::new(),
            any_state: AnyState::default(),
            current: None,
            origin: origin.into(),
            animator,
            observer: None,
        }
    }

    /// Registers a callback run after every state change.
    pub fn with_observer(mut self, observer: impl FnMut(&StateChange) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }

    pub fn add_param(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Result<&Parameter, CoreError> {
        self.params.add(name, value)
    }

    pub fn get_param(&self, name: &str) -> Result<&Parameter, CoreError> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), CoreError> {
        self.params.set(name, value)
    }

    pub fn remove_param(&mut self, name: &str) -> bool {
        self.params.remove(name)
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<(), CoreError> {
        self.params.set(name, value)
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<(), CoreError> {
        self.params.set(name, value)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<(), CoreError> {
        self.params.set(name, value)
    }

    pub fn get_float(&self, name: &str) -> Result<f32, CoreError> {
        let param = self.params.get(name)?;
        param
            .value()
            .as_f32()
            .ok_or_else(|| kind_mismatch(param, ParamKind::Scalar))
    }

    pub fn get_int(&self, name: &str) -> Result<i32, CoreError> {
        let param = self.params.get(name)?;
        param
            .value()
            .as_i32()
            .ok_or_else(|| kind_mismatch(param, ParamKind::Integer))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, CoreError> {
        let param = self.params.get(name)?;
        param
            .value()
            .as_bool()
            .ok_or_else(|| kind_mismatch(param, ParamKind::Boolean))
    }

    // =========================================================================
    // States and transitions
    // =========================================================================

    /// Returns the state named `name`, registering an empty one if needed.
    pub fn add_state(&mut self, name: impl Into<String>) -> &mut State {
        let name = name.into();
        self.states
            .entry(name)
            .or_insert_with_key(|name| State::new(name.clone()))
    }

    /// Removes a state.
    ///
    /// Transitions elsewhere that target it are kept; they can no longer be
    /// selected. If it was the active state, only any-state transitions are
    /// evaluated until one fires or the machine is reset.
    pub fn remove_state(&mut self, name: &str) -> bool {
        self.states.remove(name).is_some()
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut State> {
        self.states.get_mut(name)
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Iterates states in unspecified order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Registered state names, sorted.
    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.states.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Attaches a new transition `source -> target`, replacing any existing one.
    pub fn add_transition(
        &mut self,
        source: &str,
        target: impl Into<String>,
    ) -> Result<&mut Transition, CoreError> {
        let Some(state) = self.states.get_mut(source) else {
            tracing::warn!("cannot add transition from unknown state '{}'", source);
            return Err(CoreError::not_found(EntryKind::State, source));
        };
        Ok(state.add_transition(target))
    }

    pub fn remove_transition(&mut self, source: &str, target: &str) -> bool {
        self.states
            .get_mut(source)
            .map(|s| s.remove_transition(target))
            .unwrap_or(false)
    }

    pub fn transition_mut(&mut self, source: &str, target: &str) -> Option<&mut Transition> {
        self.states.get_mut(source)?.transition_mut(target)
    }

    /// Attaches a transition reachable from every state.
    pub fn add_any_transition(&mut self, target: impl Into<String>) -> &mut Transition {
        self.any_state.add_transition(target)
    }

    pub fn remove_any_transition(&mut self, target: &str) -> bool {
        self.any_state.remove_transition(target)
    }

    pub fn any_state(&self) -> &AnyState {
        &self.any_state
    }

    pub fn any_state_mut(&mut self) -> &mut AnyState {
        &mut self.any_state
    }

    // =========================================================================
    // Active state
    // =========================================================================

    /// Name of the active state, `None` before the first successful tick.
    pub fn current_state_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_state(&self) -> Option<&State> {
        self.current.as_deref().and_then(|name| self.states.get(name))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Changes the origin state. Takes effect on the next entry.
    pub fn set_origin(&mut self, origin: impl Into<String>) {
        self.origin = origin.into();
    }

    /// Clears the active state so the next tick enters the origin again.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut A {
        &mut self.animator
    }

    /// Checks that the origin state resolves.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.states.contains_key(&self.origin) {
            return Err(CoreError::InvalidConfiguration {
                reason: format!("origin state '{}' is not registered", self.origin),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Advances the machine by one step.
    ///
    /// Enters the origin state on the first tick. Afterwards the active
    /// state's transitions are checked in registration order, then the
    /// any-state's, and the first satisfied one fires. At most one state
    /// change happens per tick.
    pub fn tick(&mut self) -> Option<StateChange> {
        let (target, cause) = match self.current.as_deref() {
            None => match self.validate() {
                Ok(()) => (self.origin.clone(), ChangeCause::Entry),
                Err(e) => {
                    tracing::error!("cannot start state machine: {}", e);
                    return None;
                }
            },
            Some(current) => self.select(current)?,
        };

        let state = self.states.get(&target)?;
        self.animator.begin(state.clip(), state.speed());

        let change = StateChange {
            from: self.current.replace(target),
            to: state.name().to_string(),
            cause,
        };
        tracing::debug!(
            "state change {} -> {} ({:?})",
            change.from.as_deref().unwrap_or("<none>"),
            change.to,
            change.cause
        );

        if let Some(observer) = self.observer.as_mut() {
            observer(&change);
        }
        Some(change)
    }

    /// Finds the first transition that may fire from `current`.
    fn select(&self, current: &str) -> Option<(String, ChangeCause)> {
        let progress = self.animator.normalized_progress();

        let own = match self.states.get(current) {
            Some(state) => Some(state.transitions()),
            None => {
                tracing::warn!("active state '{}' is no longer registered", current);
                None
            }
        };

        let candidates = own
            .into_iter()
            .flatten()
            .map(|t| (t, ChangeCause::Transition))
            .chain(
                self.any_state
                    .transitions()
                    .iter()
                    .map(|t| (t, ChangeCause::AnyState)),
            );

        for (transition, cause) in candidates {
            let target = transition.target();
            if target == current && !transition.can_transition_to_self() {
                continue;
            }

            match transition.evaluate(&self.params, progress) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::trace!("transition {} -> {} not satisfied", current, target);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        "transition {} -> {} cannot fire: {}",
                        source_label(current, cause),
                        target,
                        e
                    );
                    continue;
                }
            }

            if !self.states.contains_key(target) {
                tracing::warn!(
                    "transition {} -> {} satisfied but target state is not registered",
                    source_label(current, cause),
                    target
                );
                continue;
            }

            return Some((target.to_string(), cause));
        }

        None
    }
}

impl<A: Animator + std::fmt::Debug> std::fmt::Debug for StateMachine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("params", &self.params)
            .field("states", &self.states)
            .field("any_state", &self.any_state)
            .field("current", &self.current)
            .field("origin", &self.origin)
            .field("animator", &self.animator)
            .finish_non_exhaustive()
    }
}

fn source_label(current: &str, cause: ChangeCause) -> &str {
    match cause {
        ChangeCause::AnyState => "<any>",
        _ => current,
    }
}

fn kind_mismatch(param: &Parameter, expected: ParamKind) -> CoreError {
    CoreError::KindMismatch {
        name: param.name().to_string(),
        expected,
        actual: param.kind(),
    }
}
