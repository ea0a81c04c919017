//! # animstate-core
//!
//! Tick-driven state machine for animation control.
//!
//! This crate provides:
//! - Typed parameter storage
//! - Conditions and their textual syntax
//! - States, transitions and the any-state
//! - The per-tick evaluator that drives an [`Animator`]
//! - Serializable machine definitions

pub mod animator;
pub mod condition;
pub mod definition;
pub mod error;
pub mod machine;
pub mod param;
pub mod state;
pub mod transition;

pub use animator::{Animator, NullAnimator, RecordingAnimator};
pub use condition::{CompareMode, Condition, ConditionExpr};
pub use definition::{MachineDefinition, MachineDefinitionRaw, ResolvedTransition, StateDef};
pub use error::{CoreError, EntryKind};
pub use machine::{ChangeCause, StateChange, StateMachine};
pub use param::{ParamKind, ParamValue, Parameter, ParameterStore};
pub use state::{AnyState, State, TransitionSet};
pub use transition::Transition;
