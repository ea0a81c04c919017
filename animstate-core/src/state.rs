//! States and their outgoing transitions.

use crate::transition::Transition;

/// Outgoing transitions keyed by target state name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionSet {
    transitions: Vec<Transition>,
}

impl TransitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh transition to `target`.
    ///
    /// If one already exists it is replaced in place, keeping its position
    /// in the evaluation order.
    pub fn insert(&mut self, target: impl Into<String>) -> &mut Transition {
        let transition = Transition::new(target);
        match self.position(transition.target()) {
            Some(idx) => {
                self.transitions[idx] = transition;
                &mut self.transitions[idx]
            }
            None => {
                self.transitions.push(transition);
                let last = self.transitions.len() - 1;
                &mut self.transitions[last]
            }
        }
    }

    pub fn get(&self, target: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.target() == target)
    }

    pub fn get_mut(&mut self, target: &str) -> Option<&mut Transition> {
        self.transitions.iter_mut().find(|t| t.target() == target)
    }

    pub fn remove(&mut self, target: &str) -> bool {
        match self.position(target) {
            Some(idx) => {
                self.transitions.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    fn position(&self, target: &str) -> Option<usize> {
        self.transitions.iter().position(|t| t.target() == target)
    }
}

impl<'a> IntoIterator for &'a TransitionSet {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A named node of the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    name: String,
    transitions: TransitionSet,
    speed: f32,
    clip: Option<String>,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transitions: TransitionSet::new(),
            speed: 1.0,
            clip: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Playback speed multiplier handed to the animator on entry.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) -> &mut Self {
        self.speed = speed;
        self
    }

    /// Clip started on entry; defaults to the state name.
    pub fn clip(&self) -> &str {
        self.clip.as_deref().unwrap_or(&self.name)
    }

    pub fn set_clip(&mut self, clip: Option<String>) -> &mut Self {
        self.clip = clip;
        self
    }

    pub fn add_transition(&mut self, target: impl Into<String>) -> &mut Transition {
        self.transitions.insert(target)
    }

    pub fn remove_transition(&mut self, target: &str) -> bool {
        self.transitions.remove(target)
    }

    pub fn transition(&self, target: &str) -> Option<&Transition> {
        self.transitions.get(target)
    }

    pub fn transition_mut(&mut self, target: &str) -> Option<&mut Transition> {
        self.transitions.get_mut(target)
    }

    pub fn transitions(&self) -> &TransitionSet {
        &self.transitions
    }
}

/// Pseudo-state whose transitions are checked from every active state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnyState {
    transitions: TransitionSet,
}

impl AnyState {
    pub fn add_transition(&mut self, target: impl Into<String>) -> &mut Transition {
        self.transitions.insert(target)
    }

    pub fn remove_transition(&mut self, target: &str) -> bool {
        self.transitions.remove(target)
    }

    pub fn transition(&self, target: &str) -> Option<&Transition> {
        self.transitions.get(target)
    }

    pub fn transition_mut(&mut self, target: &str) -> Option<&mut Transition> {
        self.transitions.get_mut(target)
    }

    pub fn transitions(&self) -> &TransitionSet {
        &self.transitions
    }
}
