//! Typed parameter storage.
//!
//! Every parameter carries its kind as the discriminant of [`ParamValue`],
//! so conditions dispatch with a single `match` instead of probing types.

use crate::error::{CoreError, EntryKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of a parameter, fixed when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Scalar,
    Integer,
    Boolean,
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParamKind::Scalar => "float",
            ParamKind::Integer => "int",
            ParamKind::Boolean => "bool",
        };
        f.write_str(s)
    }
}

/// A parameter value.
///
/// Serialized externally tagged, e.g. `{"float": 1.5}` or `{"bool": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    #[serde(rename = "float")]
    Scalar(f32),
    #[serde(rename = "int")]
    Integer(i32),
    #[serde(rename = "bool")]
    Boolean(bool),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Scalar(_) => ParamKind::Scalar,
            ParamValue::Integer(_) => ParamKind::Integer,
            ParamValue::Boolean(_) => ParamKind::Boolean,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ParamValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Scalar(v) => write!(f, "{}", v),
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Boolean(v)
    }
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: ParamValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> ParamValue {
        self.value
    }

    pub fn kind(&self) -> ParamKind {
        self.value.kind()
    }
}

/// Parameters indexed by name.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: HashMap<String, Parameter>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new parameter.
    ///
    /// An existing parameter with the same name is left untouched and
    /// `DuplicateKey` is returned.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Result<&Parameter, CoreError> {
        let name = name.into();
        if self.params.contains_key(&name) {
            tracing::warn!("parameter '{}' already exists, keeping stored value", name);
            return Err(CoreError::duplicate(EntryKind::Parameter, name));
        }

        let param = Parameter::new(name.clone(), value);
        Ok(self.params.entry(name).or_insert(param))
    }

    /// Looks up a parameter by name.
    pub fn get(&self, name: &str) -> Result<&Parameter, CoreError> {
        self.params
            .get(name)
            .ok_or_else(|| CoreError::not_found(EntryKind::Parameter, name))
    }

    /// Overwrites the value of an existing parameter.
    ///
    /// The new value must be of the kind the parameter was created with.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), CoreError> {
        let value = value.into();
        let Some(param) = self.params.get_mut(name) else {
            tracing::warn!("cannot set unknown parameter '{}'", name);
            return Err(CoreError::not_found(EntryKind::Parameter, name));
        };

        if param.kind() != value.kind() {
            tracing::warn!(
                "cannot set parameter '{}' of kind {} to a {} value",
                name,
                param.kind(),
                value.kind()
            );
            return Err(CoreError::KindMismatch {
                name: name.to_string(),
                expected: param.kind(),
                actual: value.kind(),
            });
        }

        param.value = value;
        Ok(())
    }

    /// Removes a parameter, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.params.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates parameters in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    /// Returns parameters sorted by name, for display.
    pub fn sorted(&self) -> Vec<&Parameter> {
        let mut params: Vec<_> = self.params.values().collect();
        params.sort_by(|a, b| a.name.cmp(&b.name));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut store = ParameterStore::new();
        store.add("Speed", 5.0f32).unwrap();
        store.add("Jumps", 2).unwrap();
        store.add("IsMoving", false).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("Speed").unwrap().value(), ParamValue::Scalar(5.0));
        assert_eq!(store.get("Jumps").unwrap().kind(), ParamKind::Integer);
        assert_eq!(store.get("IsMoving").unwrap().value().as_bool(), Some(false));
    }

    #[test]
    fn test_duplicate_add_keeps_value() {
        let mut store = ParameterStore::new();
        store.add("Speed", 5.0f32).unwrap();

        let result = store.add("Speed", 9.0f32);
        assert!(matches!(result, Err(CoreError::DuplicateKey { .. })));

        // Different kind is rejected the same way
        let result = store.add("Speed", true);
        assert!(matches!(result, Err(CoreError::DuplicateKey { .. })));

        assert_eq!(store.get("Speed").unwrap().value(), ParamValue::Scalar(5.0));
    }

    #[test]
    fn test_get_missing() {
        let store = ParameterStore::new();
        let result = store.get("Foo");
        assert!(matches!(
            result,
            Err(CoreError::NotFound {
                kind: EntryKind::Parameter,
                ..
            })
        ));
    }

    #[test]
    fn test_set() {
        let mut store = ParameterStore::new();
        store.add("Speed", 0.0f32).unwrap();
        store.set("Speed", 12.5f32).unwrap();
        assert_eq!(store.get("Speed").unwrap().value().as_f32(), Some(12.5));
    }

    #[test]
    fn test_set_kind_mismatch() {
        let mut store = ParameterStore::new();
        store.add("Speed", 0.0f32).unwrap();

        let result = store.set("Speed", 3);
        assert!(matches!(
            result,
            Err(CoreError::KindMismatch {
                expected: ParamKind::Scalar,
                actual: ParamKind::Integer,
                ..
            })
        ));
        assert_eq!(store.get("Speed").unwrap().value().as_f32(), Some(0.0));
    }

    #[test]
    fn test_set_missing() {
        let mut store = ParameterStore::new();
        assert!(matches!(
            store.set("Foo", true),
            Err(CoreError::NotFound { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut store = ParameterStore::new();
        store.add("IsMoving", true).unwrap();
        assert!(store.remove("IsMoving"));
        assert!(!store.remove("IsMoving"));
        assert!(!store.contains("IsMoving"));
    }

    #[test]
    fn test_sorted() {
        let mut store = ParameterStore::new();
        store.add("b", 1).unwrap();
        store.add("a", 2).unwrap();
        store.add("c", 3).unwrap();
        let names: Vec<_> = store.sorted().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_value_serde() {
        let json = serde_json::to_value(ParamValue::Scalar(1.5)).unwrap();
        assert_eq!(json, serde_json::json!({"float": 1.5}));

        let value: ParamValue = serde_json::from_value(serde_json::json!({"int": 3})).unwrap();
        assert_eq!(value, ParamValue::Integer(3));

        let value: ParamValue = serde_json::from_value(serde_json::json!({"bool": true})).unwrap();
        assert_eq!(value, ParamValue::Boolean(true));
    }
}
