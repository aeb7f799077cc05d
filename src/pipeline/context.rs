//! Substitution values fed into prompt templates.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Ordered `field name -> text` map used when rendering a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionContext {
    values: BTreeMap<String, String>,
}

impl SubstitutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a context from an arbitrary JSON object.
    ///
    /// Strings are taken verbatim, `null` becomes an empty string and every
    /// other value is kept as compact JSON text.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut ctx = Self::new();
        ctx.merge_json(map);
        ctx
    }

    /// Merge a JSON object into this context, overwriting existing names.
    pub fn merge_json(&mut self, map: &Map<String, Value>) {
        for (name, value) in map {
            self.insert(name.clone(), json_to_text(value));
        }
    }
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
