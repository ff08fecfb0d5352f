use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::KeyValue;

/// Environment passed to a container.
///
/// Stored as an ordered list of key–value pairs and serialized as a transparent array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(pub Vec<KeyValue>);

impl Env {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build the environment of a service.
    ///
    /// Entries without a value mean "inherit, do not set" and are dropped.
    pub fn from_service(environment: &BTreeMap<String, Option<String>>) -> Self {
        Self(
            environment
                .iter()
                .filter_map(|(k, v)| v.as_ref().map(|v| KeyValue::new(k.as_str(), v.as_str())))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the environment is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all key–value pairs.
    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Get the value for a key, returning the last matching entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    /// Append a key–value pair.
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }

    /// Render every pair as `KEY=VALUE`.
    pub fn render(&self) -> Vec<String> {
        self.0.iter().map(KeyValue::render).collect()
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
