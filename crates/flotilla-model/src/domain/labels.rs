use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{LABEL_MANAGED, LABEL_SERVICE, LABEL_STACK, MANAGED_VALUE};

/// Container labels based on [`BTreeMap`].
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(pub BTreeMap<String, String>);

impl Labels {
    /// Create an empty set of labels.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Selector matching every container of a stack.
    pub fn stack(stack: &str) -> Self {
        let mut labels = Self::new();
        labels.insert(LABEL_STACK, stack);
        labels
    }

    /// Selector matching every container of one service of a stack.
    pub fn service(stack: &str, service: &str) -> Self {
        let mut labels = Self::stack(stack);
        labels.insert(LABEL_SERVICE, service);
        labels
    }

    /// Full label set stamped on a container created for `service`.
    pub fn managed(stack: &str, service: &str) -> Self {
        let mut labels = Self::service(stack, service);
        labels.insert(LABEL_MANAGED, MANAGED_VALUE);
        labels
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Insert or overwrite a label.
    ///
    /// Returns `self` for chaining.
    pub fn insert<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.insert(key.into(), val.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    /// Iterate through all labels as `(&str, &str)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if every label of `selector` is present here with the same value.
    pub fn matches(&self, selector: &Labels) -> bool {
        selector.iter().all(|(k, v)| self.get(k) == Some(v))
    }
}
