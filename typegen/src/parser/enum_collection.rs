//! Case-insensitive store of enum type labels

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Enum labels keyed by lower-cased qualified type name (e.g. "public.status").
///
/// Labels are case-sensitive and returned sorted, since catalogs do not
/// guarantee a stable label order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumCollection {
    enums: BTreeMap<String, Vec<String>>,
}

impl EnumCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the labels for `key`
    pub fn set(&mut self, key: &str, labels: Vec<String>) {
        self.enums.insert(key.to_lowercase(), labels);
    }

    /// Append one label to `key`, creating the entry if needed
    pub fn add(&mut self, key: &str, label: impl Into<String>) {
        self.enums
            .entry(key.to_lowercase())
            .or_default()
            .push(label.into());
    }

    /// Labels for `key` in ascending order
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        self.enums.get(&key.to_lowercase()).map(|labels| {
            let mut labels = labels.clone();
            labels.sort();
            labels
        })
    }

    pub fn has(&self, key: &str) -> bool {
        self.enums.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}
