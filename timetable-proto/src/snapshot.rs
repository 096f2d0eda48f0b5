//! Point-in-time views of a store node.

use serde_json::Value;

use crate::path::StorePath;
use crate::task::{RecordId, Task};

/// What a node held at one moment, as delivered by a subscription or a
/// one-shot read.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    path: StorePath,
    value: Option<Value>,
}

impl Snapshot {
    /// Wrap the value found at `path`. A JSON `null` counts as absent.
    #[must_use]
    pub fn new(path: StorePath, value: Option<Value>) -> Self {
        let value = value.filter(|v| !v.is_null());
        Self { path, value }
    }

    /// Snapshot of a node that holds nothing.
    #[must_use]
    pub const fn empty(path: StorePath) -> Self {
        Self { path, value: None }
    }

    /// Path the snapshot was taken at.
    #[must_use]
    pub const fn path(&self) -> &StorePath {
        &self.path
    }

    /// Whether the node holds any data.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// Raw value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Child entries in store order. Empty for leaves and missing nodes.
    pub fn records(&self) -> impl Iterator<Item = (RecordId, &Value)> {
        self.value
            .as_ref()
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (RecordId::new(k.as_str()), v)))
    }

    /// Every child that decodes as a task, in store order. Children that do
    /// not decode are skipped.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.records()
            .filter_map(|(id, value)| match Task::decode(id, value) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(path = %self.path, error = %e, "skipping undecodable record");
                    None
                }
            })
            .collect()
    }
}
