//! Study task records and the payloads that create and change them.
//!
//! The store holds a task as a JSON object with camelCase keys:
//!
//! ```json
//! { "subject": "Math", "time": "10:00 - 11:00", "goal": "Algebra",
//!   "day": "Monday", "completed": false, "createdAt": 1700000000000 }
//! ```
//!
//! The record id is not part of the value; it is the key the record sits
//! under in the per-user collection.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::weekday::Weekday;

/// Store-assigned key of a record. Opaque and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a key string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a stored value could not be read back as a [`Task`].
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The value did not have the shape of a task record.
    #[error("record {id} is malformed: {source}")]
    Malformed {
        /// Key of the offending record.
        id: RecordId,
        /// Underlying decode error.
        source: serde_json::Error,
    },
}

/// Wire shape of a stored record. Missing optional fields take their
/// defaults; `createdAt` missing reads as `0`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    goal: String,
    day: Weekday,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    created_at: i64,
    #[serde(default)]
    updated_at: Option<i64>,
}

/// A study task as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Key the record is stored under.
    pub id: RecordId,
    /// What is being studied.
    pub subject: String,
    /// Free-text time slot, e.g. `"10:00 - 11:00"`.
    pub time: String,
    /// What the session should achieve.
    pub goal: String,
    /// Day the task is filed under.
    pub day: Weekday,
    /// Whether the task has been ticked off.
    pub completed: bool,
    /// Creation time in epoch milliseconds (`0` if the record lacks one).
    pub created_at: i64,
    /// Last edit time in epoch milliseconds.
    pub updated_at: Option<i64>,
}

impl Task {
    /// Decode a stored value found under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Malformed`] if the value is not a task object or
    /// its `day` is not a weekday name.
    pub fn decode(id: RecordId, value: &Value) -> Result<Self, RecordError> {
        let stored = StoredTask::deserialize(value)
            .map_err(|source| RecordError::Malformed { id: id.clone(), source })?;
        Ok(Self {
            id,
            subject: stored.subject,
            time: stored.time,
            goal: stored.goal,
            day: stored.day,
            completed: stored.completed,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

/// The user-entered part of a task, used for both add and edit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    /// What is being studied.
    pub subject: String,
    /// Time slot text.
    pub time: String,
    /// Session goal.
    pub goal: String,
}

impl TaskDraft {
    /// Build a draft from raw input, trimming every field.
    #[must_use]
    pub fn new(subject: &str, time: &str, goal: &str) -> Self {
        Self {
            subject: subject.trim().to_string(),
            time: time.trim().to_string(),
            goal: goal.trim().to_string(),
        }
    }

    /// Whether any required field is empty.
    #[must_use]
    pub fn has_empty_field(&self) -> bool {
        self.subject.is_empty() || self.time.is_empty() || self.goal.is_empty()
    }

    /// Value for a freshly added record: not completed, created now.
    #[must_use]
    pub fn into_new_record(self, day: Weekday, created_at: i64) -> Value {
        let mut record = Map::new();
        record.insert("subject".into(), Value::from(self.subject));
        record.insert("time".into(), Value::from(self.time));
        record.insert("goal".into(), Value::from(self.goal));
        record.insert("day".into(), Value::from(day.name()));
        record.insert("completed".into(), Value::Bool(false));
        record.insert("createdAt".into(), Value::from(created_at));
        Value::Object(record)
    }
}

/// A partial update. Only the fields that are `Some` are written; the rest of
/// the record, including `createdAt`, is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPatch {
    /// New subject.
    pub subject: Option<String>,
    /// New time slot.
    pub time: Option<String>,
    /// New goal.
    pub goal: Option<String>,
    /// New day.
    pub day: Option<Weekday>,
    /// New completion flag.
    pub completed: Option<bool>,
    /// Edit timestamp.
    pub updated_at: Option<i64>,
}

impl TaskPatch {
    /// Patch written by an edit-save: the draft fields, the day, and the edit
    /// time.
    #[must_use]
    pub fn edit(draft: TaskDraft, day: Weekday, updated_at: i64) -> Self {
        Self {
            subject: Some(draft.subject),
            time: Some(draft.time),
            goal: Some(draft.goal),
            day: Some(day),
            completed: None,
            updated_at: Some(updated_at),
        }
    }

    /// Single-field patch for the completion checkbox.
    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// The JSON object of fields to merge into the stored record.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(subject) = &self.subject {
            fields.insert("subject".into(), Value::from(subject.as_str()));
        }
        if let Some(time) = &self.time {
            fields.insert("time".into(), Value::from(time.as_str()));
        }
        if let Some(goal) = &self.goal {
            fields.insert("goal".into(), Value::from(goal.as_str()));
        }
        if let Some(day) = self.day {
            fields.insert("day".into(), Value::from(day.name()));
        }
        if let Some(completed) = self.completed {
            fields.insert("completed".into(), Value::from(completed));
        }
        if let Some(updated_at) = self.updated_at {
            fields.insert("updatedAt".into(), Value::from(updated_at));
        }
        fields
    }
}
