//! Values carried by the record lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute name to value.
pub type Attributes = BTreeMap<String, Value>;

/// Attribute name to validation message.
pub type Errors = BTreeMap<String, String>;

/// Kind of unsaved change a dirty record carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirtyType {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for DirtyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DirtyType::Created => "created",
            DirtyType::Updated => "updated",
            DirtyType::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// A single attribute assignment, as seen by the state that receives it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub name: String,
    pub value: Value,
    /// Value visible before the assignment: pending, in flight or canonical.
    pub old_value: Option<Value>,
    /// Canonical value last acknowledged by storage.
    pub original_value: Option<Value>,
}

impl AttributeChange {
    /// Whether the assignment restores the canonical value.
    pub fn is_reset(&self) -> bool {
        self.original_value.as_ref() == Some(&self.value)
    }

    pub fn is_change(&self) -> bool {
        self.old_value.as_ref() != Some(&self.value)
    }
}

/// Argument passed along with a lifecycle event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LifecycleArg {
    Attribute(AttributeChange),
    Errors(Errors),
    DirtyType(DirtyType),
}

/// Notification queued for the owner of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleCallback {
    DidLoad,
    DidCreate,
    DidUpdate,
    DidDelete,
    DidCommit,
    BecameInvalid,
    BecameError,
}

/// Everything a record owns besides its position in the lifecycle.
///
/// Reads go through three layers: pending `attributes` shadow `in_flight`
/// values, which shadow the canonical `data`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    pub data: Attributes,
    pub attributes: Attributes,
    pub in_flight: Attributes,
    pub errors: Errors,
    pub last_dirty_type: Option<DirtyType>,
    pub is_error: bool,
    pub callbacks: Vec<LifecycleCallback>,
}

impl RecordData {
    /// Current value of `name` across the three layers.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes
            .get(name)
            .or_else(|| self.in_flight.get(name))
            .or_else(|| self.data.get(name))
    }

    /// Describe assigning `value` to `name` without applying it.
    pub fn change_for(&self, name: &str, value: Value) -> AttributeChange {
        AttributeChange {
            name: name.to_string(),
            old_value: self.get(name).cloned(),
            original_value: self.data.get(name).cloned(),
            value,
        }
    }

    /// Start saving: pending values move in flight, joining any values a
    /// failed or still running save left there.
    pub fn begin_commit(&mut self) {
        let pending = std::mem::take(&mut self.attributes);
        self.in_flight.extend(pending);
    }

    /// Finish saving. Storage may answer with a replacement for the canonical
    /// data; otherwise the in-flight values are merged into it.
    pub fn finish_commit(&mut self, saved: Option<Attributes>) {
        self.is_error = false;
        let in_flight = std::mem::take(&mut self.in_flight);
        match saved {
            Some(saved) => self.data = saved,
            None => self.data.extend(in_flight),
        }
    }

    /// Discard pending values, and in-flight ones after a failed save.
    pub fn discard_changes(&mut self) {
        self.attributes.clear();
        if self.is_error {
            self.in_flight.clear();
            self.is_error = false;
        }
    }

    /// Name to `(canonical, pending)` for every pending attribute.
    pub fn changed_attributes(&self) -> BTreeMap<String, (Option<Value>, Value)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.clone(), (self.data.get(name).cloned(), value.clone())))
            .collect()
    }
}
