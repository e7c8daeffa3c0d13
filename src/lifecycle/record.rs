//! A persisted record driven by the lifecycle hierarchy.

use super::data::{Attributes, Errors, LifecycleArg, LifecycleCallback, RecordData};
use super::states::{self, dirty_type_of, Lifecycle};
use super::RecordFlags;
use crate::builder::BuildError;
use crate::coordinator::{CoordinatorConfig, StateCoordinator, StateError};
use crate::core::{HandlerResult, StateTree};
use crate::transition::CoordinatorId;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

type SharedLifecycle = (Rc<StateTree<LifecycleArg, RecordData>>, CoordinatorId);

thread_local! {
    static LIFECYCLE: RefCell<Option<SharedLifecycle>> = const { RefCell::new(None) };
}

/// The lifecycle tree and cache identity shared by every record on this thread.
fn shared_lifecycle() -> Result<SharedLifecycle, BuildError> {
    LIFECYCLE.with(|cell| {
        if let Some((tree, id)) = cell.borrow().as_ref() {
            return Ok((Rc::clone(tree), *id));
        }
        let shared = (Rc::new(states::lifecycle_tree()?), CoordinatorId::new());
        *cell.borrow_mut() = Some((Rc::clone(&shared.0), shared.1));
        Ok(shared)
    })
}

/// A record that tracks whether its data is loaded, dirty, saving or deleted.
///
/// The record never talks to storage itself. The owner reports storage
/// progress (`will_commit`, `did_commit`, `became_invalid`, ...) and drains
/// the notifications the record queues with [`take_callbacks`](Self::take_callbacks).
///
/// Every method that moves the record is an event sent to its current state.
/// Events the state does not accept fail with [`StateError::UnhandledEvent`],
/// e.g. setting an attribute on a record that is still loading.
///
/// # Example
///
/// ```rust
/// use statetree::lifecycle::{LifecycleCallback, Record};
/// use serde_json::json;
///
/// let mut record = Record::create().unwrap();
/// record.set("title", json!("Draft")).unwrap();
/// assert!(record.flags().is_new);
///
/// record.will_commit().unwrap();
/// assert!(record.flags().is_saving);
///
/// record.did_commit(None).unwrap();
/// assert_eq!(record.state_path(), "loaded.saved");
/// assert_eq!(
///     record.take_callbacks(),
///     vec![LifecycleCallback::DidCreate, LifecycleCallback::DidCommit]
/// );
/// ```
pub struct Record {
    coordinator: Lifecycle,
}

impl Record {
    /// A record with no data, in `empty`.
    pub fn new() -> Result<Self, BuildError> {
        let (tree, id) = shared_lifecycle()?;
        let coordinator = StateCoordinator::with_id(
            tree,
            CoordinatorConfig::default(),
            RecordData::default(),
            id,
        )?;
        Ok(Self { coordinator })
    }

    /// A record created locally and not yet saved.
    pub fn create() -> Result<Self, BuildError> {
        let mut record = Self::new()?;
        record.send(states::LOADED_DATA, &[])?;
        Ok(record)
    }

    /// Storage started fetching the record.
    pub fn load(&mut self) -> Result<(), StateError> {
        self.send(states::LOADING_DATA, &[]).map(drop)
    }

    /// Storage delivered canonical data. Rejected while the record is
    /// deleted or invalid, leaving the canonical data as it was.
    pub fn push(&mut self, data: Attributes) -> Result<(), StateError> {
        self.send(states::PUSHED_DATA, &[])?;
        self.coordinator.env_mut().data = data;
        Ok(())
    }

    pub fn not_found(&mut self) -> Result<(), StateError> {
        self.send(states::NOT_FOUND, &[]).map(drop)
    }

    /// Current value of an attribute: pending, then in flight, then canonical.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.coordinator.env().get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), StateError> {
        let change = self.coordinator.env().change_for(name, value);
        self.send(states::DID_SET_PROPERTY, &[LifecycleArg::Attribute(change)])
            .map(drop)
    }

    /// Name to `(canonical, pending)` for every unsaved attribute.
    pub fn changed_attributes(&self) -> BTreeMap<String, (Option<Value>, Value)> {
        self.coordinator.env().changed_attributes()
    }

    pub fn delete(&mut self) -> Result<(), StateError> {
        self.send(states::DELETE_RECORD, &[]).map(drop)
    }

    pub fn unload(&mut self) -> Result<(), StateError> {
        self.send(states::UNLOAD_RECORD, &[]).map(drop)
    }

    /// Discard unsaved changes.
    pub fn rollback(&mut self) -> Result<(), StateError> {
        self.send(states::ROLLBACK, &[]).map(drop)
    }

    /// A save started: pending values move in flight.
    ///
    /// The data layers only change once the current state accepts the save.
    pub fn will_commit(&mut self) -> Result<(), StateError> {
        let dirty_type = dirty_type_of(&self.coordinator);
        self.send(states::WILL_COMMIT, &[])?;

        let data = self.coordinator.env_mut();
        data.last_dirty_type = dirty_type;
        data.begin_commit();
        Ok(())
    }

    /// The save finished. `saved` replaces the canonical data when storage
    /// returned any; otherwise the in-flight values become canonical.
    pub fn did_commit(&mut self, saved: Option<Attributes>) -> Result<(), StateError> {
        self.send(states::DID_COMMIT, &[])?;
        self.coordinator.env_mut().finish_commit(saved);
        Ok(())
    }

    /// Storage rejected the record with per-attribute messages.
    pub fn became_invalid(&mut self, errors: Errors) -> Result<(), StateError> {
        self.send(states::BECAME_INVALID, &[LifecycleArg::Errors(errors)])
            .map(drop)
    }

    /// Storage failed for a reason unrelated to the record's data.
    pub fn became_error(&mut self) -> Result<(), StateError> {
        self.send(states::BECAME_ERROR, &[])?;
        self.coordinator.env_mut().is_error = true;
        Ok(())
    }

    /// Send a raw lifecycle event.
    pub fn send(&mut self, event: &str, args: &[LifecycleArg]) -> HandlerResult<LifecycleArg> {
        debug!(event, state = %self.state_path(), "record event");
        self.coordinator.send(event, args)
    }

    pub fn flags(&self) -> RecordFlags {
        let flag = |key: &str| {
            self.coordinator
                .property(key)
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };
        RecordFlags {
            is_empty: flag("isEmpty"),
            is_loading: flag("isLoading"),
            is_loaded: flag("isLoaded"),
            is_dirty: flag("isDirty"),
            is_saving: flag("isSaving"),
            is_deleted: flag("isDeleted"),
            is_new: flag("isNew"),
            is_valid: flag("isValid"),
            is_error: self.coordinator.env().is_error,
            dirty_type: dirty_type_of(&self.coordinator),
        }
    }

    /// Path of the current lifecycle state, e.g. `loaded.updated.inFlight`.
    pub fn state_path(&self) -> String {
        self.coordinator.current_path().unwrap_or_default()
    }

    pub fn errors(&self) -> &Errors {
        &self.coordinator.env().errors
    }

    pub fn data(&self) -> &RecordData {
        self.coordinator.env()
    }

    /// Drain queued lifecycle notifications, oldest first.
    pub fn take_callbacks(&mut self) -> Vec<LifecycleCallback> {
        std::mem::take(&mut self.coordinator.env_mut().callbacks)
    }

    pub fn coordinator(&self) -> &Lifecycle {
        &self.coordinator
    }
}
