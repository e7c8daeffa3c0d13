//! The record lifecycle hierarchy.
//!
//! ```text
//! root
//! ├─ empty
//! ├─ loading
//! ├─ loaded
//! │  ├─ saved
//! │  ├─ created { uncommitted, inFlight, invalid }
//! │  └─ updated { uncommitted, inFlight, invalid }
//! └─ deleted { uncommitted, inFlight, saved }
//! ```
//!
//! Flags such as `isDirty` are node properties resolved from the current state
//! upward, so a sub-state only declares what it overrides.

use super::data::{DirtyType, LifecycleArg, LifecycleCallback, RecordData};
use crate::builder::{BuildError, CoordinatorBuilder, StateBuilder};
use crate::coordinator::{StateCoordinator, StateError};
use crate::core::{HandlerResult, StateTree};
use serde_json::Value;

pub(crate) type Lifecycle = StateCoordinator<LifecycleArg, RecordData>;
type Handled = HandlerResult<LifecycleArg>;
type State = StateBuilder<LifecycleArg, RecordData>;

pub(crate) const LOADING_DATA: &str = "loadingData";
pub(crate) const LOADED_DATA: &str = "loadedData";
pub(crate) const PUSHED_DATA: &str = "pushedData";
pub(crate) const NOT_FOUND: &str = "notFound";
pub(crate) const DID_SET_PROPERTY: &str = "didSetProperty";
pub(crate) const DELETE_RECORD: &str = "deleteRecord";
pub(crate) const UNLOAD_RECORD: &str = "unloadRecord";
pub(crate) const ROLLBACK: &str = "rollback";
pub(crate) const WILL_COMMIT: &str = "willCommit";
pub(crate) const DID_COMMIT: &str = "didCommit";
pub(crate) const BECAME_INVALID: &str = "becameInvalid";
pub(crate) const BECAME_ERROR: &str = "becameError";

const PROPERTY_WAS_RESET: &str = "propertyWasReset";
const BECOME_DIRTY: &str = "becomeDirty";
const BECAME_VALID: &str = "becameValid";
const ROLLED_BACK: &str = "rolledBack";
const INVOKE_LIFECYCLE_CALLBACKS: &str = "invokeLifecycleCallbacks";

/// Build the lifecycle tree. The coordinator starts in `empty`.
pub(crate) fn lifecycle_tree() -> Result<StateTree<LifecycleArg, RecordData>, BuildError> {
    CoordinatorBuilder::<LifecycleArg, RecordData>::new()
        .initial_state("empty")
        .property("isEmpty", false)
        .property("isLoading", false)
        .property("isLoaded", false)
        .property("isDirty", false)
        .property("isSaving", false)
        .property("isDeleted", false)
        .property("isNew", false)
        .property("isValid", true)
        .on(ROLLED_BACK, ignore)
        .on(PROPERTY_WAS_RESET, ignore)
        .on(ROLLBACK, rollback)
        .on(INVOKE_LIFECYCLE_CALLBACKS, |coordinator, args| {
            let callback = match args.first() {
                Some(LifecycleArg::DirtyType(DirtyType::Created)) => LifecycleCallback::DidCreate,
                _ => LifecycleCallback::DidUpdate,
            };
            queue(coordinator, callback);
            queue(coordinator, LifecycleCallback::DidCommit);
            Ok(None)
        })
        .state("empty", empty())
        .state("loading", loading())
        .state("loaded", loaded())
        .state("deleted", deleted())
        .build_tree()
}

fn empty() -> State {
    State::new()
        .property("isEmpty", true)
        .transition_on(LOADING_DATA, "loading")
        .transition_on(LOADED_DATA, "loaded.created.uncommitted")
        .on(PUSHED_DATA, |coordinator, _args| {
            coordinator.transition_to("loaded.saved")?;
            queue(coordinator, LifecycleCallback::DidLoad);
            Ok(None)
        })
}

fn loading() -> State {
    State::new()
        .property("isLoading", true)
        .on(PUSHED_DATA, |coordinator, _args| {
            coordinator.transition_to("loaded.saved")?;
            queue(coordinator, LifecycleCallback::DidLoad);
            coordinator.env_mut().is_error = false;
            Ok(None)
        })
        .on(BECAME_ERROR, |coordinator, _args| {
            queue(coordinator, LifecycleCallback::BecameError);
            Ok(None)
        })
        .transition_on(NOT_FOUND, "empty")
}

fn loaded() -> State {
    State::new()
        .initial_state("saved")
        .property("isLoaded", true)
        .state("saved", saved())
        .state("created", dirty(DirtyType::Created))
        .state("updated", dirty(DirtyType::Updated))
}

fn saved() -> State {
    State::new()
        .on_setup(|coordinator, _context| {
            // Values set while a save was in flight make the record dirty again.
            if !coordinator.env().attributes.is_empty() {
                coordinator.send(BECOME_DIRTY, &[])?;
            }
            Ok(())
        })
        .on(DID_SET_PROPERTY, did_set_property)
        .on(PUSHED_DATA, ignore)
        .transition_on(BECOME_DIRTY, "updated.uncommitted")
        .transition_on(WILL_COMMIT, "updated.inFlight")
        .transition_on(DELETE_RECORD, "deleted.uncommitted")
        .transition_on(UNLOAD_RECORD, "deleted.saved")
        .on(DID_COMMIT, |coordinator, _args| {
            let args: Vec<LifecycleArg> = coordinator
                .env()
                .last_dirty_type
                .map(LifecycleArg::DirtyType)
                .into_iter()
                .collect();
            coordinator.send(INVOKE_LIFECYCLE_CALLBACKS, &args)
        })
}

/// `loaded.created` and `loaded.updated` share everything but a few exits.
fn dirty(dirty_type: DirtyType) -> State {
    let (rolled_back, deleted) = match dirty_type {
        DirtyType::Created => ("deleted.saved", "deleted.saved"),
        DirtyType::Updated | DirtyType::Deleted => ("loaded.saved", "deleted.uncommitted"),
    };

    let uncommitted = State::new()
        .on(DID_SET_PROPERTY, did_set_property)
        .on(PROPERTY_WAS_RESET, |coordinator, _args| {
            if coordinator.env().attributes.is_empty() {
                coordinator.send(ROLLED_BACK, &[])?;
            }
            Ok(None)
        })
        .on(PUSHED_DATA, ignore)
        .on(BECOME_DIRTY, ignore)
        .transition_on(WILL_COMMIT, "inFlight")
        .transition_on(ROLLED_BACK, rolled_back)
        .transition_on(DELETE_RECORD, deleted)
        .on(BECAME_INVALID, |coordinator, args| {
            store_errors(coordinator, args);
            coordinator.transition_to("invalid")?;
            Ok(None)
        });

    let in_flight = State::new()
        .property("isSaving", true)
        .on(DID_SET_PROPERTY, did_set_property)
        .on(BECOME_DIRTY, ignore)
        .on(PUSHED_DATA, ignore)
        .on(WILL_COMMIT, ignore)
        .on(DID_COMMIT, |coordinator, _args| {
            let dirty_type = dirty_type_of(coordinator);
            coordinator.transition_to("saved")?;
            let args: Vec<LifecycleArg> =
                dirty_type.map(LifecycleArg::DirtyType).into_iter().collect();
            coordinator.send(INVOKE_LIFECYCLE_CALLBACKS, &args)
        })
        .on(BECAME_INVALID, |coordinator, args| {
            store_errors(coordinator, args);
            coordinator.transition_to("invalid")?;
            coordinator.send(INVOKE_LIFECYCLE_CALLBACKS, &[])
        })
        .on(BECAME_ERROR, became_error);

    let invalid = State::new()
        .property("isValid", false)
        .transition_on(DELETE_RECORD, "deleted.uncommitted")
        .on(DID_SET_PROPERTY, |coordinator, args| {
            if let Some(LifecycleArg::Attribute(change)) = args.first() {
                let errors = &mut coordinator.env_mut().errors;
                errors.remove(&change.name);
                if errors.is_empty() {
                    coordinator.send(BECAME_VALID, &[])?;
                }
            }
            did_set_property(coordinator, args)
        })
        .on(BECOME_DIRTY, ignore)
        .on(ROLLBACK, |coordinator, _args| {
            coordinator.send(BECAME_VALID, &[])?;
            coordinator.send(ROLLBACK, &[])
        })
        .transition_on(BECAME_VALID, "uncommitted")
        .on(INVOKE_LIFECYCLE_CALLBACKS, |coordinator, _args| {
            queue(coordinator, LifecycleCallback::BecameInvalid);
            Ok(None)
        });

    State::new()
        .initial_state("uncommitted")
        .property("dirtyType", dirty_type.to_string())
        .property("isDirty", true)
        .property("isNew", dirty_type == DirtyType::Created)
        .state("uncommitted", uncommitted)
        .state("inFlight", in_flight)
        .state("invalid", invalid)
}

fn deleted() -> State {
    let uncommitted = State::new()
        .transition_on(WILL_COMMIT, "inFlight")
        .on(BECOME_DIRTY, ignore)
        .on(DELETE_RECORD, ignore)
        .transition_on(ROLLED_BACK, "loaded.saved");

    let in_flight = State::new()
        .property("isSaving", true)
        .on(WILL_COMMIT, ignore)
        .on(DID_COMMIT, |coordinator, _args| {
            coordinator.transition_to("saved")?;
            coordinator.send(INVOKE_LIFECYCLE_CALLBACKS, &[])
        })
        .on(BECAME_ERROR, became_error);

    let saved = State::new()
        .property("isDirty", false)
        .on(INVOKE_LIFECYCLE_CALLBACKS, |coordinator, _args| {
            queue(coordinator, LifecycleCallback::DidDelete);
            queue(coordinator, LifecycleCallback::DidCommit);
            Ok(None)
        });

    State::new()
        .initial_state("uncommitted")
        .property("dirtyType", DirtyType::Deleted.to_string())
        .property("isDeleted", true)
        .property("isLoaded", true)
        .property("isDirty", true)
        .state("uncommitted", uncommitted)
        .state("inFlight", in_flight)
        .state("saved", saved)
}

fn ignore(_coordinator: &mut Lifecycle, _args: &[LifecycleArg]) -> Handled {
    Ok(None)
}

fn queue(coordinator: &mut Lifecycle, callback: LifecycleCallback) {
    coordinator.env_mut().callbacks.push(callback);
}

/// Drop pending values and tell the current state about it.
fn rollback(coordinator: &mut Lifecycle, _args: &[LifecycleArg]) -> Handled {
    coordinator.env_mut().discard_changes();
    coordinator.send(ROLLED_BACK, &[])
}

fn became_error(coordinator: &mut Lifecycle, _args: &[LifecycleArg]) -> Handled {
    coordinator.transition_to("uncommitted")?;
    queue(coordinator, LifecycleCallback::BecameError);
    Ok(None)
}

/// Record a pending value, or drop it when it restores the canonical one.
fn did_set_property(coordinator: &mut Lifecycle, args: &[LifecycleArg]) -> Handled {
    let Some(LifecycleArg::Attribute(change)) = args.first() else {
        return Err(StateError::handler(format!(
            "{DID_SET_PROPERTY} expects an attribute change"
        )));
    };

    if change.is_reset() {
        coordinator.env_mut().attributes.remove(&change.name);
        coordinator.send(PROPERTY_WAS_RESET, &[])?;
    } else {
        coordinator
            .env_mut()
            .attributes
            .insert(change.name.clone(), change.value.clone());
        if change.is_change() {
            coordinator.send(BECOME_DIRTY, &[])?;
        }
    }
    Ok(None)
}

fn store_errors(coordinator: &mut Lifecycle, args: &[LifecycleArg]) {
    if let Some(LifecycleArg::Errors(errors)) = args.first() {
        coordinator.env_mut().errors = errors.clone();
    }
}

/// `dirtyType` of the current state, if it declares one.
pub(crate) fn dirty_type_of(coordinator: &Lifecycle) -> Option<DirtyType> {
    coordinator
        .property("dirtyType")
        .cloned()
        .and_then(|value: Value| serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_builds_with_expected_shape() {
        let tree = lifecycle_tree().unwrap();
        let root = tree.root();

        for path in [
            "empty",
            "loading",
            "loaded.saved",
            "loaded.created.uncommitted",
            "loaded.created.inFlight",
            "loaded.created.invalid",
            "loaded.updated.invalid",
            "deleted.uncommitted",
            "deleted.inFlight",
            "deleted.saved",
        ] {
            assert!(tree.get_state_by_path(root, path).is_some(), "missing {path}");
        }
        assert_eq!(tree.node(root).initial_state(), Some("empty"));
    }

    #[test]
    fn flags_resolve_through_ancestors() {
        let tree = lifecycle_tree().unwrap();
        let root = tree.root();
        let in_flight = tree
            .get_state_by_path(root, "loaded.created.inFlight")
            .unwrap();
        let deleted_saved = tree.get_state_by_path(root, "deleted.saved").unwrap();

        assert_eq!(tree.lookup_property(in_flight, "isSaving"), Some(&Value::Bool(true)));
        assert_eq!(tree.lookup_property(in_flight, "isNew"), Some(&Value::Bool(true)));
        assert_eq!(tree.lookup_property(in_flight, "isLoaded"), Some(&Value::Bool(true)));
        assert_eq!(
            tree.lookup_property(in_flight, "dirtyType"),
            Some(&Value::from("created"))
        );
        assert_eq!(tree.lookup_property(deleted_saved, "isDirty"), Some(&Value::Bool(false)));
        assert_eq!(tree.lookup_property(deleted_saved, "isDeleted"), Some(&Value::Bool(true)));
    }

    #[test]
    fn shortcuts_are_declared_on_states() {
        let tree = lifecycle_tree().unwrap();
        let saved = tree.get_state_by_path(tree.root(), "loaded.saved").unwrap();

        assert_eq!(
            tree.lookup_event_target(saved, BECOME_DIRTY),
            Some("updated.uncommitted")
        );
        assert_eq!(tree.lookup_event_target(saved, LOADING_DATA), None);
    }
}
