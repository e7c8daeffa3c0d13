//! Per-node memoization of structural transition plans.

use super::plan::TransitionPlan;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Opaque identity token a coordinator uses to key its cached plans.
///
/// Coordinators that share a tree may also share a token: the structural plan
/// only depends on tree shape and the starting node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinatorId(Uuid);

impl CoordinatorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CoordinatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CoordinatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Cache of plans keyed by coordinator identity, then target path.
///
/// Entries are never invalidated. The tree is frozen after construction, so a
/// plan computed once for `(node, coordinator, path)` stays correct.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: RefCell<HashMap<CoordinatorId, HashMap<String, TransitionPlan>>>,
}

impl PathCache {
    pub fn get(&self, owner: CoordinatorId, path: &str) -> Option<TransitionPlan> {
        self.entries
            .borrow()
            .get(&owner)
            .and_then(|plans| plans.get(path))
            .cloned()
    }

    pub fn insert(&self, owner: CoordinatorId, path: &str, plan: TransitionPlan) {
        self.entries
            .borrow_mut()
            .entry(owner)
            .or_default()
            .insert(path.to_string(), plan);
    }

    /// Number of paths cached for `owner`.
    pub fn len(&self, owner: CoordinatorId) -> usize {
        self.entries
            .borrow()
            .get(&owner)
            .map_or(0, HashMap::len)
    }
}
