use crate::core::StateId;
use serde::{Deserialize, Serialize};

/// Structural part of a transition: which states to leave and enter.
///
/// Context values play no part in it, which is what makes it cacheable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPlan {
    /// States to exit, outermost first; executed in reverse.
    pub exit_states: Vec<StateId>,
    /// States to enter, outermost first.
    pub enter_states: Vec<StateId>,
    /// Common ancestor at which the exit and enter chains diverge.
    pub resolve_state: StateId,
}

impl TransitionPlan {
    /// A plan that neither exits nor enters anything.
    pub fn is_noop(&self) -> bool {
        self.exit_states.is_empty() && self.enter_states.is_empty()
    }
}

/// Counters kept by a coordinator about plan resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerStats {
    /// Plans computed from the tree.
    pub computed: usize,
    /// Plans served from a node's cache.
    pub cache_hits: usize,
}
