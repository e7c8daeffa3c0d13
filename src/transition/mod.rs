//! The transition algorithm.
//!
//! A call to `transition_to` goes through two stages:
//!
//! 1. [`TransitionPlanner`] turns the current state and a target path into a
//!    structural [`TransitionPlan`] (states to exit, states to enter, and the
//!    common ancestor), memoized per node in a [`PathCache`].
//! 2. [`Transition::normalize`] binds the caller's contexts to the entered
//!    states, appends initial sub-states and trims re-entries whose context
//!    did not change.
//!
//! Neither stage fires hooks; executing the result is the coordinator's job.

mod binder;
mod cache;
mod plan;
mod planner;

pub use binder::{Binding, Transition};
pub use cache::{CoordinatorId, PathCache};
pub use plan::{PlannerStats, TransitionPlan};
pub use planner::TransitionPlanner;
