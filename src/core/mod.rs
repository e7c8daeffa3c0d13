//! Core state hierarchy types.
//!
//! This module contains the data side of the engine:
//! - `StateNode`: one named state with its handlers and properties
//! - `StateTree`: the arena owning a whole hierarchy, with path lookups
//! - `StateHistory`: immutable record of executed transitions
//!
//! Nothing here mutates a coordinator; the transition algorithm lives in
//! [`crate::transition`] and the orchestration in [`crate::coordinator`].

mod history;
mod node;
mod tree;

pub use history::{StateHistory, StateTransition};
pub use node::{
    action, unhandled_action, Action, HandlerResult, StateId, StateNode, UnhandledAction,
    DEFAULT_INITIAL_STATE, DEFAULT_TRANSITION_EVENT, ENTER_EVENT, EXIT_EVENT,
};
pub use tree::{Ancestors, StateTree};
