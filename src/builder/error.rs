//! Errors raised while assembling a hierarchy.

use crate::coordinator::StateError;
use crate::core::StateId;
use thiserror::Error;

/// Errors that can occur when building a state tree or coordinator.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("State '{parent}' already has a child named '{name}'")]
    DuplicateName { parent: String, name: String },

    #[error("Invalid state name '{0}': names must be non-empty and contain no '.'")]
    InvalidName(String),

    #[error("State {0} does not belong to this tree")]
    UnknownParent(StateId),

    #[error("Initial state '{initial}' of '{state}' is not one of its children")]
    UnknownInitialState { state: String, initial: String },

    #[error("Entering the initial state failed: {0}")]
    InitialTransition(#[from] StateError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
