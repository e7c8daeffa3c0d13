//! Runtime errors raised by transitions and event dispatch.

use thiserror::Error;

/// Errors that can occur while a coordinator transitions or dispatches events.
///
/// None of them are retried internally. A handler that fails aborts the
/// remaining hooks of the transition it runs in; already-fired hooks are not
/// rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Could not find state for path '{path}' from state '{from}'")]
    UnknownPath { path: String, from: String },

    #[error("Cannot match all contexts to states for path '{path}': {unmatched} left over")]
    ContextOverflow { path: String, unmatched: usize },

    #[error("Could not respond to event '{event}' in state '{state}'")]
    UnhandledEvent { event: String, state: String },

    #[error("Cannot send event '{event}' before a state has been entered")]
    NotStarted { event: String },

    #[error("Handler failed: {0}")]
    Handler(String),
}

impl StateError {
    /// Build a [`StateError::Handler`] from any displayable failure.
    pub fn handler(reason: impl std::fmt::Display) -> Self {
        StateError::Handler(reason.to_string())
    }
}
