//! State transition history tracking.
//!
//! Tracks the transitions a coordinator has executed, recorded by state path
//! so the history is independent of any one tree. A history may be bounded,
//! in which case only the most recent transitions are kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single executed transition.
///
/// # Example
///
/// ```rust
/// use statetree::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: Some("poweredDown".to_string()),
///     to: "poweredUp.mobile".to_string(),
///     exited: vec!["poweredDown".to_string()],
///     entered: vec!["poweredUp".to_string(), "poweredUp.mobile".to_string()],
///     timestamp: Utc::now(),
/// };
/// assert!(transition.changed());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Path of the current state before the transition, `None` for the first one
    pub from: Option<String>,
    /// Path of the current state after the transition
    pub to: String,
    /// Paths of the exited states, in the order their `exit` hooks fired
    pub exited: Vec<String>,
    /// Paths of the entered states, in the order their `enter` hooks fired
    pub entered: Vec<String>,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

impl StateTransition {
    /// Whether any state was exited or entered.
    pub fn changed(&self) -> bool {
        !self.exited.is_empty() || !self.entered.is_empty()
    }
}

/// Ordered history of executed transitions, oldest first.
///
/// `record` returns a new history with the transition added and leaves the
/// original untouched; `push` appends in place. With a limit, the oldest
/// transitions are dropped once it is reached.
///
/// # Example
///
/// ```rust
/// use statetree::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new();
/// let history = history.record(StateTransition {
///     from: None,
///     to: "start".to_string(),
///     exited: vec![],
///     entered: vec!["start".to_string()],
///     timestamp: Utc::now(),
/// });
/// let history = history.record(StateTransition {
///     from: Some("start".to_string()),
///     to: "done".to_string(),
///     exited: vec!["start".to_string()],
///     entered: vec!["done".to_string()],
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec!["start", "done"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

impl StateHistory {
    /// Create a new empty, unbounded history.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Create a history keeping at most `limit` transitions; `None` keeps all.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            transitions: VecDeque::new(),
            limit,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Record a transition, returning a new history.
    ///
    /// The existing history is left untouched.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut history = self.clone();
        history.push(transition);
        history
    }

    /// Append a transition, dropping the oldest ones beyond the limit.
    pub fn push(&mut self, transition: StateTransition) {
        self.transitions.push_back(transition);
        if let Some(limit) = self.limit {
            let excess = self.transitions.len().saturating_sub(limit);
            self.transitions.drain(..excess);
        }
    }

    /// Paths of the states the coordinator settled on, in order.
    ///
    /// Starts with the `from` of the oldest kept transition when there was one.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(from) = self.transitions.front().and_then(|t| t.from.as_deref()) {
            path.push(from);
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    /// Time between the first and last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &VecDeque<StateTransition> {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
