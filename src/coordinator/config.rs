//! Coordinator configuration.

use crate::builder::BuildError;
use crate::core::DEFAULT_TRANSITION_EVENT;
use serde::{Deserialize, Serialize};

/// Options controlling how a coordinator dispatches and reports.
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```rust
/// use statetree::coordinator::CoordinatorConfig;
///
/// let config = CoordinatorConfig::from_json(r#"{ "enableLogging": true }"#).unwrap();
/// assert!(config.enable_logging);
/// assert!(config.error_on_unhandled_event);
/// assert_eq!(config.transition_event, "setup");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoordinatorConfig {
    /// Fail `send` with `UnhandledEvent` when nothing handles the event.
    pub error_on_unhandled_event: bool,
    /// Emit `info!` events for entered and exited states and dispatched events.
    pub enable_logging: bool,
    /// Event fired on each entered state together with its bound context.
    pub transition_event: String,
    /// Most transitions kept in the coordinator's history; `None` keeps all.
    pub history_limit: Option<usize>,
}

impl CoordinatorConfig {
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            error_on_unhandled_event: true,
            enable_logging: false,
            transition_event: DEFAULT_TRANSITION_EVENT.to_string(),
            history_limit: None,
        }
    }
}
