//! Builder for a coordinator and the hierarchy it runs.

use crate::builder::error::BuildError;
use crate::builder::state::StateBuilder;
use crate::coordinator::{CoordinatorConfig, StateCoordinator};
use crate::core::{HandlerResult, StateTree};
use crate::transition::CoordinatorId;
use serde_json::Value;
use std::rc::Rc;

/// Builder for a [`StateCoordinator`] with a fluent API.
///
/// The builder doubles as the root state: `state`, `on` and `initial_state`
/// configure the coordinator-level node.
pub struct CoordinatorBuilder<C, E = ()> {
    root: StateBuilder<C, E>,
    config: CoordinatorConfig,
    id: Option<CoordinatorId>,
}

impl<C: Clone + PartialEq + 'static, E: 'static> CoordinatorBuilder<C, E> {
    pub fn new() -> Self {
        Self {
            root: StateBuilder::new(),
            config: CoordinatorConfig::default(),
            id: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn error_on_unhandled_event(mut self, enabled: bool) -> Self {
        self.config.error_on_unhandled_event = enabled;
        self
    }

    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Event fired with each entered state's context; `on_setup` hooks
    /// are registered under it.
    pub fn transition_event(mut self, event: impl Into<String>) -> Self {
        self.config.transition_event = event.into();
        self
    }

    /// Keep at most `limit` transitions in the history; `None` keeps all.
    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Share cached plans with other coordinators built with the same id.
    pub fn id(mut self, id: CoordinatorId) -> Self {
        self.id = Some(id);
        self
    }

    /// State entered when the coordinator is built.
    pub fn initial_state(mut self, name: impl Into<String>) -> Self {
        self.root = self.root.initial_state(name);
        self
    }

    pub fn state(mut self, name: impl Into<String>, child: StateBuilder<C, E>) -> Self {
        self.root = self.root.state(name, child);
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.root = self.root.property(key, value);
        self
    }

    /// Handle `event` at the coordinator level, after every state declined it.
    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut StateCoordinator<C, E>, &[C]) -> HandlerResult<C> + 'static,
    {
        self.root = self.root.on(event, handler);
        self
    }

    pub fn on_unhandled<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut StateCoordinator<C, E>, &str, &[C]) -> HandlerResult<C> + 'static,
    {
        self.root = self.root.on_unhandled(handler);
        self
    }

    /// Build only the hierarchy, for sharing between several coordinators
    /// configured with the same transition event.
    pub fn build_tree(self) -> Result<StateTree<C, E>, BuildError> {
        self.root.build_tree_for(&self.config.transition_event)
    }

    /// Build the hierarchy and a coordinator over it, entering the initial state.
    pub fn build(self, env: E) -> Result<StateCoordinator<C, E>, BuildError> {
        let tree = Rc::new(self.root.build_tree_for(&self.config.transition_event)?);
        let id = self.id.unwrap_or_default();
        Ok(StateCoordinator::with_id(tree, self.config, env, id)?)
    }
}

impl<C: Clone + PartialEq + 'static, E: 'static> Default for CoordinatorBuilder<C, E> {
    fn default() -> Self {
        Self::new()
    }
}
