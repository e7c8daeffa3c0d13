//! The root-level owner of a running hierarchy.

use super::config::CoordinatorConfig;
use super::error::StateError;
use super::meta::{StateMeta, StateMetaTable};
use super::router::EventRouter;
use crate::core::{
    HandlerResult, StateHistory, StateId, StateTransition, StateTree, DEFAULT_INITIAL_STATE,
    ENTER_EVENT, EXIT_EVENT,
};
use crate::transition::{Binding, CoordinatorId, PlannerStats, Transition, TransitionPlanner};
use chrono::Utc;
use serde_json::Value;
use std::rc::Rc;
use tracing::info;

/// Drives one hierarchy: tracks the current state, executes transitions and
/// dispatches events.
///
/// The tree is shared through `Rc` and never mutated; everything that changes
/// while the coordinator runs (current state, per-state metadata, history,
/// and the owner environment `E`) lives here.
///
/// Handlers receive `&mut StateCoordinator` and may call
/// [`transition_to`](Self::transition_to) or [`send`](Self::send) again. A
/// nested call runs to completion before the outer transition fires its
/// remaining hooks.
///
/// # Example
///
/// ```rust
/// use statetree::builder::{CoordinatorBuilder, StateBuilder};
///
/// let mut coordinator = CoordinatorBuilder::<(), ()>::new()
///     .initial_state("poweredDown")
///     .state("poweredDown", StateBuilder::new())
///     .state(
///         "poweredUp",
///         StateBuilder::new()
///             .state("mobile", StateBuilder::new())
///             .state("stationary", StateBuilder::new()),
///     )
///     .build(())
///     .unwrap();
///
/// coordinator.transition_to("poweredUp.mobile").unwrap();
/// assert_eq!(coordinator.current_path().as_deref(), Some("poweredUp.mobile"));
/// ```
pub struct StateCoordinator<C, E = ()> {
    id: CoordinatorId,
    tree: Rc<StateTree<C, E>>,
    config: CoordinatorConfig,
    current: Option<StateId>,
    meta: StateMetaTable<C>,
    stats: PlannerStats,
    history: StateHistory,
    env: E,
}

impl<C: Clone + PartialEq, E> StateCoordinator<C, E> {
    /// Create a coordinator with a fresh cache identity and enter the root's
    /// initial state, if it declares one or has a child named `start`.
    pub fn new(
        tree: Rc<StateTree<C, E>>,
        config: CoordinatorConfig,
        env: E,
    ) -> Result<Self, StateError> {
        Self::with_id(tree, config, env, CoordinatorId::new())
    }

    /// Like [`new`](Self::new) but keys cached plans under `id`, so several
    /// coordinators over the same tree can share them.
    pub fn with_id(
        tree: Rc<StateTree<C, E>>,
        config: CoordinatorConfig,
        env: E,
        id: CoordinatorId,
    ) -> Result<Self, StateError> {
        let history = StateHistory::with_limit(config.history_limit);
        let mut coordinator = Self {
            id,
            tree,
            config,
            current: None,
            meta: StateMetaTable::default(),
            stats: PlannerStats::default(),
            history,
            env,
        };
        coordinator.start()?;
        Ok(coordinator)
    }

    fn start(&mut self) -> Result<(), StateError> {
        let root = self.tree.node(self.tree.root());
        let initial = match root.initial_state() {
            Some(initial) => Some(initial.to_string()),
            None => root
                .child(DEFAULT_INITIAL_STATE)
                .map(|_| DEFAULT_INITIAL_STATE.to_string()),
        };

        match initial {
            Some(initial) => self.transition_to(&initial),
            None => Ok(()),
        }
    }

    /// Transition to `path` without contexts.
    pub fn transition_to(&mut self, path: &str) -> Result<(), StateError> {
        self.transition_to_with(path, Vec::new())
    }

    /// Transition to `path`, binding `contexts` to the entered states.
    ///
    /// The last context goes to the deepest state named by the path, the one
    /// before it to the next state up, and so on; extra contexts re-enter
    /// ancestors. An empty path does nothing. An unresolvable path or too many
    /// contexts fail before any hook fires.
    pub fn transition_to_with(&mut self, path: &str, contexts: Vec<C>) -> Result<(), StateError> {
        if path.is_empty() {
            return Ok(());
        }

        let shared = Rc::clone(&self.tree);
        let tree = shared.as_ref();
        let current = self.current.unwrap_or_else(|| tree.root());

        let plan = TransitionPlanner::new(tree, self.id).resolve(current, path, &mut self.stats)?;
        let transition = Transition::new(plan).normalize(tree, &self.meta, path, contexts)?;

        self.enter_state(tree, &transition)?;
        self.trigger_setup_context(tree, &transition)
    }

    /// Exit deepest-first, enter shallowest-first, then move to the final state.
    fn enter_state(
        &mut self,
        tree: &StateTree<C, E>,
        transition: &Transition<C>,
    ) -> Result<(), StateError> {
        let logging = self.config.enable_logging;

        for &state in transition.exit_states.iter().rev() {
            if logging {
                info!(state = %tree.display_path(state), "exiting state");
            }
            self.trigger(tree, state, EXIT_EVENT, &[])?;
        }

        for &state in &transition.enter_states {
            if logging {
                info!(state = %tree.display_path(state), "entering state");
            }
            self.trigger(tree, state, ENTER_EVENT, &[])?;
        }

        let from = self.current.map(|state| tree.path(state));
        self.current = Some(transition.final_state);

        let record = StateTransition {
            from,
            to: tree.path(transition.final_state),
            exited: transition.exit_states.iter().rev().map(|&s| tree.path(s)).collect(),
            entered: transition.enter_states.iter().map(|&s| tree.path(s)).collect(),
            timestamp: Utc::now(),
        };
        if record.changed() {
            self.history.push(record);
        }
        Ok(())
    }

    /// Fire the transition event on every entered state with its context.
    fn trigger_setup_context(
        &mut self,
        tree: &StateTree<C, E>,
        transition: &Transition<C>,
    ) -> Result<(), StateError> {
        let event = self.config.transition_event.clone();

        for (&state, binding) in transition.enter_states.iter().zip(&transition.contexts) {
            self.meta.remember_context(state, binding.clone());
            let args: &[C] = match binding {
                Binding::Bound(context) => std::slice::from_ref(context),
                Binding::Unbound | Binding::Empty => &[],
            };
            self.trigger(tree, state, &event, args)?;
        }
        Ok(())
    }

    /// Invoke `event` on exactly `state`, without bubbling.
    fn trigger(
        &mut self,
        tree: &StateTree<C, E>,
        state: StateId,
        event: &str,
        args: &[C],
    ) -> Result<(), StateError> {
        if let Some(action) = tree.node(state).action(event) {
            action(self, args)?;
        }
        Ok(())
    }

    /// Send `event` to the current state, bubbling up to its ancestors.
    pub fn send(&mut self, event: &str, args: &[C]) -> HandlerResult<C> {
        let Some(current) = self.current else {
            return Err(StateError::NotStarted {
                event: event.to_string(),
            });
        };
        EventRouter::new(Rc::clone(&self.tree)).dispatch(self, event, current, args)
    }

    /// Last resort when no state handles an event or `unhandledEvent`.
    pub(crate) fn unhandled_fallback(&self, event: &str) -> HandlerResult<C> {
        if self.config.error_on_unhandled_event {
            return Err(StateError::UnhandledEvent {
                event: event.to_string(),
                state: self
                    .current
                    .map(|state| self.tree.display_path(state))
                    .unwrap_or_default(),
            });
        }
        Ok(None)
    }
}

impl<C, E> StateCoordinator<C, E> {
    pub fn id(&self) -> CoordinatorId {
        self.id
    }

    pub fn tree(&self) -> &StateTree<C, E> {
        &self.tree
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// The active state; `None` until the first transition.
    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    pub fn current_path(&self) -> Option<String> {
        self.current.map(|state| self.tree.path(state))
    }

    /// Follow `path` from `root`. Pure lookup.
    pub fn get_state_by_path(&self, root: StateId, path: &str) -> Option<StateId> {
        self.tree.get_state_by_path(root, path)
    }

    /// Look for `path` under `state` and then under each ancestor. Pure lookup.
    pub fn find_state_by_path(&self, state: StateId, path: &str) -> Option<StateId> {
        self.tree.find_state_by_path(state, path)
    }

    /// Nearest value of `key` on the current state or its ancestors.
    pub fn property(&self, key: &str) -> Option<&Value> {
        let current = self.current.unwrap_or_else(|| self.tree.root());
        self.tree.lookup_property(current, key)
    }

    /// Target of the nearest transition shortcut declared for `event`.
    pub fn lookup_event_target(&self, event: &str) -> Option<&str> {
        let current = self.current.unwrap_or_else(|| self.tree.root());
        self.tree.lookup_event_target(current, event)
    }

    pub fn state_meta(&self, state: StateId) -> Option<&StateMeta<C>> {
        self.meta.get(state)
    }

    pub fn get_state_meta(&self, state: StateId, key: &str) -> Option<&Value> {
        self.meta.value(state, key)
    }

    pub fn set_state_meta(&mut self, state: StateId, key: &str, value: Value) -> Option<Value> {
        self.meta.set_value(state, key, value)
    }

    pub fn planner_stats(&self) -> PlannerStats {
        self.stats
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Owner environment, available to handlers.
    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}
