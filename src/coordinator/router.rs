//! Bubbling event dispatch.

use super::machine::StateCoordinator;
use crate::core::{HandlerResult, StateId, StateTree};
use std::rc::Rc;
use tracing::info;

/// Name of the synthetic event offered when nothing handles the original one.
pub const UNHANDLED_EVENT: &str = "unhandledEvent";

/// Delivers events along the ancestor chain of a state.
///
/// Dispatch only ever looks at the starting state and its ancestors; siblings
/// and cousins are never consulted.
pub struct EventRouter<C, E> {
    tree: Rc<StateTree<C, E>>,
}

impl<C: Clone + PartialEq, E> EventRouter<C, E> {
    pub fn new(tree: Rc<StateTree<C, E>>) -> Self {
        Self { tree }
    }

    /// Offer `event` to `start` and then to each ancestor.
    ///
    /// The first handler found is invoked and its result returned. When none
    /// exists, a second pass looks for `unhandledEvent` handlers, which also
    /// receive the event name. When that fails too the coordinator's fallback
    /// decides between an error and a silent `Ok(None)`.
    pub fn dispatch(
        &self,
        coordinator: &mut StateCoordinator<C, E>,
        event: &str,
        start: StateId,
        args: &[C],
    ) -> HandlerResult<C> {
        let logging = coordinator.config().enable_logging;

        for state in self.tree.ancestors(start) {
            if let Some(action) = self.tree.node(state).action(event) {
                if logging {
                    info!(event, state = %self.tree.display_path(state), "sending event");
                }
                return action(coordinator, args);
            }
        }

        for state in self.tree.ancestors(start) {
            if let Some(handler) = self.tree.node(state).unhandled() {
                if logging {
                    info!(event, state = %self.tree.display_path(state), "unhandled event being sent");
                }
                return handler(coordinator, event, args);
            }
        }

        coordinator.unhandled_fallback(event)
    }
}
