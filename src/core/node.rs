//! A single named state in a hierarchy.
//!
//! Nodes are plain data: they know their name, their parent and children by
//! id, and which events they can respond to. Path and leaf status are derived
//! by the owning [`StateTree`](super::StateTree).

use crate::coordinator::{StateCoordinator, StateError};
use crate::transition::PathCache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Name of the hook fired on every state entered by a transition.
pub const ENTER_EVENT: &str = "enter";

/// Name of the hook fired on every state exited by a transition.
pub const EXIT_EVENT: &str = "exit";

/// Default name of the event fired with each entered state's bound context.
pub const DEFAULT_TRANSITION_EVENT: &str = "setup";

/// Child entered automatically when a state declares no `initial_state`.
pub const DEFAULT_INITIAL_STATE: &str = "start";

/// Identifier of a node inside its [`StateTree`](super::StateTree).
///
/// Ids are only minted by the tree that owns the node and are meaningless in
/// any other tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// The root of every tree.
    pub const ROOT: StateId = StateId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result returned by every event handler.
pub type HandlerResult<C> = Result<Option<C>, StateError>;

/// Handler for a named event: receives the coordinator and the event arguments.
pub type Action<C, E> = Rc<dyn Fn(&mut StateCoordinator<C, E>, &[C]) -> HandlerResult<C>>;

/// Handler for the `unhandledEvent` pass: also receives the original event name.
pub type UnhandledAction<C, E> =
    Rc<dyn Fn(&mut StateCoordinator<C, E>, &str, &[C]) -> HandlerResult<C>>;

/// Box a closure as an [`Action`].
pub fn action<C, E, F>(handler: F) -> Action<C, E>
where
    F: Fn(&mut StateCoordinator<C, E>, &[C]) -> HandlerResult<C> + 'static,
{
    Rc::new(handler)
}

/// Box a closure as an [`UnhandledAction`].
pub fn unhandled_action<C, E, F>(handler: F) -> UnhandledAction<C, E>
where
    F: Fn(&mut StateCoordinator<C, E>, &str, &[C]) -> HandlerResult<C> + 'static,
{
    Rc::new(handler)
}

/// One state of the hierarchy.
pub struct StateNode<C, E> {
    pub(crate) name: String,
    pub(crate) parent: Option<StateId>,
    pub(crate) children: HashMap<String, StateId>,
    pub(crate) has_context: bool,
    pub(crate) initial_state: Option<String>,
    pub(crate) event_transitions: HashMap<String, String>,
    pub(crate) properties: HashMap<String, Value>,
    pub(crate) actions: HashMap<String, Action<C, E>>,
    pub(crate) unhandled: Option<UnhandledAction<C, E>>,
    pub(crate) paths: PathCache,
}

impl<C, E> StateNode<C, E> {
    /// Create a detached node with no handlers.
    ///
    /// The name is assigned when the node is attached to a tree.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            parent: None,
            children: HashMap::new(),
            has_context: true,
            initial_state: None,
            event_transitions: HashMap::new(),
            properties: HashMap::new(),
            actions: HashMap::new(),
            unhandled: None,
            paths: PathCache::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    pub fn child(&self, name: &str) -> Option<StateId> {
        self.children.get(name).copied()
    }

    /// Iterate over `(name, id)` pairs of the direct children, in no particular order.
    pub fn children(&self) -> impl Iterator<Item = (&str, StateId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// A node is a leaf when it has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether entering this node consumes one of the caller's contexts.
    pub fn has_context(&self) -> bool {
        self.has_context
    }

    /// Name of the child entered by default, if one was declared.
    pub fn initial_state(&self) -> Option<&str> {
        self.initial_state.as_deref()
    }

    /// Target path declared for a transition-shortcut event on this node only.
    pub fn event_transition(&self, event: &str) -> Option<&str> {
        self.event_transitions.get(event).map(String::as_str)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Whether this node declares a handler for `event`.
    pub fn supports(&self, event: &str) -> bool {
        self.actions.contains_key(event)
    }

    pub fn action(&self, event: &str) -> Option<&Action<C, E>> {
        self.actions.get(event)
    }

    pub fn unhandled(&self) -> Option<&UnhandledAction<C, E>> {
        self.unhandled.as_ref()
    }

    /// Plans memoized for transitions starting at this node.
    pub fn paths(&self) -> &PathCache {
        &self.paths
    }
}

impl<C, E> Default for StateNode<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> fmt::Debug for StateNode<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        events.sort_unstable();
        f.debug_struct("StateNode")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("has_context", &self.has_context)
            .field("initial_state", &self.initial_state)
            .field("events", &events)
            .finish()
    }
}
