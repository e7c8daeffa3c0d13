//! Fluent construction of a single state and its subtree.

use crate::builder::error::BuildError;
use crate::coordinator::{StateCoordinator, StateError};
use crate::core::{
    action, unhandled_action, Action, HandlerResult, StateId, StateNode, StateTree,
    DEFAULT_TRANSITION_EVENT, ENTER_EVENT, EXIT_EVENT,
};
use serde_json::Value;

/// Builder for one state, its handlers and its children.
///
/// Children are kept in declaration order until the tree is built, so a
/// repeated name is reported as [`BuildError::DuplicateName`] instead of
/// silently replacing the earlier child.
pub struct StateBuilder<C, E = ()> {
    node: StateNode<C, E>,
    setup: Option<Action<C, E>>,
    children: Vec<(String, StateBuilder<C, E>)>,
}

impl<C: Clone + PartialEq + 'static, E: 'static> StateBuilder<C, E> {
    pub fn new() -> Self {
        Self {
            node: StateNode::new(),
            setup: None,
            children: Vec::new(),
        }
    }

    /// Mark the state as taking no context; it is matched without consuming one.
    pub fn without_context(mut self) -> Self {
        self.node.has_context = false;
        self
    }

    /// Child entered when a transition ends on this state.
    pub fn initial_state(mut self, name: impl Into<String>) -> Self {
        self.node.initial_state = Some(name.into());
        self
    }

    /// Attach a static value, visible to this state and its descendants.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.node.properties.insert(key.into(), value.into());
        self
    }

    /// Handle `event`. The handler's result is returned from `send`.
    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut StateCoordinator<C, E>, &[C]) -> HandlerResult<C> + 'static,
    {
        self.node.actions.insert(event.into(), action(handler));
        self
    }

    pub fn on_enter<F>(self, hook: F) -> Self
    where
        F: Fn(&mut StateCoordinator<C, E>) -> Result<(), StateError> + 'static,
    {
        self.on(ENTER_EVENT, move |coordinator, _args| {
            hook(coordinator)?;
            Ok(None)
        })
    }

    pub fn on_exit<F>(self, hook: F) -> Self
    where
        F: Fn(&mut StateCoordinator<C, E>) -> Result<(), StateError> + 'static,
    {
        self.on(EXIT_EVENT, move |coordinator, _args| {
            hook(coordinator)?;
            Ok(None)
        })
    }

    /// Run `hook` with the context bound to this state, after every entered
    /// state's `enter` hook has fired.
    ///
    /// The hook is registered under the transition event of the tree being
    /// built: `setup` for [`build_tree`](Self::build_tree), the configured
    /// one when built through a [`CoordinatorBuilder`](super::CoordinatorBuilder).
    pub fn on_setup<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StateCoordinator<C, E>, Option<&C>) -> Result<(), StateError> + 'static,
    {
        self.setup = Some(action(move |coordinator, args: &[C]| {
            hook(coordinator, args.first())?;
            Ok(None)
        }));
        self
    }

    /// Handle any event that neither this state nor a descendant on the
    /// current path responds to.
    pub fn on_unhandled<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut StateCoordinator<C, E>, &str, &[C]) -> HandlerResult<C> + 'static,
    {
        self.node.unhandled = Some(unhandled_action(handler));
        self
    }

    /// Transition to `target` when `event` is sent, passing the event's
    /// arguments on as contexts.
    pub fn transition_on(mut self, event: impl Into<String>, target: impl Into<String>) -> Self {
        let event = event.into();
        let target = target.into();
        self.node
            .event_transitions
            .insert(event.clone(), target.clone());
        self.on(event, move |coordinator, args| {
            coordinator.transition_to_with(&target, args.to_vec())?;
            Ok(None)
        })
    }

    /// Add a child state.
    pub fn state(mut self, name: impl Into<String>, child: StateBuilder<C, E>) -> Self {
        self.children.push((name.into(), child));
        self
    }

    /// Build a tree with this builder as its root, for the default `setup`
    /// transition event.
    pub fn build_tree(self) -> Result<StateTree<C, E>, BuildError> {
        self.build_tree_for(DEFAULT_TRANSITION_EVENT)
    }

    /// Build a tree whose `on_setup` hooks answer `transition_event`.
    pub fn build_tree_for(self, transition_event: &str) -> Result<StateTree<C, E>, BuildError> {
        let mut tree = StateTree::new();
        let root = tree.root();
        let (node, children) = self.into_parts(transition_event);
        *tree.node_mut(root) = node;
        attach_children(&mut tree, root, children, transition_event)?;
        Ok(tree)
    }

    fn into_parts(
        mut self,
        transition_event: &str,
    ) -> (StateNode<C, E>, Vec<(String, StateBuilder<C, E>)>) {
        if let Some(setup) = self.setup {
            self.node.actions.insert(transition_event.to_string(), setup);
        }
        (self.node, self.children)
    }

    fn attach(
        self,
        tree: &mut StateTree<C, E>,
        parent: StateId,
        name: &str,
        transition_event: &str,
    ) -> Result<StateId, BuildError> {
        let (node, children) = self.into_parts(transition_event);
        let id = tree.attach_child(parent, name, node)?;
        attach_children(tree, id, children, transition_event)?;
        Ok(id)
    }
}

fn attach_children<C: Clone + PartialEq + 'static, E: 'static>(
    tree: &mut StateTree<C, E>,
    parent: StateId,
    children: Vec<(String, StateBuilder<C, E>)>,
    transition_event: &str,
) -> Result<(), BuildError> {
    for (name, child) in children {
        child.attach(tree, parent, &name, transition_event)?;
    }

    match tree.node(parent).initial_state() {
        Some(initial) if tree.child(parent, initial).is_none() => {
            Err(BuildError::UnknownInitialState {
                state: tree.display_path(parent),
                initial: initial.to_string(),
            })
        }
        _ => Ok(()),
    }
}

impl<C: Clone + PartialEq + 'static, E: 'static> Default for StateBuilder<C, E> {
    fn default() -> Self {
        Self::new()
    }
}
