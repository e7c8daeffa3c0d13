//! Arena that owns every node of one state hierarchy.

use super::node::{StateId, StateNode};
use crate::builder::BuildError;
use serde_json::Value;

/// A hierarchy of [`StateNode`]s rooted at [`StateId::ROOT`].
///
/// The root is the coordinator-level state: its path is the empty string and
/// the path of a top-level state is its bare name. The tree is only mutated
/// while it is being built; afterwards it is shared read-only between
/// coordinators.
///
/// # Example
///
/// ```rust
/// use statetree::core::{StateNode, StateTree};
///
/// let mut tree: StateTree<(), ()> = StateTree::new();
/// let posts = tree.attach_child(tree.root(), "posts", StateNode::new()).unwrap();
/// let show = tree.attach_child(posts, "show", StateNode::new()).unwrap();
///
/// assert_eq!(tree.path(show), "posts.show");
/// assert_eq!(tree.get_state_by_path(tree.root(), "posts.show"), Some(show));
/// assert!(!tree.is_leaf(posts));
/// ```
#[derive(Debug)]
pub struct StateTree<C, E> {
    nodes: Vec<StateNode<C, E>>,
}

impl<C, E> StateTree<C, E> {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![StateNode::new()],
        }
    }

    pub fn root(&self) -> StateId {
        StateId::ROOT
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Borrow a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was minted by a different tree and is out of range;
    /// use [`get`](Self::get) for ids of unknown origin.
    pub fn node(&self, id: StateId) -> &StateNode<C, E> {
        &self.nodes[id.0]
    }

    /// Borrow a node, or `None` if `id` does not belong to this tree.
    pub fn get(&self, id: StateId) -> Option<&StateNode<C, E>> {
        self.nodes.get(id.0)
    }

    pub fn contains(&self, id: StateId) -> bool {
        id.0 < self.nodes.len()
    }

    pub(crate) fn node_mut(&mut self, id: StateId) -> &mut StateNode<C, E> {
        &mut self.nodes[id.0]
    }

    /// Attach `child` under `parent` with the given name.
    pub fn attach_child(
        &mut self,
        parent: StateId,
        name: &str,
        mut child: StateNode<C, E>,
    ) -> Result<StateId, BuildError> {
        if name.is_empty() || name.contains('.') {
            return Err(BuildError::InvalidName(name.to_string()));
        }
        let Some(parent_node) = self.get(parent) else {
            return Err(BuildError::UnknownParent(parent));
        };
        if parent_node.child(name).is_some() {
            return Err(BuildError::DuplicateName {
                parent: self.display_path(parent),
                name: name.to_string(),
            });
        }

        let id = StateId(self.nodes.len());
        child.name = name.to_string();
        child.parent = Some(parent);
        self.nodes.push(child);
        self.node_mut(parent).children.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.get(id)?.parent
    }

    pub fn child(&self, id: StateId, name: &str) -> Option<StateId> {
        self.get(id)?.child(name)
    }

    pub fn is_leaf(&self, id: StateId) -> bool {
        self.get(id).is_some_and(|node| node.is_leaf())
    }

    /// Dot-joined names from the root down to `id`; empty for the root.
    pub fn path(&self, id: StateId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .filter(|state| *state != StateId::ROOT)
            .map(|state| self.node(state).name())
            .collect();
        names.reverse();
        names.join(".")
    }

    /// Like [`path`](Self::path) but renders the root as `<root>`, for messages.
    pub(crate) fn display_path(&self, id: StateId) -> String {
        if id == StateId::ROOT {
            "<root>".to_string()
        } else {
            self.path(id)
        }
    }

    /// `id` followed by each of its ancestors up to and including the root.
    /// Empty when `id` does not belong to this tree.
    pub fn ancestors(&self, id: StateId) -> Ancestors<'_, C, E> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Resolve every segment of `path` under `root`, returning the chain of
    /// states from the first segment to the last.
    ///
    /// Returns `None` when the path is empty or any segment is missing.
    pub fn states_in_path(&self, root: StateId, path: &str) -> Option<Vec<StateId>> {
        if path.is_empty() {
            return None;
        }

        let mut state = root;
        let mut chain = Vec::new();
        for segment in path.split('.') {
            state = self.child(state, segment)?;
            chain.push(state);
        }
        Some(chain)
    }

    /// Follow `path` from `root`; pure lookup with no side effects.
    pub fn get_state_by_path(&self, root: StateId, path: &str) -> Option<StateId> {
        self.states_in_path(root, path)
            .and_then(|chain| chain.last().copied())
    }

    /// Look for `path` under `state`, then under each of its ancestors.
    pub fn find_state_by_path(&self, state: StateId, path: &str) -> Option<StateId> {
        self.ancestors(state)
            .find_map(|ancestor| self.get_state_by_path(ancestor, path))
    }

    /// Target path of the nearest transition shortcut declared for `event`.
    pub fn lookup_event_target(&self, state: StateId, event: &str) -> Option<&str> {
        self.ancestors(state)
            .find_map(|ancestor| self.node(ancestor).event_transition(event))
    }

    /// Nearest value of the property `key`, looking up through the ancestors.
    pub fn lookup_property(&self, state: StateId, key: &str) -> Option<&Value> {
        self.ancestors(state)
            .find_map(|ancestor| self.node(ancestor).property(key))
    }
}

impl<C, E> Default for StateTree<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a state and its ancestors, innermost first.
pub struct Ancestors<'a, C, E> {
    tree: &'a StateTree<C, E>,
    next: Option<StateId>,
}

impl<C, E> Iterator for Ancestors<'_, C, E> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        let current = self.next.filter(|id| self.tree.contains(*id))?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blog() -> (StateTree<(), ()>, [StateId; 5]) {
        let mut tree = StateTree::new();
        let root = tree.root();
        let posts = tree.attach_child(root, "posts", StateNode::new()).unwrap();
        let posts_show = tree.attach_child(posts, "show", StateNode::new()).unwrap();
        let comments = tree.attach_child(root, "comments", StateNode::new()).unwrap();
        let comments_show = tree
            .attach_child(comments, "show", StateNode::new())
            .unwrap();
        (tree, [root, posts, posts_show, comments, comments_show])
    }

    #[test]
    fn path_joins_ancestor_names() {
        let (tree, [root, posts, posts_show, _, comments_show]) = blog();
        assert_eq!(tree.path(root), "");
        assert_eq!(tree.path(posts), "posts");
        assert_eq!(tree.path(posts_show), "posts.show");
        assert_eq!(tree.path(comments_show), "comments.show");
    }

    #[test]
    fn attach_rejects_duplicate_sibling() {
        let (mut tree, [_, posts, ..]) = blog();
        let result = tree.attach_child(posts, "show", StateNode::new());
        assert!(matches!(
            result,
            Err(BuildError::DuplicateName { ref parent, ref name }) if parent == "posts" && name == "show"
        ));
    }

    #[test]
    fn attach_rejects_dotted_or_empty_names() {
        let mut tree: StateTree<(), ()> = StateTree::new();
        let root = tree.root();
        assert!(matches!(
            tree.attach_child(root, "a.b", StateNode::new()),
            Err(BuildError::InvalidName(_))
        ));
        assert!(matches!(
            tree.attach_child(root, "", StateNode::new()),
            Err(BuildError::InvalidName(_))
        ));
    }

    #[test]
    fn states_in_path_returns_whole_chain() {
        let (tree, [root, posts, posts_show, ..]) = blog();
        assert_eq!(
            tree.states_in_path(root, "posts.show"),
            Some(vec![posts, posts_show])
        );
        assert_eq!(tree.states_in_path(root, "posts.missing"), None);
        assert_eq!(tree.states_in_path(root, ""), None);
    }

    #[test]
    fn find_state_by_path_prefers_nearest_ancestor() {
        let (tree, [_, _, posts_show, _, comments_show]) = blog();
        assert_eq!(
            tree.find_state_by_path(posts_show, "comments.show"),
            Some(comments_show)
        );
        assert_eq!(tree.find_state_by_path(posts_show, "nowhere"), None);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let (tree, [root, posts, posts_show, ..]) = blog();
        let chain: Vec<StateId> = tree.ancestors(posts_show).collect();
        assert_eq!(chain, vec![posts_show, posts, root]);
    }

    #[test]
    fn lookup_event_target_walks_upward() {
        let (mut tree, [_, posts, posts_show, ..]) = blog();
        tree.node_mut(posts)
            .event_transitions
            .insert("viewComments".to_string(), "comments.show".to_string());

        assert_eq!(
            tree.lookup_event_target(posts_show, "viewComments"),
            Some("comments.show")
        );
        assert_eq!(tree.lookup_event_target(posts_show, "other"), None);
    }

    #[test]
    fn lookup_property_prefers_innermost_value() {
        let (mut tree, [root, posts, posts_show, ..]) = blog();
        tree.node_mut(root)
            .properties
            .insert("isDirty".to_string(), json!(false));
        tree.node_mut(posts)
            .properties
            .insert("isDirty".to_string(), json!(true));

        assert_eq!(tree.lookup_property(posts_show, "isDirty"), Some(&json!(true)));
        assert_eq!(tree.lookup_property(root, "isDirty"), Some(&json!(false)));
        assert_eq!(tree.lookup_property(root, "missing"), None);
    }

    #[test]
    fn lookups_with_foreign_ids_find_nothing() {
        let (big, [.., comments_show]) = blog();
        let mut small: StateTree<(), ()> = StateTree::new();
        small
            .node_mut(StateId::ROOT)
            .properties
            .insert("isDirty".to_string(), json!(true));

        assert!(small.get(comments_show).is_none());
        assert_eq!(small.get_state_by_path(comments_show, "show"), None);
        assert_eq!(small.find_state_by_path(comments_show, "show"), None);
        assert_eq!(small.lookup_property(comments_show, "isDirty"), None);
        assert_eq!(small.ancestors(comments_show).count(), 0);
        assert!(matches!(
            small.attach_child(comments_show, "orphan", StateNode::new()),
            Err(BuildError::UnknownParent(id)) if id == comments_show
        ));
        assert!(big.contains(comments_show));
    }

    #[test]
    fn leaf_status_is_derived() {
        let (tree, [root, posts, posts_show, ..]) = blog();
        assert!(!tree.is_leaf(root));
        assert!(!tree.is_leaf(posts));
        assert!(tree.is_leaf(posts_show));
        assert_eq!(tree.len(), 5);
    }
}
