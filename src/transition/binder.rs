//! Normalization of a structural plan against the caller's contexts.

use super::plan::TransitionPlan;
use crate::coordinator::{StateError, StateMetaTable};
use crate::core::{StateId, StateTree, DEFAULT_INITIAL_STATE};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Context bound to one entered state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding<C> {
    /// No context was supplied for this state.
    Unbound,
    /// The state was matched but does not take a context.
    Empty,
    /// The state was matched with this context.
    Bound(C),
}

impl<C> Binding<C> {
    pub fn context(&self) -> Option<&C> {
        match self {
            Binding::Bound(context) => Some(context),
            Binding::Unbound | Binding::Empty => None,
        }
    }

    /// Whether a caller context was matched against the state.
    pub fn is_matched(&self) -> bool {
        !matches!(self, Binding::Unbound)
    }
}

/// A plan normalized for one call: contexts bound, initial sub-states added
/// and re-entries with an unchanged context trimmed.
///
/// `contexts` is aligned index for index with `enter_states`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<C> {
    pub exit_states: VecDeque<StateId>,
    pub enter_states: VecDeque<StateId>,
    pub resolve_state: StateId,
    pub final_state: StateId,
    pub contexts: VecDeque<Binding<C>>,
}

impl<C: Clone + PartialEq> Transition<C> {
    pub fn new(plan: TransitionPlan) -> Self {
        let final_state = plan
            .enter_states
            .last()
            .copied()
            .unwrap_or(plan.resolve_state);
        let contexts = plan.enter_states.iter().map(|_| Binding::Unbound).collect();

        Self {
            exit_states: plan.exit_states.into(),
            enter_states: plan.enter_states.into(),
            resolve_state: plan.resolve_state,
            final_state,
            contexts,
        }
    }

    /// Run the three normalization steps in order.
    pub fn normalize<E>(
        mut self,
        tree: &StateTree<C, E>,
        meta: &StateMetaTable<C>,
        path: &str,
        contexts: Vec<C>,
    ) -> Result<Self, StateError> {
        self.match_contexts(tree, path, contexts)?;
        self.add_initial_states(tree);
        self.remove_unchanged_contexts(meta);
        Ok(self)
    }

    /// Bind contexts to entered states, innermost first.
    ///
    /// The last context goes to the deepest entered state. States that take no
    /// context are marked [`Binding::Empty`] without consuming one. When the
    /// entered states run out, the parent of the outermost one is added to
    /// both the exit and enter lists so it can be re-entered with the extra
    /// context. The root is never re-entered this way.
    pub fn match_contexts<E>(
        &mut self,
        tree: &StateTree<C, E>,
        path: &str,
        mut contexts: Vec<C>,
    ) -> Result<(), StateError> {
        let mut next = self.enter_states.len();

        while !contexts.is_empty() {
            let slot = if next > 0 {
                next -= 1;
                next
            } else {
                let ancestor = match self.enter_states.front() {
                    Some(&outermost) => tree.parent(outermost),
                    // Re-entering the current state with a context.
                    None => Some(self.resolve_state),
                };
                let Some(ancestor) = ancestor.filter(|state| *state != tree.root()) else {
                    return Err(StateError::ContextOverflow {
                        path: path.to_string(),
                        unmatched: contexts.len(),
                    });
                };
                self.enter_states.push_front(ancestor);
                self.exit_states.push_front(ancestor);
                self.contexts.push_front(Binding::Unbound);
                self.resolve_state = tree.parent(ancestor).unwrap_or(tree.root());
                0
            };

            let state = self.enter_states[slot];
            self.contexts[slot] = if tree.node(state).has_context() {
                contexts.pop().map_or(Binding::Unbound, Binding::Bound)
            } else {
                Binding::Empty
            };
        }

        Ok(())
    }

    /// Descend from the final state into declared initial states (or a child
    /// named `start`), entering each with no context.
    pub fn add_initial_states<E>(&mut self, tree: &StateTree<C, E>) {
        loop {
            let node = tree.node(self.final_state);
            let initial = node.initial_state().unwrap_or(DEFAULT_INITIAL_STATE);
            let Some(child) = node.child(initial) else {
                break;
            };

            self.final_state = child;
            self.enter_states.push_back(child);
            self.contexts.push_back(Binding::Unbound);
        }
    }

    /// Drop leading states that are both exited and entered when their
    /// matched context equals the one recorded at their last entry.
    pub fn remove_unchanged_contexts(&mut self, meta: &StateMetaTable<C>) {
        while let (Some(entered), Some(exited)) =
            (self.enter_states.front().copied(), self.exit_states.front().copied())
        {
            if entered != exited {
                break;
            }

            if let Some(binding) = self.contexts.front() {
                if binding.is_matched() && meta.last_context(entered) != Some(binding) {
                    break;
                }
            }

            self.contexts.pop_front();
            self.enter_states.pop_front();
            self.exit_states.pop_front();
            self.resolve_state = entered;
        }
    }

    /// Context bound to the entered state at `index`, if any.
    pub fn context_at(&self, index: usize) -> Option<&C> {
        self.contexts.get(index).and_then(Binding::context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateNode;
    use crate::transition::{CoordinatorId, TransitionPlanner};

    struct Blog {
        tree: StateTree<&'static str, ()>,
        post: StateId,
        post_index: StateId,
        post_comments: StateId,
        about: StateId,
        section: StateId,
    }

    //  root
    //  ├─ post
    //  │  ├─ index
    //  │  └─ comments
    //  ├─ about
    //  └─ section (no context)
    //     └─ start
    //        └─ start
    fn blog() -> Blog {
        let mut tree = StateTree::new();
        let root = tree.root();
        let post = tree.attach_child(root, "post", StateNode::new()).unwrap();
        let post_index = tree.attach_child(post, "index", StateNode::new()).unwrap();
        let post_comments = tree
            .attach_child(post, "comments", StateNode::new())
            .unwrap();
        let about = tree.attach_child(root, "about", StateNode::new()).unwrap();
        let mut section_node = StateNode::new();
        section_node.has_context = false;
        let section = tree.attach_child(root, "section", section_node).unwrap();
        let start = tree.attach_child(section, "start", StateNode::new()).unwrap();
        tree.attach_child(start, "start", StateNode::new()).unwrap();
        Blog {
            tree,
            post,
            post_index,
            post_comments,
            about,
            section,
        }
    }

    fn plan(blog: &Blog, from: StateId, path: &str) -> Transition<&'static str> {
        let plan = TransitionPlanner::new(&blog.tree, CoordinatorId::new())
            .compute(from, path)
            .unwrap();
        Transition::new(plan)
    }

    #[test]
    fn contexts_bind_from_the_deepest_state() {
        let blog = blog();
        let mut transition = plan(&blog, blog.about, "post.comments");

        transition
            .match_contexts(&blog.tree, "post.comments", vec!["post-1", "comments-1"])
            .unwrap();

        assert_eq!(
            transition.enter_states,
            VecDeque::from(vec![blog.post, blog.post_comments])
        );
        assert_eq!(
            transition.contexts,
            VecDeque::from(vec![Binding::Bound("post-1"), Binding::Bound("comments-1")])
        );
    }

    #[test]
    fn surplus_contexts_synthesize_ancestors() {
        let blog = blog();
        let mut transition = plan(&blog, blog.post_index, "comments");
        assert_eq!(transition.resolve_state, blog.post);

        transition
            .match_contexts(&blog.tree, "comments", vec!["post-2", "comments-2"])
            .unwrap();

        assert_eq!(
            transition.enter_states,
            VecDeque::from(vec![blog.post, blog.post_comments])
        );
        assert_eq!(
            transition.exit_states,
            VecDeque::from(vec![blog.post, blog.post_index])
        );
        assert_eq!(transition.context_at(0), Some(&"post-2"));
        assert_eq!(transition.context_at(1), Some(&"comments-2"));
    }

    #[test]
    fn too_many_contexts_overflow_at_the_root() {
        let blog = blog();
        let mut transition = plan(&blog, blog.post_index, "comments");

        let result = transition.match_contexts(&blog.tree, "comments", vec!["a", "b", "c"]);

        assert!(matches!(
            result,
            Err(StateError::ContextOverflow { unmatched: 1, .. })
        ));
    }

    #[test]
    fn reentering_current_state_with_context_synthesizes_it() {
        let blog = blog();
        let mut transition = plan(&blog, blog.post_comments, "post.comments");
        assert!(transition.enter_states.is_empty());

        transition
            .match_contexts(&blog.tree, "post.comments", vec!["comments-3"])
            .unwrap();

        assert_eq!(transition.enter_states, VecDeque::from(vec![blog.post_comments]));
        assert_eq!(transition.exit_states, VecDeque::from(vec![blog.post_comments]));
        assert_eq!(transition.context_at(0), Some(&"comments-3"));
    }

    #[test]
    fn states_without_context_are_matched_empty() {
        let blog = blog();
        let mut transition = plan(&blog, blog.about, "section");

        let result = transition.match_contexts(&blog.tree, "section", vec!["ignored"]);

        // `section` consumes nothing and its parent is the root.
        assert!(matches!(
            result,
            Err(StateError::ContextOverflow { unmatched: 1, .. })
        ));
        assert_eq!(transition.contexts.front(), Some(&Binding::Empty));
    }

    #[test]
    fn initial_states_are_appended_unbound() {
        let blog = blog();
        let mut transition = plan(&blog, blog.about, "section");

        transition.match_contexts(&blog.tree, "section", vec![]).unwrap();
        transition.add_initial_states(&blog.tree);

        assert_eq!(transition.enter_states.len(), 3);
        assert_eq!(blog.tree.path(transition.final_state), "section.start.start");
        assert_eq!(transition.enter_states[0], blog.section);
        assert!(transition
            .contexts
            .iter()
            .all(|binding| *binding == Binding::Unbound));
    }

    #[test]
    fn unchanged_synthesized_context_is_trimmed() {
        let blog = blog();
        let mut meta = StateMetaTable::default();
        meta.remember_context(blog.post, Binding::Bound("post-1"));

        let transition = plan(&blog, blog.post_index, "comments")
            .normalize(&blog.tree, &meta, "comments", vec!["post-1", "comments-1"])
            .unwrap();

        assert_eq!(transition.resolve_state, blog.post);
        assert_eq!(transition.exit_states, VecDeque::from(vec![blog.post_index]));
        assert_eq!(transition.enter_states, VecDeque::from(vec![blog.post_comments]));
        assert_eq!(transition.context_at(0), Some(&"comments-1"));
    }

    #[test]
    fn changed_synthesized_context_is_kept() {
        let blog = blog();
        let mut meta = StateMetaTable::default();
        meta.remember_context(blog.post, Binding::Bound("post-1"));

        let transition = plan(&blog, blog.post_index, "comments")
            .normalize(&blog.tree, &meta, "comments", vec!["post-2", "comments-1"])
            .unwrap();

        assert_eq!(transition.enter_states.front(), Some(&blog.post));
        assert_eq!(transition.exit_states.front(), Some(&blog.post));
        assert_eq!(transition.resolve_state, blog.tree.root());
    }
}
