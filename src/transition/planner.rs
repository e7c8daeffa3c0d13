//! Resolution of a target path into a structural transition plan.

use super::cache::CoordinatorId;
use super::plan::{PlannerStats, TransitionPlan};
use crate::coordinator::StateError;
use crate::core::{StateId, StateTree};
use std::collections::VecDeque;
use tracing::trace;

/// Computes [`TransitionPlan`]s for one coordinator over one tree.
///
/// A target path may be relative: it is first looked up under the current
/// state, then under each ancestor in turn, so the nearest ancestor containing
/// the path wins. The root is the last candidate, which makes absolute paths
/// work from anywhere.
///
/// Resolved plans are cached on the starting node under the coordinator's id.
pub struct TransitionPlanner<'a, C, E> {
    tree: &'a StateTree<C, E>,
    owner: CoordinatorId,
}

impl<'a, C, E> TransitionPlanner<'a, C, E> {
    pub fn new(tree: &'a StateTree<C, E>, owner: CoordinatorId) -> Self {
        Self { tree, owner }
    }

    /// Plan a transition from `current` to `path`, serving it from the cache
    /// when this coordinator already resolved the same path from `current`.
    pub fn resolve(
        &self,
        current: StateId,
        path: &str,
        stats: &mut PlannerStats,
    ) -> Result<TransitionPlan, StateError> {
        let cache = self.tree.node(current).paths();
        if let Some(plan) = cache.get(self.owner, path) {
            stats.cache_hits += 1;
            trace!(path, from = %self.tree.display_path(current), "transition plan served from cache");
            return Ok(plan);
        }

        let plan = self.compute(current, path)?;
        stats.computed += 1;
        trace!(
            path,
            from = %self.tree.display_path(current),
            resolve = %self.tree.display_path(plan.resolve_state),
            exits = plan.exit_states.len(),
            enters = plan.enter_states.len(),
            "transition plan computed"
        );
        cache.insert(self.owner, path, plan.clone());
        Ok(plan)
    }

    /// Compute a plan without consulting or filling the cache.
    pub fn compute(&self, current: StateId, path: &str) -> Result<TransitionPlan, StateError> {
        let mut exit_states = VecDeque::new();
        let mut resolve_state = current;
        let mut enter_states = self.tree.states_in_path(current, path);

        while enter_states.is_none() {
            exit_states.push_front(resolve_state);
            let Some(parent) = self.tree.parent(resolve_state) else {
                return Err(StateError::UnknownPath {
                    path: path.to_string(),
                    from: self.tree.display_path(current),
                });
            };
            resolve_state = parent;
            enter_states = self.tree.states_in_path(parent, path);
        }

        let mut enter_states: VecDeque<StateId> = enter_states.unwrap_or_default().into();

        // States on both chains are ancestors of the old and the new state;
        // leaving and re-entering them would be redundant.
        while let (Some(entered), Some(exited)) =
            (enter_states.front().copied(), exit_states.front().copied())
        {
            if entered != exited {
                break;
            }
            resolve_state = entered;
            enter_states.pop_front();
            exit_states.pop_front();
        }

        Ok(TransitionPlan {
            exit_states: exit_states.into(),
            enter_states: enter_states.into(),
            resolve_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateNode;

    struct Blog {
        tree: StateTree<(), ()>,
        root: StateId,
        post: StateId,
        post_index: StateId,
        post_show: StateId,
        comments: StateId,
        comments_show: StateId,
    }

    //  root
    //  ├─ post
    //  │  ├─ index
    //  │  └─ show
    //  └─ comments
    //     └─ show
    fn blog() -> Blog {
        let mut tree = StateTree::new();
        let root = tree.root();
        let post = tree.attach_child(root, "post", StateNode::new()).unwrap();
        let post_index = tree.attach_child(post, "index", StateNode::new()).unwrap();
        let post_show = tree.attach_child(post, "show", StateNode::new()).unwrap();
        let comments = tree.attach_child(root, "comments", StateNode::new()).unwrap();
        let comments_show = tree
            .attach_child(comments, "show", StateNode::new())
            .unwrap();
        Blog {
            tree,
            root,
            post,
            post_index,
            post_show,
            comments,
            comments_show,
        }
    }

    #[test]
    fn descendant_path_resolves_under_current_state() {
        let blog = blog();
        let planner = TransitionPlanner::new(&blog.tree, CoordinatorId::new());

        let plan = planner.compute(blog.post, "show").unwrap();

        assert_eq!(plan.resolve_state, blog.post);
        assert!(plan.exit_states.is_empty());
        assert_eq!(plan.enter_states, vec![blog.post_show]);
    }

    #[test]
    fn sibling_transition_keeps_shared_parent() {
        let blog = blog();
        let planner = TransitionPlanner::new(&blog.tree, CoordinatorId::new());

        let plan = planner.compute(blog.post_index, "show").unwrap();

        assert_eq!(plan.resolve_state, blog.post);
        assert_eq!(plan.exit_states, vec![blog.post_index]);
        assert_eq!(plan.enter_states, vec![blog.post_show]);
    }

    #[test]
    fn relative_path_climbs_to_nearest_container() {
        let blog = blog();
        let planner = TransitionPlanner::new(&blog.tree, CoordinatorId::new());

        let plan = planner.compute(blog.post_show, "comments.show").unwrap();

        assert_eq!(plan.resolve_state, blog.root);
        assert_eq!(plan.exit_states, vec![blog.post, blog.post_show]);
        assert_eq!(plan.enter_states, vec![blog.comments, blog.comments_show]);
    }

    #[test]
    fn absolute_path_strips_common_prefix() {
        let blog = blog();
        let planner = TransitionPlanner::new(&blog.tree, CoordinatorId::new());

        let plan = planner.compute(blog.post_index, "post.show").unwrap();

        assert_eq!(plan.resolve_state, blog.post);
        assert_eq!(plan.exit_states, vec![blog.post_index]);
        assert_eq!(plan.enter_states, vec![blog.post_show]);
    }

    #[test]
    fn path_to_current_state_is_noop() {
        let blog = blog();
        let planner = TransitionPlanner::new(&blog.tree, CoordinatorId::new());

        let plan = planner.compute(blog.post_show, "post.show").unwrap();

        assert!(plan.is_noop());
        assert_eq!(plan.resolve_state, blog.post_show);
    }

    #[test]
    fn unknown_path_is_an_error() {
        let blog = blog();
        let planner = TransitionPlanner::new(&blog.tree, CoordinatorId::new());

        let result = planner.compute(blog.post_show, "archive");

        assert!(matches!(
            result,
            Err(StateError::UnknownPath { ref path, ref from }) if path == "archive" && from == "post.show"
        ));
    }

    #[test]
    fn resolve_serves_repeat_requests_from_cache() {
        let blog = blog();
        let owner = CoordinatorId::new();
        let planner = TransitionPlanner::new(&blog.tree, owner);
        let mut stats = PlannerStats::default();

        let first = planner
            .resolve(blog.comments_show, "post.index", &mut stats)
            .unwrap();
        let second = planner
            .resolve(blog.comments_show, "post.index", &mut stats)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(stats.computed, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(blog.tree.node(blog.comments_show).paths().len(owner), 1);
    }

    #[test]
    fn caches_are_not_shared_between_coordinators() {
        let blog = blog();
        let mut stats = PlannerStats::default();

        TransitionPlanner::new(&blog.tree, CoordinatorId::new())
            .resolve(blog.post_index, "show", &mut stats)
            .unwrap();
        TransitionPlanner::new(&blog.tree, CoordinatorId::new())
            .resolve(blog.post_index, "show", &mut stats)
            .unwrap();

        assert_eq!(stats.computed, 2);
        assert_eq!(stats.cache_hits, 0);
    }

    #[test]
    fn failed_resolution_is_not_cached() {
        let blog = blog();
        let owner = CoordinatorId::new();
        let planner = TransitionPlanner::new(&blog.tree, owner);
        let mut stats = PlannerStats::default();

        assert!(planner.resolve(blog.post, "nowhere", &mut stats).is_err());
        assert_eq!(blog.tree.node(blog.post).paths().len(owner), 0);
        assert_eq!(stats.computed, 0);
    }
}
