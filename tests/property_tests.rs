//! Property-based tests for transitions, context binding and history.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use proptest::prelude::*;
use statetree::builder::{CoordinatorBuilder, StateBuilder};
use statetree::coordinator::{StateCoordinator, StateError};
use statetree::core::{StateHistory, StateTransition};

type Log = Vec<String>;

const LEAVES: [&str; 4] = [
    "poweredDown.charging",
    "poweredDown.charged",
    "poweredUp.mobile",
    "poweredUp.stationary",
];

/// A state that logs its hooks into the coordinator's environment.
fn logged(name: &str) -> StateBuilder<u32, Log> {
    let (enter, exit, setup) = (name.to_string(), name.to_string(), name.to_string());
    StateBuilder::<u32, Log>::new()
        .on_enter(move |c| {
            c.env_mut().push(format!("enter:{enter}"));
            Ok(())
        })
        .on_exit(move |c| {
            c.env_mut().push(format!("exit:{exit}"));
            Ok(())
        })
        .on_setup(move |c, context| {
            let entry = match context {
                Some(value) => format!("setup:{setup}({value})"),
                None => format!("setup:{setup}"),
            };
            c.env_mut().push(entry);
            Ok(())
        })
}

fn power() -> StateCoordinator<u32, Log> {
    CoordinatorBuilder::new()
        .initial_state("poweredDown")
        .state(
            "poweredDown",
            logged("poweredDown")
                .state("charging", logged("charging"))
                .state("charged", logged("charged")),
        )
        .state(
            "poweredUp",
            logged("poweredUp")
                .state("mobile", logged("mobile"))
                .state("stationary", logged("stationary")),
        )
        .build(Vec::new())
        .unwrap()
}

//  root
//  ├─ detail
//  ├─ a
//  │  ├─ detail
//  │  └─ b
//  │     ├─ detail
//  │     └─ c
//  └─ z
fn nested() -> StateCoordinator<u32, Log> {
    CoordinatorBuilder::new()
        .state("detail", StateBuilder::new())
        .state(
            "a",
            StateBuilder::new().state("detail", StateBuilder::new()).state(
                "b",
                StateBuilder::new()
                    .state("detail", StateBuilder::new())
                    .state("c", StateBuilder::new()),
            ),
        )
        .state("z", StateBuilder::new())
        .build(Vec::new())
        .unwrap()
}

/// `s1.s2...sN`, each state logging its hooks.
fn chain(depth: usize) -> StateCoordinator<u32, Log> {
    let mut state = logged(&format!("s{depth}"));
    for level in (1..depth).rev() {
        state = logged(&format!("s{level}")).state(format!("s{}", level + 1), state);
    }
    CoordinatorBuilder::new()
        .state("s1", state)
        .build(Vec::new())
        .unwrap()
}

fn chain_path(depth: usize) -> String {
    (1..=depth)
        .map(|level| format!("s{level}"))
        .collect::<Vec<_>>()
        .join(".")
}

fn transition(from: Option<&str>, to: &str) -> StateTransition {
    StateTransition {
        from: from.map(str::to_string),
        to: to.to_string(),
        exited: from.map(str::to_string).into_iter().collect(),
        entered: vec![to.to_string()],
        timestamp: Utc::now(),
    }
}

proptest! {
    #[test]
    fn reentering_current_leaf_is_idempotent(
        leaf in prop::sample::select(LEAVES.to_vec()),
        context in prop::option::of(any::<u32>())
    ) {
        let mut coordinator = power();
        let contexts: Vec<u32> = context.into_iter().collect();

        coordinator.transition_to_with(leaf, contexts.clone()).unwrap();
        coordinator.env_mut().clear();
        coordinator.transition_to_with(leaf, contexts).unwrap();

        prop_assert!(coordinator.env().is_empty());
        let current = coordinator.current_path();
        prop_assert_eq!(current.as_deref(), Some(leaf));
    }

    #[test]
    fn relative_paths_resolve_under_nearest_ancestor(
        start in prop::sample::select(vec!["a.b.c", "a.b.detail", "a.detail", "detail", "z"]),
        path in prop::sample::select(vec!["detail", "c", "b.c", "a.detail", "z"])
    ) {
        let mut coordinator = nested();
        coordinator.transition_to(start).unwrap();
        let from = coordinator.current_state().unwrap();
        let expected = coordinator.find_state_by_path(from, path);

        let result = coordinator.transition_to(path);

        match expected {
            Some(state) => {
                prop_assert_eq!(result, Ok(()));
                prop_assert_eq!(coordinator.current_state(), Some(state));
            }
            None => {
                let failed_with_unknown_path =
                    matches!(result, Err(StateError::UnknownPath { .. }));
                prop_assert!(failed_with_unknown_path);
                prop_assert_eq!(coordinator.current_state(), Some(from));
            }
        }
    }

    #[test]
    fn repeated_resolution_is_served_from_cache(round_trips in 1usize..20) {
        let mut coordinator = power();
        coordinator.transition_to("poweredDown.charging").unwrap();
        let initial = coordinator.planner_stats();

        for _ in 0..round_trips {
            coordinator.transition_to("poweredUp.mobile").unwrap();
            coordinator.transition_to("poweredDown.charging").unwrap();
        }

        let stats = coordinator.planner_stats();
        // charging -> mobile and mobile -> charging, once each.
        prop_assert_eq!(stats.computed - initial.computed, 2);
        prop_assert_eq!(stats.cache_hits - initial.cache_hits, 2 * round_trips - 2);
    }

    #[test]
    fn surplus_contexts_reenter_one_ancestor_each(
        depth in 1usize..6,
        contexts in prop::collection::vec(any::<u32>(), 1..6)
    ) {
        let mut coordinator = chain(depth);
        coordinator.transition_to(&chain_path(depth)).unwrap();
        coordinator.env_mut().clear();

        let count = contexts.len();
        let result = coordinator.transition_to_with(&format!("s{depth}"), contexts.clone());

        if count > depth {
            let overflowed = matches!(result, Err(StateError::ContextOverflow { .. }));
            prop_assert!(overflowed);
            prop_assert!(coordinator.env().is_empty());
            return Ok(());
        }
        prop_assert_eq!(result, Ok(()));

        let reentered: Vec<usize> = (depth - count + 1..=depth).collect();
        let mut expected: Vec<String> = reentered
            .iter()
            .rev()
            .map(|level| format!("exit:s{level}"))
            .collect();
        expected.extend(reentered.iter().map(|level| format!("enter:s{level}")));
        expected.extend(
            reentered
                .iter()
                .zip(&contexts)
                .map(|(level, context)| format!("setup:s{level}({context})")),
        );

        prop_assert_eq!(coordinator.env(), &expected);
        prop_assert_eq!(coordinator.current_path(), Some(chain_path(depth)));
    }

    #[test]
    fn history_follows_settled_states(
        targets in prop::collection::vec(prop::sample::select(LEAVES.to_vec()), 1..10)
    ) {
        let mut coordinator = power();
        for target in &targets {
            coordinator.transition_to(target).unwrap();
        }

        let mut expected = vec!["poweredDown"];
        for target in &targets {
            if expected.last() != Some(target) {
                expected.push(*target);
            }
        }

        prop_assert_eq!(coordinator.history().get_path(), expected);
    }

    #[test]
    fn history_record_is_pure(
        targets in prop::collection::vec(prop::sample::select(LEAVES.to_vec()), 1..5)
    ) {
        let mut history = StateHistory::new();
        let mut from = None;
        for target in &targets {
            let snapshot = history.clone();
            let before = snapshot.transitions().clone();
            history = snapshot.record(transition(from, target));
            from = Some(*target);

            // Original history unchanged, and a prefix of the new one
            prop_assert_eq!(snapshot.transitions(), &before);
            prop_assert_eq!(snapshot.len() + 1, history.len());
            let prefix: Vec<_> = history.transitions().iter().take(snapshot.len()).collect();
            let original: Vec<_> = snapshot.transitions().iter().collect();
            prop_assert_eq!(prefix, original);
        }

        prop_assert_eq!(history.transitions().len(), targets.len());
    }
}
