//! Statetree: a hierarchical state machine engine
//!
//! States form a tree. A coordinator tracks the current state, moves between
//! states by dot-separated paths and dispatches named events that bubble from
//! the current state up to the root.
//!
//! # Core Concepts
//!
//! - **Tree**: an arena of named [`StateNode`](core::StateNode)s, frozen after construction
//! - **Transitions**: exit the old branch deepest-first, enter the new branch
//!   shallowest-first, then fire `setup` with each entered state's context
//! - **Contexts**: caller values bound to entered states; re-entering a state
//!   with an unchanged context is skipped
//! - **Events**: handled by the nearest state that responds, with an
//!   `unhandledEvent` fallback
//!
//! # Example
//!
//! ```rust
//! use statetree::builder::{CoordinatorBuilder, StateBuilder};
//! use statetree::coordinator::StateError;
//!
//! type Power = StateBuilder<(), Vec<String>>;
//!
//! let mut coordinator = CoordinatorBuilder::new()
//!     .initial_state("poweredDown")
//!     .state(
//!         "poweredDown",
//!         Power::new()
//!             .on_exit(|c| {
//!                 c.env_mut().push("exit poweredDown".into());
//!                 Ok(())
//!             })
//!             .state("charging", Power::new())
//!             .state("charged", Power::new()),
//!     )
//!     .state(
//!         "poweredUp",
//!         Power::new()
//!             .on_enter(|c| {
//!                 c.env_mut().push("enter poweredUp".into());
//!                 Ok(())
//!             })
//!             .transition_on("unplug", "mobile")
//!             .state("mobile", Power::new())
//!             .state("stationary", Power::new()),
//!     )
//!     .build(Vec::new())
//!     .unwrap();
//!
//! coordinator.transition_to("poweredUp.stationary").unwrap();
//! assert_eq!(coordinator.env(), &vec!["exit poweredDown", "enter poweredUp"]);
//!
//! coordinator.send("unplug", &[]).unwrap();
//! assert_eq!(coordinator.current_path().as_deref(), Some("poweredUp.mobile"));
//!
//! assert!(matches!(
//!     coordinator.send("charge", &[]),
//!     Err(StateError::UnhandledEvent { .. })
//! ));
//! ```

pub mod builder;
pub mod coordinator;
pub mod core;
pub mod lifecycle;
pub mod transition;

// Re-export commonly used types
pub use builder::{BuildError, CoordinatorBuilder, StateBuilder};
pub use coordinator::{CoordinatorConfig, StateCoordinator, StateError};
pub use crate::core::{StateHistory, StateId, StateTransition, StateTree};
pub use transition::CoordinatorId;
