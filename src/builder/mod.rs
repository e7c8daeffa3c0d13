//! Builder API for assembling hierarchies.
//!
//! [`StateBuilder`] describes one state and its subtree; [`CoordinatorBuilder`]
//! wraps the root and produces a running [`StateCoordinator`](crate::coordinator::StateCoordinator).
//! Names, duplicates and initial states are validated when the tree is built.

mod coordinator;
mod error;
mod state;

pub use coordinator::CoordinatorBuilder;
pub use error::BuildError;
pub use state::StateBuilder;
