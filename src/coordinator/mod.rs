//! Running a hierarchy.
//!
//! [`StateCoordinator`] owns the mutable side of one running hierarchy and
//! executes normalized transitions. [`EventRouter`] delivers events along the
//! ancestor chain of the current state.

mod config;
mod error;
mod machine;
mod meta;
mod router;

pub use config::CoordinatorConfig;
pub use error::StateError;
pub use machine::StateCoordinator;
pub use meta::{StateMeta, StateMetaTable};
pub use router::{EventRouter, UNHANDLED_EVENT};
