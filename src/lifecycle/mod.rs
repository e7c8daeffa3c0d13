//! Record lifecycle built on the hierarchical engine.
//!
//! A [`Record`] moves through `empty`, `loading`, `loaded` and `deleted`
//! states as storage reports progress. Dirty records carry a
//! [`DirtyType`] and pass through `uncommitted`, `inFlight` and `invalid`
//! sub-states. All records on a thread share one lifecycle tree.

mod data;
mod record;
mod states;

use serde::{Deserialize, Serialize};

pub use data::{
    AttributeChange, Attributes, DirtyType, Errors, LifecycleArg, LifecycleCallback, RecordData,
};
pub use record::Record;

/// Snapshot of a record's lifecycle flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFlags {
    pub is_empty: bool,
    pub is_loading: bool,
    pub is_loaded: bool,
    pub is_dirty: bool,
    pub is_saving: bool,
    pub is_deleted: bool,
    pub is_new: bool,
    pub is_valid: bool,
    /// Set after a storage failure, cleared by a successful commit or rollback.
    pub is_error: bool,
    pub dirty_type: Option<DirtyType>,
}
