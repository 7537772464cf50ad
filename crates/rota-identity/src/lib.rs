//! Alias-based identity resolution.
//!
//! One [`AliasMapper`] snapshot serves a whole pipeline run; discoveries
//! made during the run are buffered as name counts and merged back to
//! the external store only after the canonical dataset is produced.

pub mod guess;
pub mod mapper;
pub mod store;

pub use guess::guess_name_columns;
pub use mapper::{AliasMapper, PersonIdentity, SwapRepairPolicy, SyncOutcome};
pub use store::{AliasRow, AliasStore};
