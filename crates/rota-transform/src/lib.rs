//! Reshaping of cleaned rows into the canonical dataset, plus the
//! audience-specific domain projections built on top of it.

pub mod canonical;
pub mod domains;

pub use canonical::{CanonicalOutput, Canonicalizer};
pub use domains::{DomainKind, DomainOptions, DomainProjector};
