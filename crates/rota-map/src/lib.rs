//! Schema/column mapping: built once per configuration load, immutable
//! thereafter.

pub mod manager;
pub mod suggest;

pub use manager::{ColumnCollision, MappedColumns, SchemaManager};
pub use suggest::suggest_field_name;
