//! File-backed edges of the pipeline: the CSV source, the canonical
//! and domain sinks, and the alias/state stores.

mod atomic;

pub mod alias_csv;
pub mod sinks;
pub mod state_json;
pub mod table;

pub use alias_csv::CsvAliasStore;
pub use sinks::{CanonicalSink, CsvCanonicalSink, DomainSink, JsonDomainSink};
pub use state_json::JsonStateStore;
pub use table::{CsvSource, SourceTable, TabularSource, read_csv_table};
