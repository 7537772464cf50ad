//! CLI library components for the schedule canonicalizer.

pub mod logging;
pub mod pipeline;
