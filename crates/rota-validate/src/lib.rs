//! Dataset validation: severity-classified defects and a bounded,
//! deterministic text report. Validation never halts processing; it
//! only shapes the final success signal.

pub mod format;
pub mod validator;

pub use format::format_report;
pub use validator::Validator;
