//! Pure, total, per-value normalization rules.
//!
//! Every function here returns a neutral default for malformed input and
//! never panics. Text cleaning and date stripping are idempotent, which
//! keeps canonical reshaping stable when a dataset is reprojected.

pub mod dates;
pub mod fields;
pub mod text;

pub use dates::{Slot, clean_date, get_service_week, infer_service_slot, strip_embedded_dates};
pub use fields::{clean_name, clean_scripture, merge_columns, split_songs};
pub use text::clean_text;
