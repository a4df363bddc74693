//! Shared utility functions.
//!
//! - String truncation (UTF-8 safe)
//! - Percentage rounding for progress display

mod format;
mod string;

pub use format::ratio_to_percent_u8;
pub use string::{truncate_chars, truncate_str};
