//! Foundational low-level utilities shared across Loopwatch crates.
//!
//! Provides relative-age and fixed-decimal formatting used by status rendering,
//! plus an atomic text-write helper used for CLI report output.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use time_utils::{clamp_non_negative, current_utc, format_fixed, format_relative_age};
