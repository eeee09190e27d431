//! Utility functions for number and string formatting.

pub mod format;

pub use format::{amount_line, format_amount, sanitize_file_name, truncate_string};
