//! Utility functions for string formatting and HTML output.

pub mod format;

pub use format::{capitalize, escape_html, truncate_string};
