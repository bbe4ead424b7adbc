//! Output Formatting
//!
//! Human-readable and JSON renderings of a generation report.

pub mod json;
pub mod table;
