//! CLI command implementations.

pub mod generate;
pub mod quiz_summary;
pub mod schedule;
