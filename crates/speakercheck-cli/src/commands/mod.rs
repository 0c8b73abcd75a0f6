//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod devices;
pub mod generate;
pub mod history;
pub mod measure;
