//! CLI command implementations

pub mod completions;
pub mod phase;
pub mod query;
pub mod update;
pub mod validate;
