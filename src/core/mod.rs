//! Core module - project layout, grammar, queries and edits

pub mod config;
pub mod grammar;
pub mod loader;
pub mod project;
pub mod query;
pub mod update;

pub use config::{Config, ConfigError};
pub use grammar::{Grammar, TraceGrammar};
pub use project::{Project, ProjectError};
pub use query::{Coverage, Query, QueryError, RequirementCoverage};
pub use update::{EditError, UpdateError, Updater};
