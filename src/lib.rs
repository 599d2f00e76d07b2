//! minispec: traceability between requirements, design and code
//!
//! Requirements, CRC cards, the design ledger and annotated source files are
//! plain markdown/text under version control. This crate extracts a narrow
//! line-oriented projection of them, answers coverage and traceability
//! queries, validates cross-reference integrity and applies single-line
//! edits that leave the rest of each file untouched.

pub mod cli;
pub mod core;
pub mod entities;
pub mod validate;
