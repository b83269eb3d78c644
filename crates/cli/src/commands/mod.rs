//! CLI command implementations.

pub mod cache;
pub mod import;
pub mod migrate;
