//! CLI command implementations

pub mod completions;
pub mod config;
pub mod edge;
pub mod label;
pub mod locate;
pub mod node;
pub mod search;
