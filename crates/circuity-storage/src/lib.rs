//! Circuity Storage - Node graph backends
//!
//! This crate provides the stores that back circuit searches: an in-memory
//! graph and a persistent ReDB database, both carrying the label registry.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryNodeStore;
pub use traits::{new_address, GraphBackend, LabelEntry};

#[cfg(feature = "redb")]
pub use self::redb::RedbNodeStore;
