//! Storage backend trait definitions

use crate::error::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use circuity_core::{Edge, Metadata, NodeStore};
use serde::{Deserialize, Serialize};

/// A label registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub label: char,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl LabelEntry {
    pub fn new(label: char, address: impl Into<String>) -> Self {
        Self {
            label,
            address: address.into(),
            created_at: Utc::now(),
        }
    }
}

/// Fresh node address
pub fn new_address() -> String {
    ulid::Ulid::new().to_string()
}

/// Write access to a node graph on top of the read capability searches use
#[async_trait]
pub trait GraphBackend: NodeStore {
    /// Create or replace the node at `address`
    async fn put_node(&self, address: &str, metadata: &Metadata) -> StorageResult<()>;

    /// Raw metadata of a node
    async fn node_metadata(&self, address: &str) -> StorageResult<Option<Metadata>>;

    /// Add (or repoint) an edge on an existing node
    async fn add_edge(&self, from: &str, edge: &Edge) -> StorageResult<()>;

    /// All node addresses, sorted
    async fn list_nodes(&self) -> StorageResult<Vec<String>>;

    /// All label registry entries, sorted by label
    async fn list_labels(&self) -> StorageResult<Vec<LabelEntry>>;

    /// Create an empty node under a fresh address
    async fn create_node(&self) -> StorageResult<String> {
        let address = new_address();
        self.put_node(&address, &Metadata::new()).await?;
        Ok(address)
    }
}
