//! In-memory node store for tests and scratch graphs

use crate::error::{StorageError, StorageResult};
use crate::traits::{new_address, GraphBackend, LabelEntry};
use async_trait::async_trait;
use circuity_core::codec;
use circuity_core::{Edge, EdgeSet, Metadata, NodeStore};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

fn lock_error<T>(e: PoisonError<T>) -> StorageError {
    StorageError::Database(format!("Lock error: {}", e))
}

/// In-memory node store
///
/// Label creation happens under the registry write lock, so concurrent
/// callers for one label all observe the same node.
#[derive(Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<BTreeMap<String, Metadata>>,
    labels: RwLock<BTreeMap<char, LabelEntry>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for fixtures: add a node with the given edges
    pub fn with_node(self, address: &str, edges: Vec<Edge>) -> StorageResult<Self> {
        let set: EdgeSet = edges.into_iter().collect();
        self.nodes
            .write()
            .map_err(lock_error)?
            .insert(address.to_string(), set.to_metadata());
        Ok(self)
    }
}

#[async_trait]
impl GraphBackend for MemoryNodeStore {
    async fn put_node(&self, address: &str, metadata: &Metadata) -> StorageResult<()> {
        let mut nodes = self.nodes.write().map_err(lock_error)?;
        nodes.insert(address.to_string(), metadata.clone());
        Ok(())
    }

    async fn node_metadata(&self, address: &str) -> StorageResult<Option<Metadata>> {
        let nodes = self.nodes.read().map_err(lock_error)?;
        Ok(nodes.get(address).cloned())
    }

    async fn add_edge(&self, from: &str, edge: &Edge) -> StorageResult<()> {
        let mut nodes = self.nodes.write().map_err(lock_error)?;
        let metadata = nodes
            .get_mut(from)
            .ok_or_else(|| StorageError::NodeNotFound(from.to_string()))?;
        let (key, value) = codec::encode(edge);
        metadata.insert(key, value);
        Ok(())
    }

    async fn list_nodes(&self) -> StorageResult<Vec<String>> {
        let nodes = self.nodes.read().map_err(lock_error)?;
        Ok(nodes.keys().cloned().collect())
    }

    async fn list_labels(&self) -> StorageResult<Vec<LabelEntry>> {
        let labels = self.labels.read().map_err(lock_error)?;
        Ok(labels.values().cloned().collect())
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn get_edge_set(&self, address: &str) -> circuity_core::Result<EdgeSet> {
        let metadata = self
            .node_metadata(address)
            .await?
            .ok_or_else(|| StorageError::NodeNotFound(address.to_string()))?;
        Ok(EdgeSet::from_metadata(&metadata))
    }

    async fn create_label_node(&self, label: char) -> circuity_core::Result<String> {
        let mut labels = self.labels.write().map_err(lock_error)?;
        if let Some(entry) = labels.get(&label) {
            return Ok(entry.address.clone());
        }

        let address = new_address();
        self.nodes
            .write()
            .map_err(lock_error)?
            .insert(address.clone(), Metadata::new());
        labels.insert(label, LabelEntry::new(label, address.clone()));
        tracing::debug!("Registered label '{}' at {}", label, address);
        Ok(address)
    }

    async fn lookup_label(&self, label: char) -> circuity_core::Result<Option<String>> {
        let labels = self.labels.read().map_err(lock_error)?;
        Ok(labels.get(&label).map(|e| e.address.clone()))
    }
}
