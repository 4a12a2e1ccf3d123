//! ReDB storage backend

use crate::error::{StorageError, StorageResult};
use crate::traits::{new_address, GraphBackend, LabelEntry};
use async_trait::async_trait;
use circuity_core::codec;
use circuity_core::{Edge, EdgeSet, Metadata, NodeStore};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;

// Table definitions
const NODES: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");
const LABELS: TableDefinition<&str, &[u8]> = TableDefinition::new("labels");

/// ReDB-backed node graph with its label registry
///
/// Nodes map an address to JSON-encoded metadata. The registry maps a label
/// to a [`LabelEntry`]; entries are insert-only.
pub struct RedbNodeStore {
    db: Database,
}

impl RedbNodeStore {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;

        // Initialize tables
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(NODES)?;
            write_txn.open_table(LABELS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn read_node(&self, address: &str) -> StorageResult<Option<Metadata>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NODES)?;
        let metadata = match table.get(address)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(metadata)
    }

    fn read_label(&self, label: char) -> StorageResult<Option<LabelEntry>> {
        let key = label.to_string();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LABELS)?;
        let entry = match table.get(key.as_str())? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(entry)
    }

    /// Check-and-insert in one write transaction
    fn register_label(&self, label: char) -> StorageResult<String> {
        let key = label.to_string();
        let write_txn = self.db.begin_write()?;
        let address = {
            let mut labels = write_txn.open_table(LABELS)?;
            let existing: Option<LabelEntry> = match labels.get(key.as_str())? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };

            match existing {
                Some(entry) => entry.address,
                None => {
                    let address = new_address();
                    let entry = LabelEntry::new(label, address.clone());
                    labels.insert(key.as_str(), serde_json::to_vec(&entry)?.as_slice())?;

                    let mut nodes = write_txn.open_table(NODES)?;
                    let empty = serde_json::to_vec(&Metadata::new())?;
                    nodes.insert(address.as_str(), empty.as_slice())?;
                    tracing::info!("Registered label '{}' at {}", label, address);
                    address
                }
            }
        };
        write_txn.commit()?;
        Ok(address)
    }
}

#[async_trait]
impl GraphBackend for RedbNodeStore {
    async fn put_node(&self, address: &str, metadata: &Metadata) -> StorageResult<()> {
        if address.is_empty() {
            return Err(StorageError::InvalidAddress("empty address".to_string()));
        }
        let value = serde_json::to_vec(metadata)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(NODES)?;
            table.insert(address, value.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn node_metadata(&self, address: &str) -> StorageResult<Option<Metadata>> {
        self.read_node(address)
    }

    async fn add_edge(&self, from: &str, edge: &Edge) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(NODES)?;
            let mut metadata: Metadata = match table.get(from)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StorageError::NodeNotFound(from.to_string())),
            };
            let (key, value) = codec::encode(edge);
            metadata.insert(key, value);
            table.insert(from, serde_json::to_vec(&metadata)?.as_slice())?;
        }
        write_txn.commit()?;

        tracing::debug!("Added edge {} on {}", edge.key(), from);
        Ok(())
    }

    async fn list_nodes(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NODES)?;

        let mut addresses = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            addresses.push(key.value().to_string());
        }

        Ok(addresses)
    }

    async fn list_labels(&self) -> StorageResult<Vec<LabelEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LABELS)?;

        let mut labels = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            labels.push(serde_json::from_slice(value.value())?);
        }

        Ok(labels)
    }
}

#[async_trait]
impl NodeStore for RedbNodeStore {
    async fn get_edge_set(&self, address: &str) -> circuity_core::Result<EdgeSet> {
        let metadata = self
            .read_node(address)?
            .ok_or_else(|| StorageError::NodeNotFound(address.to_string()))?;
        Ok(EdgeSet::from_metadata(&metadata))
    }

    async fn create_label_node(&self, label: char) -> circuity_core::Result<String> {
        Ok(self.register_label(label)?)
    }

    async fn lookup_label(&self, label: char) -> circuity_core::Result<Option<String>> {
        Ok(self.read_label(label)?.map(|entry| entry.address))
    }
}
