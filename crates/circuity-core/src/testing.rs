//! In-crate graph fixture for unit tests

use crate::edge::{Direction, Edge, EdgeSet, Metadata};
use crate::error::{Error, Result};
use crate::store::NodeStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

pub(crate) fn edge(direction: Direction, label: char, weight: f64, to: &str) -> Edge {
    Edge::new(direction, label, weight, to)
}

#[derive(Default)]
pub(crate) struct FixtureStore {
    nodes: RwLock<HashMap<String, Metadata>>,
    labels: RwLock<HashMap<char, String>>,
    unavailable: HashSet<String>,
    hanging: HashSet<String>,
    fetches: AtomicUsize,
    creations: AtomicUsize,
}

impl FixtureStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn node(self, address: &str, edges: Vec<Edge>) -> Self {
        let set: EdgeSet = edges.into_iter().collect();
        self.nodes
            .write()
            .unwrap()
            .insert(address.to_string(), set.to_metadata());
        self
    }

    pub(crate) fn raw_node(self, address: &str, metadata: Metadata) -> Self {
        self.nodes
            .write()
            .unwrap()
            .insert(address.to_string(), metadata);
        self
    }

    pub(crate) fn unavailable(mut self, address: &str) -> Self {
        self.unavailable.insert(address.to_string());
        self
    }

    /// Fetches of `address` never complete
    pub(crate) fn hanging(mut self, address: &str) -> Self {
        self.hanging.insert(address.to_string());
        self
    }

    pub(crate) fn label(self, label: char, address: &str) -> Self {
        self.labels
            .write()
            .unwrap()
            .insert(label, address.to_string());
        self
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeStore for FixtureStore {
    async fn get_edge_set(&self, address: &str) -> Result<EdgeSet> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.contains(address) {
            return Err(Error::Unavailable(format!("fixture refuses {}", address)));
        }
        if self.hanging.contains(address) {
            std::future::pending::<()>().await;
        }
        let nodes = self.nodes.read().unwrap();
        nodes
            .get(address)
            .map(EdgeSet::from_metadata)
            .ok_or_else(|| Error::NotFound(address.to_string()))
    }

    async fn create_label_node(&self, label: char) -> Result<String> {
        let mut labels = self.labels.write().unwrap();
        if let Some(address) = labels.get(&label) {
            return Ok(address.clone());
        }
        let address = format!("fixture://labels/{}", label);
        self.nodes
            .write()
            .unwrap()
            .insert(address.clone(), Metadata::new());
        labels.insert(label, address.clone());
        self.creations.fetch_add(1, Ordering::SeqCst);
        Ok(address)
    }

    async fn lookup_label(&self, label: char) -> Result<Option<String>> {
        Ok(self.labels.read().unwrap().get(&label).cloned())
    }
}
