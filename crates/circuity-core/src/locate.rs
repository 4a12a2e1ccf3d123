//! Label node lookup from origin nodes

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::selector::compare_for_label;
use crate::store::NodeStore;
use serde::{Deserialize, Serialize};

/// A distinct label node and how many origins led to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Label node address
    pub address: String,

    /// Number of origins that resolved to this node
    pub count: usize,

    /// Origins that resolved to this node, in request order
    pub origins: Vec<String>,

    /// Origins with a decoded edge to this node, in request order
    #[serde(default)]
    pub linked: Vec<String>,
}

impl Candidate {
    fn new(address: String) -> Self {
        Self {
            address,
            count: 0,
            origins: Vec::new(),
            linked: Vec::new(),
        }
    }

    fn add(&mut self, origin: &str, linked: bool) {
        self.count += 1;
        self.origins.push(origin.to_string());
        if linked {
            self.linked.push(origin.to_string());
        }
    }

    /// Origin the search starts from
    ///
    /// The first origin with an edge to this node, otherwise the first origin.
    pub fn origin(&self) -> &str {
        self.linked
            .first()
            .or_else(|| self.origins.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// True when no origin has an edge here and the node came from the
    /// label registry
    pub fn registered(&self) -> bool {
        self.linked.is_empty()
    }
}

/// Resolves the node a label points at from a given start node
pub struct LabelLocator<'a, S: NodeStore + ?Sized> {
    store: &'a S,
    cancel: &'a CancelToken,
}

impl<'a, S: NodeStore + ?Sized> LabelLocator<'a, S> {
    pub fn new(store: &'a S, cancel: &'a CancelToken) -> Self {
        Self { store, cancel }
    }

    /// Destination of the highest-value edge labeled `label` on `start`
    ///
    /// This is a single hop. Ties on weight go to the greatest encoded key.
    pub async fn locate(&self, start: &str, label: char) -> Result<String> {
        self.label_edge(start, label).await?.ok_or_else(|| {
            Error::NotFound(format!("no '{}' edge on {}", label, start))
        })
    }

    async fn label_edge(&self, start: &str, label: char) -> Result<Option<String>> {
        let edges = self.cancel.run(self.store.get_edge_set(start)).await?;
        Ok(edges
            .by_label(label)
            .max_by(|a, b| compare_for_label(a, b))
            .map(|e| e.destination.clone()))
    }

    /// Resolve a label node for every origin and aggregate distinct nodes
    ///
    /// Candidates keep first-seen order. An origin with no matching edge falls
    /// back to the registered label node, which is created when missing (at
    /// most once per call). Such origins are not linked to the node, so the
    /// search prefers an origin whose edge leads there. Origins absent from
    /// the store are skipped.
    pub async fn gather(&self, origins: &[String], label: char) -> Result<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut registered: Option<String> = None;

        for origin in origins {
            let found = match self.label_edge(origin, label).await {
                Ok(found) => found,
                Err(Error::NotFound(address)) => {
                    tracing::warn!("Origin {} not found, skipping", address);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let linked = found.is_some();
            let address = match (found, &registered) {
                (Some(address), _) => address,
                (None, Some(address)) => address.clone(),
                (None, None) => {
                    let address = self.registered_node(label).await?;
                    registered = Some(address.clone());
                    address
                }
            };

            let index = match candidates.iter().position(|c| c.address == address) {
                Some(index) => index,
                None => {
                    candidates.push(Candidate::new(address));
                    candidates.len() - 1
                }
            };
            candidates[index].add(origin, linked);
        }

        tracing::debug!(
            "Label '{}' resolved to {} candidate(s) from {} origin(s)",
            label,
            candidates.len(),
            origins.len()
        );
        Ok(candidates)
    }

    async fn registered_node(&self, label: char) -> Result<String> {
        if let Some(address) = self.cancel.run(self.store.lookup_label(label)).await? {
            return Ok(address);
        }
        tracing::info!("Registering a node for label '{}'", label);
        self.cancel.run(self.store.create_label_node(label)).await
    }
}
