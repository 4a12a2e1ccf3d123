//! Edge (decoded metadata entry) types

use crate::codec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Raw node metadata: encoded edge key -> destination value
pub type Metadata = BTreeMap<String, String>;

/// Direction of an edge, used to filter edges per search phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Forward,
    Backward,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Forward,
        Direction::Backward,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "forward" | "forwards" => Ok(Self::Forward),
            "backward" | "backwards" => Ok(Self::Backward),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// A directed, weighted, labeled edge to another node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub direction: Direction,

    /// Single-character label
    pub label: char,

    /// Selection weight (finite, non-negative)
    pub weight: f64,

    /// Observation count carried by the key, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    /// Destination node address
    pub destination: String,
}

impl Edge {
    pub fn new(
        direction: Direction,
        label: char,
        weight: f64,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            direction,
            label,
            weight,
            count: None,
            destination: destination.into(),
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Canonical metadata key for this edge
    pub fn key(&self) -> String {
        codec::encode_key(self)
    }

    fn identity(&self) -> (Direction, char, u64) {
        (self.direction, self.label, self.weight.to_bits())
    }
}

/// The outgoing edges of one node
///
/// Edges are unique by `(direction, label, weight)` and kept in the order of
/// their metadata keys, so selection under a fixed seed is reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeSet {
    edges: Vec<Edge>,
}

impl EdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a node's metadata, dropping entries that do not decode.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mut set = Self::new();
        for (key, value) in metadata {
            match codec::decode(key, value) {
                Ok(edge) => {
                    if !set.insert(edge) {
                        tracing::warn!("Skipping duplicate edge entry '{}'", key);
                    }
                }
                Err(e) => tracing::warn!("Skipping metadata entry: {}", e),
            }
        }
        set
    }

    /// Insert an edge; returns false when an edge with the same
    /// direction, label and weight is already present.
    pub fn insert(&mut self, edge: Edge) -> bool {
        let identity = edge.identity();
        if self.edges.iter().any(|e| e.identity() == identity) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.edges.iter()
    }

    /// Edges whose direction is one of `directions`
    pub fn by_direction<'a>(
        &'a self,
        directions: &'a [Direction],
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .iter()
            .filter(move |e| directions.contains(&e.direction))
    }

    /// Edges carrying `label`, in any direction
    pub fn by_label(&self, label: char) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |e| e.label == label)
    }

    /// Re-encode as metadata
    pub fn to_metadata(&self) -> Metadata {
        self.edges.iter().map(codec::encode).collect()
    }
}

impl FromIterator<Edge> for EdgeSet {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut set = Self::new();
        for edge in iter {
            set.insert(edge);
        }
        set
    }
}

impl<'a> IntoIterator for &'a EdgeSet {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}
