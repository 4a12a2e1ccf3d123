//! Single-phase directed walks
//!
//! One walk follows edges of the requested directions from a start node,
//! one selected edge per step, until the stop predicate matches (`Found`),
//! the current node has no eligible edge (`Blocked`) or the step limit is
//! spent (`LimitReached`). Every phase of a circuit search is a walk.

use crate::cancel::CancelToken;
use crate::edge::Direction;
use crate::error::{Error, Result};
use crate::selector::WeightedSelector;
use crate::store::NodeStore;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Walk parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkQuery {
    /// Starting node address
    pub start: String,

    /// Directions eligible at every step
    pub directions: Vec<Direction>,

    /// Maximum number of steps
    #[serde(default = "default_step_limit")]
    pub step_limit: usize,
}

fn default_step_limit() -> usize {
    100
}

impl WalkQuery {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            directions: Direction::ALL.to_vec(),
            step_limit: default_step_limit(),
        }
    }

    pub fn with_directions(mut self, directions: &[Direction]) -> Self {
        self.directions = directions.to_vec();
        self
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }
}

/// Terminal state of a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkStatus {
    /// The stop predicate matched the last node
    Found,
    /// The last node has no eligible edge
    Blocked,
    /// The step limit was spent first
    LimitReached,
}

/// Outcome of a walk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkResult {
    pub status: WalkStatus,

    /// Start address (not part of `path`)
    pub start: String,

    /// Addresses visited after the start, in order
    pub path: Vec<String>,
}

impl WalkResult {
    /// Address the walk ended on
    pub fn end(&self) -> &str {
        self.path.last().unwrap_or(&self.start)
    }

    pub fn steps(&self) -> usize {
        self.path.len()
    }
}

/// Stepping primitive over a [`NodeStore`]
pub struct WalkEngine<'a, S: NodeStore + ?Sized> {
    store: &'a S,
    selector: WeightedSelector,
    cancel: &'a CancelToken,
}

impl<'a, S: NodeStore + ?Sized> WalkEngine<'a, S> {
    pub fn new(store: &'a S, selector: WeightedSelector, cancel: &'a CancelToken) -> Self {
        Self {
            store,
            selector,
            cancel,
        }
    }

    /// Execute a walk
    ///
    /// Store errors propagate: `NotFound` when the current node is absent,
    /// `Unavailable` on backend failure, and `Cancelled` when the token fires.
    pub async fn walk<R, F>(&self, query: &WalkQuery, stop_when: F, rng: &mut R) -> Result<WalkResult>
    where
        R: Rng + Send + ?Sized,
        F: Fn(&str) -> bool + Send + Sync,
    {
        tracing::trace!(
            "Walking from {} over {:?}, limit {}",
            query.start,
            query.directions,
            query.step_limit
        );

        let mut current = query.start.clone();
        let mut path: Vec<String> = Vec::new();

        let status = loop {
            self.cancel.check()?;
            // No budget: nothing to fetch or draw for
            if query.step_limit == 0 {
                break WalkStatus::LimitReached;
            }
            let edges = self.cancel.run(self.store.get_edge_set(&current)).await?;

            let candidates = edges.by_direction(&query.directions).filter(|e| {
                // A step must leave the current node
                if e.destination == current {
                    tracing::debug!("Ignoring self-loop edge {} on {}", e.key(), current);
                    false
                } else {
                    true
                }
            });

            let next = match self.selector.select(candidates, rng) {
                Ok(edge) => edge.destination.clone(),
                Err(Error::NoCandidateEdges) => break WalkStatus::Blocked,
                Err(e) => return Err(e),
            };

            if path.len() >= query.step_limit {
                break WalkStatus::LimitReached;
            }

            path.push(next.clone());
            current = next;

            if stop_when(&current) {
                break WalkStatus::Found;
            }
        };

        tracing::trace!("Walk from {} ended {:?} after {} steps", query.start, status, path.len());

        Ok(WalkResult {
            status,
            start: query.start.clone(),
            path,
        })
    }
}
