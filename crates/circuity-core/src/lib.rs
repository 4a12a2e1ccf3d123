//! Circuity Core - Circuit search over labeled, weighted node graphs
//!
//! This crate provides the edge codec, the node store capability and the
//! search engine that finds a circuit through an origin node and the node a
//! label points at.

pub mod cancel;
pub mod circuit;
pub mod codec;
pub mod config;
pub mod edge;
pub mod engine;
pub mod error;
pub mod limits;
pub mod locate;
pub mod selector;
pub mod store;
pub mod walk;

#[cfg(test)]
mod testing;

pub use cancel::CancelToken;
pub use circuit::{CircuitSearcher, FailureReason, Phase, SearchResult, SearchStatus};
pub use config::SearchConfig;
pub use edge::{Direction, Edge, EdgeSet, Metadata};
pub use engine::{CircuitEngine, CircuitRequest};
pub use error::{Error, Result};
pub use locate::{Candidate, LabelLocator};
pub use selector::{SelectionPolicy, WeightedSelector};
pub use store::NodeStore;
pub use walk::{WalkEngine, WalkQuery, WalkResult, WalkStatus};
