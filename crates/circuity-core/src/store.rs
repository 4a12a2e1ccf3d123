//! Node store capability

use crate::edge::EdgeSet;
use crate::error::Result;
use async_trait::async_trait;

/// Read/label capability over an externally stored node graph
///
/// Implementations may block on the network. Failures are reported as
/// [`Error::NotFound`](crate::Error::NotFound) for absent addresses and
/// [`Error::Unavailable`](crate::Error::Unavailable) for transient backend
/// failures; any retry policy for the latter belongs to the implementation.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Decoded outgoing edges of the node at `address`
    async fn get_edge_set(&self, address: &str) -> Result<EdgeSet>;

    /// Address of the node registered for `label`, creating and registering
    /// one if absent.
    ///
    /// Must be idempotent and atomic: concurrent callers for the same label
    /// observe a single address.
    async fn create_label_node(&self, label: char) -> Result<String>;

    /// Address registered for `label`, if any
    async fn lookup_label(&self, label: char) -> Result<Option<String>>;
}

#[async_trait]
impl<T: NodeStore + ?Sized> NodeStore for std::sync::Arc<T> {
    async fn get_edge_set(&self, address: &str) -> Result<EdgeSet> {
        (**self).get_edge_set(address).await
    }

    async fn create_label_node(&self, label: char) -> Result<String> {
        (**self).create_label_node(label).await
    }

    async fn lookup_label(&self, label: char) -> Result<Option<String>> {
        (**self).lookup_label(label).await
    }
}
