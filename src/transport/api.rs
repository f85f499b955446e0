use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::errors::TransportError;

/// Result alias for raw transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Node metadata returned by reads and existence checks.
///
/// `version` is the optimistic-concurrency token: conditional writes carry
/// the version the caller last observed and fail with
/// [`TransportError::VersionConflict`] when it is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStat {
    /// Data version, incremented by the service on every write
    pub version: i32,
    /// Number of direct children
    pub num_children: u32,
    /// Whether the node is bound to a session lifetime
    pub ephemeral: bool,
}

/// Primitive operation set of the remote coordination service.
///
/// Implementations own transport-level concerns end to end: endpoint
/// resolution, exponential-backoff reconnects and request retries are opaque
/// to the engine, which only reacts to the resulting
/// [`ConnectionState`](crate::ConnectionState) notifications.
///
/// # Watch semantics
///
/// `get_data` with `watch = true` registers a one-shot watch: the transport
/// delivers at most one [`NodeEvent`](crate::NodeEvent) for the path on its
/// event channel, after which the caller must re-register by reading again.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CoordinationClient: Send + Sync + 'static {
    /// Establish the connection. Implementations apply their own retry
    /// policy; an error here means that policy is exhausted.
    async fn connect(&self, hosts: &str) -> TransportResult<()>;

    async fn exists(&self, path: &str) -> TransportResult<bool>;

    /// Create a persistent node. Fails with
    /// [`TransportError::NodeExists`] when the path is already present;
    /// callers racing to create the same path treat that as success.
    async fn create_persistent(&self, path: &str, data: &[u8]) -> TransportResult<()>;

    /// Create an ephemeral node bound to this session.
    ///
    /// Returns `Some(created_path)` on creation, `None` when the node
    /// already existed (in which case no write happened).
    async fn create_ephemeral(&self, path: &str, data: &[u8]) -> TransportResult<Option<String>>;

    /// Conditional write: succeeds only when `expected_version` matches the
    /// node's current version, returning the new version.
    async fn set_data(&self, path: &str, data: &[u8], expected_version: i32)
        -> TransportResult<i32>;

    /// Read a node's payload and stat. With `watch = true` a one-shot watch
    /// is registered on the path as part of the same round-trip.
    async fn get_data(&self, path: &str, watch: bool) -> TransportResult<(Vec<u8>, NodeStat)>;

    /// List direct children in the order the service maintains them.
    async fn children(&self, path: &str) -> TransportResult<Vec<String>>;

    /// Release the connection. Ephemeral nodes created by this session are
    /// removed by the service.
    async fn close(&self) -> TransportResult<()>;
}
