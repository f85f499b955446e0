//! Watch Engine Error Hierarchy
//!
//! Defines the error types for the watch/session coordination engine,
//! categorized by subsystem: session lifecycle, watch lifecycle, and the
//! coordination-service transport boundary.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session lifecycle failures (connect, write, teardown)
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Watch lifecycle failures (arming, reload dispatch)
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Raw coordination-service transport failures
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The underlying transport could not be established after its own
    /// retry policy exhausted
    #[error("cannot connect to coordination service at {hosts}")]
    ConnectError {
        hosts: String,
        #[source]
        source: TransportError,
    },

    /// Operation attempted after `close()` or before `connect()`
    #[error("session is not connected")]
    NotConnected,

    /// Optimistic-versioned write kept conflicting after the single retry
    #[error("version conflict writing {path} persisted after retry")]
    WriteConflict { path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The watched read that arms a one-shot watch failed; the watcher
    /// stays unarmed until the next reconnect sweep re-arms it
    #[error("cannot arm watch on {path}")]
    ArmError {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// Application reload callback reported a failure; logged and isolated
    /// per key, never propagated into event dispatch
    #[error("reload callback failed for key {key}: {reason}")]
    ReloadFailed { key: String, reason: String },
}

/// Failures surfaced by a [`CoordinationClient`](crate::CoordinationClient)
/// implementation.
///
/// `NodeExists` and `NoNode` are benign-race signals: callers racing to
/// create the same path treat `NodeExists` as success.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("node already exists: {0}")]
    NodeExists(String),

    #[error("no such node: {0}")]
    NoNode(String),

    /// Conditional write lost the race; the expected version is stale
    #[error("version conflict on {path}: expected version {expected}")]
    VersionConflict { path: String, expected: i32 },

    /// Transient connectivity loss; the transport retries internally
    #[error("connection to coordination service lost")]
    ConnectionLoss,

    /// The service invalidated this client's session
    #[error("session expired")]
    SessionExpired,

    /// Initial connection establishment failed
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Transport used before `connect()` or after `close()`
    #[error("transport is not connected")]
    NotConnected,

    /// Anything the transport cannot classify further
    #[error("coordination service error: {0}")]
    Other(String),
}

impl TransportError {
    /// True for the benign create race where another client won
    pub fn is_node_exists(&self) -> bool {
        matches!(self, TransportError::NodeExists(_))
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, TransportError::VersionConflict { .. })
    }
}

impl Error {
    /// Classifies errors that never indicate data loss and are logged at a
    /// reduced severity instead of being propagated.
    pub fn is_benign_race(&self) -> bool {
        matches!(self, Error::Transport(t) if t.is_node_exists())
    }
}
