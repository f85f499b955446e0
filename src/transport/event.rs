use std::fmt;

/// What happened to a watched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEventKind {
    /// The node's payload was written
    DataChanged,
    /// The node was removed
    Deleted,
}

/// Connection-state notifications delivered by the transport.
///
/// `Connected` is also delivered after an automatic transport-level
/// reconnect; `Reconnected` is an explicit variant some services emit for
/// the same situation. The engine treats both identically and decides
/// "initial connect vs. reconnect" itself with an atomic was-connected flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Reconnected,
    Expired,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Reconnected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Reconnected => "Reconnected",
            ConnectionState::Expired => "Expired",
        };
        write!(f, "{}", name)
    }
}

/// A fired one-shot watch.
///
/// `kind` is `None` for state-only notifications the service attaches to a
/// registered watch (e.g. a bare disconnect with no data change).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEvent {
    /// Path the watch was registered on
    pub path: String,
    /// The node change, when there was one
    pub kind: Option<NodeEventKind>,
    /// Connection state observed at delivery time
    pub state: ConnectionState,
}

impl NodeEvent {
    pub fn data_changed(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: Some(NodeEventKind::DataChanged),
            state: ConnectionState::Connected,
        }
    }
}

/// Everything a session can deliver, multiplexed onto one channel so a
/// single dispatcher loop observes node fires and connectivity transitions
/// in the order the transport emitted them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Node(NodeEvent),
    Connection(ConnectionState),
}
