use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::errors::TransportError;
use crate::transport::ConnectionState;
use crate::transport::CoordinationClient;
use crate::transport::NodeEvent;
use crate::transport::NodeEventKind;
use crate::transport::NodeStat;
use crate::transport::TransportEvent;
use crate::transport::TransportResult;

#[derive(Debug, Clone, Default)]
struct NodeRecord {
    data: Vec<u8>,
    version: i32,
    ephemeral: bool,
}

/// In-memory coordination-service fake.
///
/// Implements the full primitive set over a `DashMap`, with one-shot watch
/// bookkeeping and an injectable event channel so tests can simulate
/// server-side writes, disconnects and session expiry deterministically.
pub struct InMemoryCoordination {
    nodes: DashMap<String, NodeRecord>,
    /// Paths with an armed one-shot watch
    watches: DashMap<String, ()>,
    /// How many times a watch was registered per path, to assert re-arming
    arm_counts: DashMap<String, usize>,
    events: mpsc::Sender<TransportEvent>,
    connected: AtomicBool,
}

impl InMemoryCoordination {
    pub fn new(queue_size: usize) -> (Arc<Self>, mpsc::Receiver<TransportEvent>) {
        let (events, receiver) = mpsc::channel(queue_size);
        (
            Arc::new(Self {
                nodes: DashMap::new(),
                watches: DashMap::new(),
                arm_counts: DashMap::new(),
                events,
                connected: AtomicBool::new(false),
            }),
            receiver,
        )
    }

    pub fn node_data(
        &self,
        path: &str,
    ) -> Option<Vec<u8>> {
        self.nodes.get(path).map(|n| n.data.clone())
    }

    pub fn node_exists(
        &self,
        path: &str,
    ) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn watch_armed(
        &self,
        path: &str,
    ) -> bool {
        self.watches.contains_key(path)
    }

    pub fn arm_count(
        &self,
        path: &str,
    ) -> usize {
        self.arm_counts.get(path).map(|c| *c).unwrap_or(0)
    }

    /// Simulate a write arriving from another client: bumps the version and
    /// fires the armed one-shot watch, if any.
    pub async fn server_write(
        &self,
        path: &str,
        data: &[u8],
    ) {
        let mut record = self.nodes.entry(path.to_string()).or_default();
        record.data = data.to_vec();
        record.version += 1;
        drop(record);

        if self.watches.remove(path).is_some() {
            self.events
                .send(TransportEvent::Node(NodeEvent::data_changed(path)))
                .await
                .expect("event channel closed");
        }
    }

    /// Simulate a deletion from another client.
    pub async fn server_delete(
        &self,
        path: &str,
    ) {
        self.nodes.remove(path);
        if self.watches.remove(path).is_some() {
            self.events
                .send(TransportEvent::Node(NodeEvent {
                    path: path.to_string(),
                    kind: Some(NodeEventKind::Deleted),
                    state: ConnectionState::Connected,
                }))
                .await
                .expect("event channel closed");
        }
    }

    /// Inject a connection-state notification.
    pub async fn emit_connection(
        &self,
        state: ConnectionState,
    ) {
        self.events
            .send(TransportEvent::Connection(state))
            .await
            .expect("event channel closed");
    }

    /// Inject a raw node event without touching watch bookkeeping.
    pub async fn fire_node_event(
        &self,
        event: NodeEvent,
    ) {
        self.events
            .send(TransportEvent::Node(event))
            .await
            .expect("event channel closed");
    }

    /// Direct children of `path`, bypassing the connection check.
    pub fn children_of(
        &self,
        path: &str,
    ) -> Vec<String> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut children: Vec<String> = self
            .nodes
            .iter()
            .filter_map(|entry| {
                let rest = entry.key().strip_prefix(&prefix)?;
                if rest.is_empty() || rest.contains('/') {
                    None
                } else {
                    Some(rest.to_string())
                }
            })
            .collect();
        children.sort();
        children
    }

    /// Simulate session expiry: the service drops every ephemeral node.
    pub fn drop_ephemerals(&self) {
        self.nodes.retain(|_, record| !record.ephemeral);
    }

    fn ensure_connected(&self) -> TransportResult<()> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }
}

#[async_trait]
impl CoordinationClient for InMemoryCoordination {
    async fn connect(
        &self,
        _hosts: &str,
    ) -> TransportResult<()> {
        self.connected.store(true, Ordering::Release);
        // Real transports deliver an initial Connected notification.
        let _ = self
            .events
            .send(TransportEvent::Connection(ConnectionState::Connected))
            .await;
        Ok(())
    }

    async fn exists(
        &self,
        path: &str,
    ) -> TransportResult<bool> {
        self.ensure_connected()?;
        Ok(self.nodes.contains_key(path))
    }

    async fn create_persistent(
        &self,
        path: &str,
        data: &[u8],
    ) -> TransportResult<()> {
        self.ensure_connected()?;
        match self.nodes.entry(path.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(TransportError::NodeExists(path.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(NodeRecord {
                    data: data.to_vec(),
                    version: 0,
                    ephemeral: false,
                });
                Ok(())
            }
        }
    }

    async fn create_ephemeral(
        &self,
        path: &str,
        data: &[u8],
    ) -> TransportResult<Option<String>> {
        self.ensure_connected()?;
        match self.nodes.entry(path.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(None),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(NodeRecord {
                    data: data.to_vec(),
                    version: 0,
                    ephemeral: true,
                });
                Ok(Some(path.to_string()))
            }
        }
    }

    async fn set_data(
        &self,
        path: &str,
        data: &[u8],
        expected_version: i32,
    ) -> TransportResult<i32> {
        self.ensure_connected()?;
        let mut record = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| TransportError::NoNode(path.to_string()))?;
        if record.version != expected_version {
            return Err(TransportError::VersionConflict {
                path: path.to_string(),
                expected: expected_version,
            });
        }
        record.data = data.to_vec();
        record.version += 1;
        Ok(record.version)
    }

    async fn get_data(
        &self,
        path: &str,
        watch: bool,
    ) -> TransportResult<(Vec<u8>, NodeStat)> {
        self.ensure_connected()?;
        let record = self
            .nodes
            .get(path)
            .ok_or_else(|| TransportError::NoNode(path.to_string()))?;
        if watch {
            self.watches.insert(path.to_string(), ());
            *self.arm_counts.entry(path.to_string()).or_insert(0) += 1;
        }
        Ok((
            record.data.clone(),
            NodeStat {
                version: record.version,
                num_children: 0,
                ephemeral: record.ephemeral,
            },
        ))
    }

    async fn children(
        &self,
        path: &str,
    ) -> TransportResult<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.children_of(path))
    }

    async fn close(&self) -> TransportResult<()> {
        self.connected.store(false, Ordering::Release);
        self.drop_ephemerals();
        Ok(())
    }
}
