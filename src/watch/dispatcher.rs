use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::NodeWatcher;
use super::ReloadReason;
use super::WatchRegistry;
use crate::session::SessionManager;
use crate::transport::NodeEvent;
use crate::transport::TransportEvent;

/// Semaphore-bounded executor for reload work.
///
/// Reload callbacks re-fetch and re-parse configuration and may block for a
/// while; running them inline would starve the single event-dispatch loop.
/// Each submission runs in its own task (so a panicking callback is
/// contained) gated by `concurrency` permits.
#[derive(Clone)]
pub struct ReloadPool {
    permits: Arc<Semaphore>,
}

impl ReloadPool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
        }
    }

    /// Schedule exactly one reload cycle for `watcher`.
    pub fn submit(
        &self,
        watcher: Arc<NodeWatcher>,
        reason: ReloadReason,
    ) {
        let permits = self.permits.clone();
        tokio::spawn(async move {
            // Closed only on runtime shutdown; nothing left to reload then.
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            watcher.run_reload(reason).await;
        });
    }
}

/// Single consumer of the per-session event channel.
///
/// Routes fired node events to their watcher via the registry path index
/// and forwards connection-state transitions to the [`SessionManager`],
/// executing the reconnect reload sweep when the session's was-connected
/// guard says one is due.
pub struct WatchDispatcher {
    session: Arc<SessionManager>,
    registry: Arc<WatchRegistry>,
    pool: ReloadPool,
    events: mpsc::Receiver<TransportEvent>,
    shutdown: CancellationToken,
}

impl WatchDispatcher {
    pub fn new(
        session: Arc<SessionManager>,
        registry: Arc<WatchRegistry>,
        pool: ReloadPool,
        events: mpsc::Receiver<TransportEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            session,
            registry,
            pool,
            events,
            shutdown,
        }
    }

    /// Consume events until shutdown or the transport closes its channel.
    pub async fn run(mut self) {
        info!("watch dispatcher started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("watch dispatcher shutting down");
                    break;
                }
                event = self.events.recv() => {
                    match event {
                        Some(TransportEvent::Node(node_event)) => {
                            self.on_node_event(node_event).await;
                        }
                        Some(TransportEvent::Connection(state)) => {
                            self.on_connection_state_changed(state).await;
                        }
                        None => {
                            warn!("session event channel closed; dispatcher exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn on_node_event(
        &self,
        event: NodeEvent,
    ) {
        let Some(watcher) = self.registry.find_by_path(&event.path) else {
            // Benign: event raced with a key still being registered.
            warn!(path = %event.path, "fired event has no registered watcher");
            return;
        };

        if let Some(reason) = watcher.classify(&event).await {
            self.pool.submit(watcher, reason);
        }
    }

    async fn on_connection_state_changed(
        &self,
        state: crate::ConnectionState,
    ) {
        if !self.session.on_connection_state(state) {
            return;
        }

        // Reconnected after a real disconnect: every key registered at this
        // moment gets exactly one reload, each isolated in its own task.
        let keys = self.registry.list();
        info!(
            state = %state,
            keys = keys.len(),
            "connection restored; sweeping registered watchers"
        );
        for key in keys {
            match self.registry.get(&key) {
                Some(watcher) => self.pool.submit(watcher, ReloadReason::Reconnected),
                None => debug!(key = %key, "watcher vanished during sweep"),
            }
        }
    }
}
