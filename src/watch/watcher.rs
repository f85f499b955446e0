use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::Domain;
use super::WatchKey;
use crate::errors::WatchError;
use crate::session::SessionManager;
use crate::transport::NodeEvent;
use crate::transport::NodeEventKind;
use crate::ConnectionState;
use crate::Result;

/// Application hook invoked when a watched configuration unit must be
/// re-fetched and re-applied.
///
/// Implementations re-download the payload and re-parse it; they may block
/// internally (use `spawn_blocking` for heavy parsing). Errors are logged
/// and isolated per key by the watcher; they never propagate into event
/// dispatch or prevent re-arming.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReloadCallback: Send + Sync + 'static {
    async fn reload(
        &self,
        domain: Domain,
        key_name: &str,
    ) -> Result<()>;
}

/// Why a reload was triggered, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    /// The watched node's payload changed
    DataChanged,
    /// The session expired; remote state must be treated as lost
    SessionExpired,
    /// Connectivity came back after a disconnect; every registered key is
    /// swept once
    Reconnected,
}

/// Watch lifecycle states.
///
/// ```text
/// Unarmed -> Armed -> Fired -> Reloading -> Armed -> ...
/// ```
///
/// `Unarmed` is both the initial state and where a failed `arm()` leaves
/// the watcher until the next reconnect sweep picks it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Unarmed,
    Armed,
    Fired,
    Reloading,
}

/// Per-key watch state machine.
///
/// Owns the one-shot watch on `monitor_path`: arms it through
/// [`SessionManager::read_watched`], classifies the fired event, runs the
/// reload callback, and re-arms. The state mutex is held across the arming
/// round-trip so arming can never race with delivery of its own event.
pub struct NodeWatcher {
    key: WatchKey,
    monitor_path: String,
    session: Arc<SessionManager>,
    callback: Arc<dyn ReloadCallback>,
    /// Lowers log severity for benign disconnect/expiry events
    debug: bool,
    state: Mutex<WatchState>,
}

impl NodeWatcher {
    pub fn new(
        key: WatchKey,
        monitor_path: impl Into<String>,
        session: Arc<SessionManager>,
        callback: Arc<dyn ReloadCallback>,
        debug: bool,
    ) -> Self {
        Self {
            key,
            monitor_path: monitor_path.into(),
            session,
            callback,
            debug,
            state: Mutex::new(WatchState::Unarmed),
        }
    }

    pub fn key(&self) -> &WatchKey {
        &self.key
    }

    pub fn monitor_path(&self) -> &str {
        &self.monitor_path
    }

    pub async fn state(&self) -> WatchState {
        *self.state.lock().await
    }

    /// Register the one-shot watch by reading the monitored node.
    ///
    /// A no-op when already armed, so repeated `watch()` calls for the same
    /// key are harmless. On failure the watcher stays `Unarmed` and is not
    /// retried here; the next reconnect-triggered sweep (or an explicit
    /// re-call) is the recovery path.
    pub async fn arm(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state == WatchState::Armed {
            return Ok(());
        }

        match self.session.read_watched(&self.monitor_path).await {
            Ok(_) => {
                *state = WatchState::Armed;
                debug!(
                    path = %self.monitor_path,
                    key = %self.key,
                    "watch armed"
                );
                Ok(())
            }
            Err(e) => {
                *state = WatchState::Unarmed;
                error!(
                    path = %self.monitor_path,
                    key = %self.key,
                    error = %e,
                    "cannot arm watch; left unarmed until next reconnect sweep"
                );
                Err(WatchError::ArmError {
                    path: self.monitor_path.clone(),
                    source: Box::new(e),
                }
                .into())
            }
        }
    }

    /// Classify a fired event and decide whether a reload is due.
    ///
    /// - `DataChanged` consumes the armed watch and demands a reload.
    /// - A bare `Disconnected` notification is log-only: it does not imply
    ///   data loss, and the service re-attaches the watch on reconnect.
    /// - `Expired` is data-loss-equivalent and demands a reload; the
    ///   `debug` flag only demotes the log severity.
    /// - `Deleted` consumes the watch without a reload; there is nothing
    ///   left to fetch until the node is recreated.
    pub async fn classify(
        &self,
        event: &NodeEvent,
    ) -> Option<ReloadReason> {
        if event.kind == Some(NodeEventKind::DataChanged) {
            let mut state = self.state.lock().await;
            *state = WatchState::Fired;
            info!(
                path = %self.monitor_path,
                key = %self.key,
                "got data-changed event"
            );
            return Some(ReloadReason::DataChanged);
        }

        if event.kind == Some(NodeEventKind::Deleted) {
            let mut state = self.state.lock().await;
            *state = WatchState::Unarmed;
            warn!(
                path = %self.monitor_path,
                key = %self.key,
                "watched node deleted; watch consumed"
            );
            return None;
        }

        match event.state {
            ConnectionState::Disconnected => {
                // No state change and no reload: the one-shot watch is
                // preserved server-side across a bare disconnect.
                if self.debug {
                    debug!(
                        path = %self.monitor_path,
                        key = %self.key,
                        "got disconnected event"
                    );
                } else {
                    warn!(
                        path = %self.monitor_path,
                        key = %self.key,
                        "got disconnected event"
                    );
                }
                None
            }
            ConnectionState::Expired => {
                let mut state = self.state.lock().await;
                *state = WatchState::Fired;
                if self.debug {
                    debug!(
                        path = %self.monitor_path,
                        key = %self.key,
                        "got session-expired event"
                    );
                } else {
                    error!(
                        path = %self.monitor_path,
                        key = %self.key,
                        "got session-expired event"
                    );
                }
                Some(ReloadReason::SessionExpired)
            }
            _ => None,
        }
    }

    /// Run one reload cycle: invoke the callback, then re-arm.
    ///
    /// Callback failures are logged and swallowed so one bad key never
    /// blocks the others or the dispatch loop; re-arming happens
    /// regardless. Exactly one reload runs per submitted cycle.
    pub async fn run_reload(
        &self,
        reason: ReloadReason,
    ) {
        {
            let mut state = self.state.lock().await;
            *state = WatchState::Reloading;
        }

        info!(
            path = %self.monitor_path,
            key = %self.key,
            reason = ?reason,
            "reloading"
        );

        if let Err(e) = self.callback.reload(self.key.domain, &self.key.name).await {
            error!(
                key = %self.key,
                error = %e,
                "reload callback failed; configuration stays stale until next reload"
            );
        }

        if let Err(e) = self.arm().await {
            warn!(
                path = %self.monitor_path,
                key = %self.key,
                error = %e,
                "re-arm after reload failed"
            );
        }
    }
}

impl std::fmt::Debug for NodeWatcher {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("NodeWatcher")
            .field("key", &self.key)
            .field("monitor_path", &self.monitor_path)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
