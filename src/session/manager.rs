use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::errors::SessionError;
use crate::transport::CoordinationClient;
use crate::transport::NodeStat;
use crate::ConnectionState;
use crate::Result;

/// Owner of the single connection to the coordination service.
///
/// Provides idempotent directory creation, optimistically-versioned
/// persistent writes, ephemeral presence upserts, watched reads, and the
/// connection-state bookkeeping that decides when a reconnect reload sweep
/// is due.
///
/// # Failure semantics
///
/// Transport-level retries (exponential backoff on connection loss) are the
/// underlying client's responsibility and opaque here. The only
/// application-level retry is the single re-read-and-rewrite on a version
/// conflict in [`write_persistent`](Self::write_persistent).
pub struct SessionManager {
    client: Arc<dyn CoordinationClient>,

    /// `connect()` succeeded and `close()` has not been called
    connected: AtomicBool,

    /// `close()` called; every subsequent operation fails fast
    closed: AtomicBool,

    /// Guard for the reconnect sweep. Starts `true` so the very first
    /// Connected notification is not mistaken for a reconnect; only a
    /// Connected observed after a Disconnected/Expired flips it back and
    /// triggers exactly one sweep per connectivity episode.
    was_connected: AtomicBool,

    /// Endpoints recorded at connect time, for logs
    hosts: Mutex<Option<String>>,
}

impl SessionManager {
    pub fn new(client: Arc<dyn CoordinationClient>) -> Self {
        Self {
            client,
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            was_connected: AtomicBool::new(true),
            hosts: Mutex::new(None),
        }
    }

    /// Establish the connection. Idempotent: a second call on an
    /// already-connected session is a no-op.
    pub async fn connect(
        &self,
        hosts: &str,
    ) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::NotConnected.into());
        }
        if self.connected.load(Ordering::Acquire) {
            debug!(hosts, "session already connected");
            return Ok(());
        }

        self.client
            .connect(hosts)
            .await
            .map_err(|source| SessionError::ConnectError {
                hosts: hosts.to_string(),
                source,
            })?;

        self.connected.store(true, Ordering::Release);
        *self.hosts.lock() = Some(hosts.to_string());
        info!(hosts, "coordination service connected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.closed.load(Ordering::Acquire)
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected.into());
        }
        Ok(())
    }

    /// Create `path` as a persistent node with `announce` as payload if it
    /// does not exist yet.
    ///
    /// Idempotent: concurrent callers racing to create the same path treat
    /// "node already exists" as success.
    pub async fn ensure_path(
        &self,
        path: &str,
        announce: &[u8],
    ) -> Result<()> {
        self.ensure_connected()?;

        if self.client.exists(path).await? {
            return Ok(());
        }

        info!(path, "creating path");
        match self.client.create_persistent(path, announce).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_node_exists() => {
                debug!(path, "lost creation race; path exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a persistent node: create if absent, otherwise overwrite using
    /// optimistic versioning. A version conflict is retried once by
    /// re-reading; a second conflict surfaces as
    /// [`SessionError::WriteConflict`].
    pub async fn write_persistent(
        &self,
        path: &str,
        value: &[u8],
    ) -> Result<()> {
        self.ensure_connected()?;

        if !self.client.exists(path).await? {
            match self.client.create_persistent(path, value).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_node_exists() => {
                    debug!(path, "lost creation race; overwriting instead");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (_, stat) = self.client.get_data(path, false).await?;
        match self.client.set_data(path, value, stat.version).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_version_conflict() => {
                warn!(path, "version conflict; retrying once");
                let (_, stat) = self.client.get_data(path, false).await?;
                match self.client.set_data(path, value, stat.version).await {
                    Ok(_) => Ok(()),
                    Err(e) if e.is_version_conflict() => Err(SessionError::WriteConflict {
                        path: path.to_string(),
                    }
                    .into()),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Publish this instance's ephemeral presence node: create if absent,
    /// refresh the value if present. Returns whether a fresh node was
    /// created.
    ///
    /// Never errors on "already exists"; a concurrent refresh losing the
    /// version race is equally benign since the node ends up present with a
    /// current value either way.
    pub async fn create_or_update_ephemeral(
        &self,
        path: &str,
        value: &[u8],
    ) -> Result<bool> {
        self.ensure_connected()?;

        match self.client.create_ephemeral(path, value).await {
            Ok(Some(created)) => {
                debug!(path = %created, "ephemeral node created");
                Ok(true)
            }
            Ok(None) => {
                self.refresh_ephemeral(path, value).await?;
                Ok(false)
            }
            Err(e) if e.is_node_exists() => {
                self.refresh_ephemeral(path, value).await?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn refresh_ephemeral(
        &self,
        path: &str,
        value: &[u8],
    ) -> Result<()> {
        let (_, stat) = self.client.get_data(path, false).await?;
        match self.client.set_data(path, value, stat.version).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_version_conflict() => {
                debug!(path, "presence refresh lost version race");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a node's payload and register a one-shot watch on it in the
    /// same round-trip. The watch fires at most once; the caller re-arms by
    /// calling this again.
    pub async fn read_watched(
        &self,
        path: &str,
    ) -> Result<(Vec<u8>, NodeStat)> {
        self.ensure_connected()?;
        Ok(self.client.get_data(path, true).await?)
    }

    /// List children of `path`, in service order. Diagnostic surface.
    pub async fn children(
        &self,
        path: &str,
    ) -> Result<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.client.children(path).await?)
    }

    /// Record a connection-state notification. Returns `true` when the
    /// transition is Connected-after-Disconnected and the caller must run
    /// the full reload sweep over the registry.
    ///
    /// The compare-and-swap guard makes flapping Connected notifications
    /// produce at most one sweep per real disconnect.
    pub fn on_connection_state(
        &self,
        state: ConnectionState,
    ) -> bool {
        match state {
            ConnectionState::Connected | ConnectionState::Reconnected => {
                let sweep_due = self
                    .was_connected
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok();
                if sweep_due {
                    info!(%state, "connection restored after disconnect");
                } else {
                    debug!(%state, "connected notification with no prior disconnect");
                }
                sweep_due
            }
            ConnectionState::Disconnected | ConnectionState::Expired => {
                self.was_connected.store(false, Ordering::Release);
                error!(%state, "connection state is not correct");
                false
            }
        }
    }

    /// Release the connection. Ephemeral nodes owned by this session are
    /// removed by the service; subsequent operations fail with
    /// [`SessionError::NotConnected`].
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.connected.store(false, Ordering::Release);
        let hosts = self.hosts.lock().take();
        info!(?hosts, "closing session");
        self.client.close().await?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("connected", &self.connected)
            .field("closed", &self.closed)
            .field("was_connected", &self.was_connected)
            .finish_non_exhaustive()
    }
}
