use std::sync::Arc;

use tracing::error;
use tracing::info;

use super::PathScheme;
use crate::session::SessionManager;
use crate::utils::net;
use crate::watch::Domain;
use crate::watch::NodeWatcher;
use crate::watch::ReloadCallback;
use crate::watch::WatchKey;
use crate::watch::WatchRegistry;
use crate::Result;

/// Binds a logical configuration key to its remote path and an announced
/// client identity, then hands the path to a [`NodeWatcher`].
///
/// `watch()` is idempotent end to end: directories are created only when
/// absent, the presence node is upserted, registration returns the existing
/// watcher for a known key, and arming an armed watcher is a no-op.
pub struct WatchCoordinator {
    session: Arc<SessionManager>,
    registry: Arc<WatchRegistry>,
    scheme: PathScheme,
    callback: Arc<dyn ReloadCallback>,
    /// Unique identity of this client instance, the name of its ephemeral
    /// presence nodes
    fingerprint: String,
    /// Payload announced on created directories (the local host address)
    host_announce: String,
    debug: bool,
}

impl WatchCoordinator {
    pub fn new(
        session: Arc<SessionManager>,
        registry: Arc<WatchRegistry>,
        scheme: PathScheme,
        callback: Arc<dyn ReloadCallback>,
        debug: bool,
    ) -> Self {
        Self {
            session,
            registry,
            scheme,
            callback,
            fingerprint: net::instance_fingerprint(),
            host_announce: net::local_ip(),
            debug,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn scheme(&self) -> &PathScheme {
        &self.scheme
    }

    /// Start (or re-trigger) watching one configuration unit.
    ///
    /// 1. Ensure every directory from the root down to the monitor node
    ///    exists, announcing this host on the ones it creates.
    /// 2. Publish the ephemeral presence node with `announce_value`. This
    ///    runs on every call, not just the first: the service may silently
    ///    drop ephemerals on session loss, so presence is always recreated
    ///    before arming. Failures here degrade observability only and are
    ///    logged, never propagated.
    /// 3. Register (or fetch) the watcher and arm it.
    pub async fn watch(
        &self,
        key_name: &str,
        domain: Domain,
        announce_value: &str,
    ) -> Result<Arc<NodeWatcher>> {
        let monitor_path = self.scheme.monitor_path(domain, key_name);
        for dir in self.scheme.ancestry(domain, key_name) {
            // The monitor node itself starts empty; directories above it
            // announce the creating host.
            let payload = if dir == monitor_path {
                &[][..]
            } else {
                self.host_announce.as_bytes()
            };
            self.session.ensure_path(&dir, payload).await?;
        }

        let presence = PathScheme::presence_path(&monitor_path, &self.fingerprint);
        if let Err(e) = self
            .session
            .create_or_update_ephemeral(&presence, announce_value.as_bytes())
            .await
        {
            // A missing presence node must not block watching.
            error!(path = %presence, error = %e, "cannot publish presence node");
        }

        let key = WatchKey::new(domain, key_name);
        let watcher = self.registry.get_or_create(key.clone(), || {
            Arc::new(NodeWatcher::new(
                key.clone(),
                monitor_path.clone(),
                self.session.clone(),
                self.callback.clone(),
                self.debug,
            ))
        });

        watcher.arm().await?;
        info!(key = %watcher.key(), path = %watcher.monitor_path(), "watching");
        Ok(watcher)
    }
}
