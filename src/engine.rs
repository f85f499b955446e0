//! Engine context: the one-per-process object wiring session, registry,
//! dispatcher and coordinator together.
//!
//! Replaces hidden singletons with an explicit context constructed once at
//! process start and passed by handle. Typical flow:
//!
//! ```rust,ignore
//! let (transport, events) = ZkTransport::new(&settings)?;
//! let engine = WatchEngine::builder(settings)
//!     .transport(Arc::new(transport), events)
//!     .callback(Arc::new(MyReload))
//!     .build()?;
//! engine.start().await?;
//! engine.watch("redis.properties", Domain::File).await?;
//! // ... on shutdown
//! engine.shutdown().await?;
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

use crate::config::Settings;
use crate::coordinator::PathScheme;
use crate::coordinator::WatchCoordinator;
use crate::session::SessionManager;
use crate::transport::CoordinationClient;
use crate::transport::TransportEvent;
use crate::utils::net;
use crate::watch::Domain;
use crate::watch::NodeWatcher;
use crate::watch::ReloadCallback;
use crate::watch::ReloadPool;
use crate::watch::WatchDispatcher;
use crate::watch::WatchRegistry;
use crate::Error;
use crate::Result;

/// Configurable construction of a [`WatchEngine`].
pub struct WatchEngineBuilder {
    settings: Settings,
    transport: Option<Arc<dyn CoordinationClient>>,
    events: Option<mpsc::Receiver<TransportEvent>>,
    callback: Option<Arc<dyn ReloadCallback>>,
}

impl WatchEngineBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            transport: None,
            events: None,
            callback: None,
        }
    }

    /// Attach the coordination transport and its event channel. The two
    /// halves must come from the same session.
    pub fn transport(
        mut self,
        client: Arc<dyn CoordinationClient>,
        events: mpsc::Receiver<TransportEvent>,
    ) -> Self {
        self.transport = Some(client);
        self.events = Some(events);
        self
    }

    /// Attach the application reload hook invoked on every fired watch.
    pub fn callback(
        mut self,
        callback: Arc<dyn ReloadCallback>,
    ) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn build(self) -> Result<WatchEngine> {
        self.settings.validate()?;

        let transport = self
            .transport
            .ok_or_else(|| Error::Fatal("transport is required".into()))?;
        let events = self
            .events
            .ok_or_else(|| Error::Fatal("event channel is required".into()))?;
        let callback = self
            .callback
            .ok_or_else(|| Error::Fatal("reload callback is required".into()))?;

        let session = Arc::new(SessionManager::new(transport));
        let registry = Arc::new(WatchRegistry::new());
        let coordinator = WatchCoordinator::new(
            session.clone(),
            registry.clone(),
            PathScheme::from_settings(&self.settings),
            callback,
            self.settings.app.debug,
        );

        Ok(WatchEngine {
            pool: ReloadPool::new(self.settings.watch.reload_concurrency),
            settings: self.settings,
            session,
            registry,
            coordinator,
            events: Mutex::new(Some(events)),
            dispatcher: Mutex::new(None),
            shutdown: CancellationToken::new(),
            announce: net::local_ip(),
        })
    }
}

/// The watch/session coordination engine.
///
/// Long-lived: created once at process start, shut down once at exit.
/// Watchers registered through [`watch`](Self::watch) live until shutdown;
/// there is no per-key teardown.
pub struct WatchEngine {
    settings: Settings,
    session: Arc<SessionManager>,
    registry: Arc<WatchRegistry>,
    coordinator: WatchCoordinator,
    pool: ReloadPool,
    /// Consumed by the dispatcher on the first `start()`
    events: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
    /// Default announce payload for presence nodes (local host address)
    announce: String,
}

impl std::fmt::Debug for WatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchEngine").finish_non_exhaustive()
    }
}

impl WatchEngine {
    pub fn builder(settings: Settings) -> WatchEngineBuilder {
        WatchEngineBuilder::new(settings)
    }

    /// Connect the session and spawn the event dispatcher. Idempotent.
    pub async fn start(&self) -> Result<()> {
        self.session.connect(&self.settings.connection.hosts).await?;

        let Some(events) = self.events.lock().take() else {
            debug!("engine already started");
            return Ok(());
        };

        let dispatcher = WatchDispatcher::new(
            self.session.clone(),
            self.registry.clone(),
            self.pool.clone(),
            events,
            self.shutdown.child_token(),
        );
        *self.dispatcher.lock() = Some(tokio::spawn(dispatcher.run()));
        info!("watch engine started");
        Ok(())
    }

    /// Watch one configuration unit, announcing this host on its presence
    /// node. Idempotent per `(domain, key_name)`.
    pub async fn watch(
        &self,
        key_name: &str,
        domain: Domain,
    ) -> Result<Arc<NodeWatcher>> {
        self.coordinator.watch(key_name, domain, &self.announce).await
    }

    /// Direct access for callers that need a custom announce value or the
    /// path scheme.
    pub fn coordinator(&self) -> &WatchCoordinator {
        &self.coordinator
    }

    pub fn registry(&self) -> &Arc<WatchRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Unconditional teardown: stop the dispatcher, close the session.
    /// Register/read/write calls fail fast afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown.cancel();
        let handle = self.dispatcher.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.session.close().await
    }
}
