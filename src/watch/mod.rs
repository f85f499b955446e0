//! Watch lifecycle: per-key state machines, the process-wide registry, and
//! the event dispatch loop.
//!
//! # Architecture
//!
//! ```text
//! Transport dispatch thread(s):
//!   session event channel -> WatchDispatcher.run()
//!                                   |
//!               +-------------------+--------------------+
//!               v                                        v
//!   NodeEvent: registry path index           ConnectionState: SessionManager
//!   -> NodeWatcher.classify()                -> was-connected CAS
//!   -> ReloadPool.submit()                   -> reload sweep over registry
//!               |
//!               v
//!   bounded reload task: callback.reload(domain, key) -> NodeWatcher.arm()
//! ```
//!
//! One watcher exists per [`WatchKey`] for the process lifetime; the watch
//! on its node is one-shot and is re-armed after every fire, every reload,
//! and every reconnect sweep.

mod dispatcher;
mod key;
mod registry;
mod watcher;

pub use dispatcher::*;
pub use key::*;
pub use registry::*;
pub use watcher::*;
