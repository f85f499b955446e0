//! # confwatch
//!
//! Client-side watch/session coordination engine: keeps a process's
//! in-memory configuration synchronized with values held in a remote
//! coordination service by maintaining one-shot watches on remote nodes and
//! re-establishing them after disconnection or session loss.
//!
//! The engine tolerates an unreliable, partially-ordered event stream
//! (data-changed, disconnected, session-expired), guarantees idempotent
//! re-registration after any connectivity disruption, and never loses or
//! duplicates watches across reconnects.
//!
//! Entry point: [`WatchEngine`], built once per process; see the module
//! docs of [`watch`](crate::watch) for the dispatch architecture.

mod config;
mod coordinator;
mod engine;
mod errors;
mod session;
mod transport;
mod watch;
pub(crate) mod utils;

pub use config::*;
pub use coordinator::*;
pub use engine::*;
pub use errors::*;
pub use session::*;
pub use transport::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod engine_test;
