//! Coordination-service transport boundary
//!
//! The engine treats the remote coordination service as a black-box primitive
//! set: hierarchical nodes with persistent or ephemeral lifetimes, one-shot
//! watches on reads, and connection-state notifications. This module defines
//! that boundary:
//! - [`CoordinationClient`] - the primitive operations
//! - [`TransportEvent`] / [`NodeEvent`] / [`ConnectionState`] - the single
//!   per-session event channel consumed by the dispatcher
//!
//! Concrete transports (a ZooKeeper client binding, an in-memory fake) live
//! behind this trait; the engine never touches a connection handle directly.

mod api;
mod event;

pub use api::*;
pub use event::*;
