//! Session lifecycle: exclusive ownership of the coordination-service
//! connection and the typed operations the rest of the engine uses.
//!
//! Exactly one [`SessionManager`] exists per process (constructed once by
//! the engine context, passed by `Arc` into watchers and the coordinator).
//! The raw [`CoordinationClient`](crate::CoordinationClient) handle is never
//! exposed to callers.

mod manager;

pub use manager::*;
