//! Path orchestration: maps a logical configuration key to its remote node,
//! publishes this instance's ephemeral presence, and binds a watcher.
//!
//! Deliberately split from the watch state machine so the path layout
//! ([`PathScheme`]) can be re-pointed without touching watch-firing logic.

mod coordinator;
mod paths;

pub use coordinator::*;
pub use paths::*;
