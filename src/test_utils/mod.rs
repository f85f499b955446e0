//! Shared fixtures for unit tests: logger setup and an in-memory
//! coordination-service fake.
mod common;
mod in_memory;

pub use common::*;
pub use in_memory::*;
