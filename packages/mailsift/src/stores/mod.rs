//! Storage implementations.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{MemoryConnector, MemoryStore};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConnector, PostgresStore};
