//! Store adapters implementing the pathkey application ports.

#![forbid(unsafe_code)]

mod in_memory_access_store;
mod postgres_access_store;

pub use in_memory_access_store::InMemoryAccessStore;
pub use postgres_access_store::PostgresAccessStore;
