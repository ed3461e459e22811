//! Infrastructure adapters for lease stores.

pub mod store;

pub use store::InMemoryLeaseStore;
