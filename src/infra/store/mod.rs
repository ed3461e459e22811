//! Lease store backends.

pub mod memory;

pub use memory::InMemoryLeaseStore;
