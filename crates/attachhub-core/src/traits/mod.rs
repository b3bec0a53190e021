//! Core traits defined in `attachhub-core` and implemented by other crates.

pub mod storage;

pub use storage::StorageProvider;
