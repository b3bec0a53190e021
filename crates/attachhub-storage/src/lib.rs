//! # attachhub-storage
//!
//! Physical file store implementations for AttachHub. Node paths resolved
//! by the services are always relative to a provider's root.

pub mod providers;

pub use providers::LocalStorageProvider;
