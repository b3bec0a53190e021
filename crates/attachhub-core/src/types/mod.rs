//! Shared value types.

pub mod id;
pub mod pagination;

pub use id::NodeId;
pub use pagination::{PageRequest, PageResponse};
