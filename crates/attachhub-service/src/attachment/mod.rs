//! Attachment tree operations.

pub mod archive;
pub mod delete;
pub mod package;
pub mod path;
pub mod relocate;
pub mod service;
pub mod tree;

#[cfg(test)]
pub(crate) mod fixtures;

pub use archive::ArchivePlanner;
pub use delete::{CascadeDeletePlanner, DeletePlan, PhysicalTarget};
pub use package::ZipStreamAssembler;
pub use path::PathResolver;
pub use relocate::{MoveCoordinator, Relocation};
pub use service::AttachmentService;
pub use tree::DescendantTreeBuilder;

use std::collections::HashSet;

use attachhub_core::types::NodeId;

/// Collapse repeated ids, keeping the first occurrence of each.
pub(crate) fn dedup_ids(ids: &[NodeId]) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}
