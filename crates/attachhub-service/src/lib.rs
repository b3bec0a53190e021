//! # attachhub-service
//!
//! Attachment tree services for AttachHub. Each component works against
//! the [`AttachmentRepository`](attachhub_database::AttachmentRepository)
//! and [`StorageProvider`](attachhub_core::traits::storage::StorageProvider)
//! seams, and [`AttachmentService`] composes them into the public
//! operations.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod attachment;
pub mod context;

pub use attachment::{
    ArchivePlanner, AttachmentService, CascadeDeletePlanner, DeletePlan, DescendantTreeBuilder,
    MoveCoordinator, PathResolver, PhysicalTarget, Relocation, ZipStreamAssembler,
};
pub use context::RequestContext;
