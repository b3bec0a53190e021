//! Attachment domain entities.

pub mod archive;
pub mod model;
pub mod tree;
pub mod update;

pub use archive::{ArchiveEntry, ArchivePlan};
pub use model::{AttachmentNode, CreateAttachment, NodeKind};
pub use tree::SubtreeNode;
pub use update::AttachmentUpdate;
