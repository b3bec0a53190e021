//! # attachhub-entity
//!
//! Domain models for AttachHub. [`attachment::AttachmentNode`] is the only
//! persisted entity; the remaining types are derived views (subtrees,
//! archive entries) or typed request payloads.

pub mod attachment;

pub use attachment::{
    ArchiveEntry, ArchivePlan, AttachmentNode, AttachmentUpdate, CreateAttachment, NodeKind,
    SubtreeNode,
};
