//! # attachhub-database
//!
//! The persistence contract the attachment services consume, and an
//! in-memory implementation of it. Any other backend (SQL, document
//! store) plugs in by implementing [`AttachmentRepository`].

pub mod repositories;

pub use repositories::{AttachmentRepository, MemoryAttachmentRepository};
