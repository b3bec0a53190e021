//! Repository contract for attachment nodes.

pub mod memory;

use async_trait::async_trait;

use attachhub_core::result::AppResult;
use attachhub_core::types::{NodeId, PageRequest, PageResponse};
use attachhub_entity::attachment::{AttachmentNode, AttachmentUpdate};

pub use memory::MemoryAttachmentRepository;

/// Storage-engine-agnostic access to attachment node records.
///
/// The tree algorithms only need the first four methods; the rest back
/// the record-keeping operations around them.
#[async_trait]
pub trait AttachmentRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a node by its id.
    async fn get_node(&self, id: &NodeId) -> AppResult<Option<AttachmentNode>>;

    /// All nodes transitively below `id`, in no particular order. Empty
    /// when `id` has no children or does not exist.
    async fn find_children_and_descendants(&self, id: &NodeId) -> AppResult<Vec<AttachmentNode>>;

    /// Delete the given node records. Returns how many existed.
    async fn delete_nodes(&self, ids: &[NodeId]) -> AppResult<u64>;

    /// Apply a partial update. Fails with `NotFound` if `id` does not exist.
    async fn update_node(&self, id: &NodeId, update: &AttachmentUpdate) -> AppResult<()>;

    /// Insert or replace node records.
    async fn save_nodes(&self, nodes: &[AttachmentNode]) -> AppResult<()>;

    /// Nodes tagged with `module_id`, optionally only the direct children of
    /// `parent_id`, newest first.
    async fn find_by_module(
        &self,
        module_id: &str,
        parent_id: Option<&NodeId>,
    ) -> AppResult<Vec<AttachmentNode>>;

    /// One page over every node, newest first with ties broken by id so
    /// consecutive pages never overlap.
    async fn find_page(&self, page: &PageRequest) -> AppResult<PageResponse<AttachmentNode>>;
}
