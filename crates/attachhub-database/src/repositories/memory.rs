//! In-memory attachment repository backed by a concurrent map.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use attachhub_core::error::AppError;
use attachhub_core::result::AppResult;
use attachhub_core::types::{NodeId, PageRequest, PageResponse};
use attachhub_entity::attachment::{AttachmentNode, AttachmentUpdate};

use super::AttachmentRepository;

/// Attachment repository that keeps every record in process memory.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttachmentRepository {
    nodes: Arc<DashMap<NodeId, AttachmentNode>>,
}

impl MemoryAttachmentRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-loaded with `nodes`.
    pub fn with_nodes(nodes: impl IntoIterator<Item = AttachmentNode>) -> Self {
        let repo = Self::new();
        for node in nodes {
            repo.nodes.insert(node.id.clone(), node);
        }
        repo
    }

    /// Copy of every stored record, ordered by id.
    pub fn snapshot(&self) -> Vec<AttachmentNode> {
        let mut all: Vec<AttachmentNode> =
            self.nodes.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the repository holds no records.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl AttachmentRepository for MemoryAttachmentRepository {
    async fn get_node(&self, id: &NodeId) -> AppResult<Option<AttachmentNode>> {
        Ok(self.nodes.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_children_and_descendants(&self, id: &NodeId) -> AppResult<Vec<AttachmentNode>> {
        let mut by_parent: HashMap<NodeId, Vec<AttachmentNode>> = HashMap::new();
        for entry in self.nodes.iter() {
            if let Some(parent) = &entry.value().parent_id {
                by_parent
                    .entry(parent.clone())
                    .or_default()
                    .push(entry.value().clone());
            }
        }

        let mut found = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::from([id.clone()]);
        let mut queue = VecDeque::from([id.clone()]);
        while let Some(parent) = queue.pop_front() {
            for child in by_parent.remove(&parent).unwrap_or_default() {
                if visited.insert(child.id.clone()) {
                    queue.push_back(child.id.clone());
                    found.push(child);
                }
            }
        }
        Ok(found)
    }

    async fn delete_nodes(&self, ids: &[NodeId]) -> AppResult<u64> {
        let removed = ids
            .iter()
            .filter(|id| self.nodes.remove(*id).is_some())
            .count() as u64;
        debug!(requested = ids.len(), removed, "Deleted attachment records");
        Ok(removed)
    }

    async fn update_node(&self, id: &NodeId, update: &AttachmentUpdate) -> AppResult<()> {
        let mut node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Attachment {id} not found")))?;
        update.apply_to(node.value_mut());
        Ok(())
    }

    async fn save_nodes(&self, nodes: &[AttachmentNode]) -> AppResult<()> {
        for node in nodes {
            self.nodes.insert(node.id.clone(), node.clone());
        }
        Ok(())
    }

    async fn find_by_module(
        &self,
        module_id: &str,
        parent_id: Option<&NodeId>,
    ) -> AppResult<Vec<AttachmentNode>> {
        let mut found: Vec<AttachmentNode> = self
            .nodes
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|node| node.module_id.as_deref() == Some(module_id))
            .filter(|node| parent_id.is_none_or(|p| node.parent_id.as_ref() == Some(p)))
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_page(&self, page: &PageRequest) -> AppResult<PageResponse<AttachmentNode>> {
        let mut all: Vec<AttachmentNode> =
            self.nodes.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .collect();
        Ok(PageResponse::new(items, page, total))
    }
}
