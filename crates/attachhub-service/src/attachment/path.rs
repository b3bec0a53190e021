//! Ancestor-chain walks and full path resolution.

use std::collections::HashSet;
use std::sync::Arc;

use attachhub_core::error::AppError;
use attachhub_core::result::AppResult;
use attachhub_core::types::NodeId;
use attachhub_database::AttachmentRepository;
use attachhub_entity::attachment::AttachmentNode;

/// Resolves a node's root-relative physical path from its ancestor chain.
#[derive(Debug, Clone)]
pub struct PathResolver {
    repo: Arc<dyn AttachmentRepository>,
}

impl PathResolver {
    /// Creates a new path resolver.
    pub fn new(repo: Arc<dyn AttachmentRepository>) -> Self {
        Self { repo }
    }

    /// The chain from the root down to `id`, both ends included.
    ///
    /// Returns `None` when `id` does not exist. A parent reference that
    /// points at a missing node, or back into the chain, is reported as
    /// `InvalidState`.
    pub async fn ancestry(&self, id: &NodeId) -> AppResult<Option<Vec<AttachmentNode>>> {
        let Some(node) = self.repo.get_node(id).await? else {
            return Ok(None);
        };

        let mut seen = HashSet::from([node.id.clone()]);
        let mut chain = vec![node];
        while let Some(parent_id) = chain.last().and_then(|n| n.parent_id.clone()) {
            if !seen.insert(parent_id.clone()) {
                return Err(AppError::invalid_state(format!(
                    "Ancestor chain of {id} loops back to {parent_id}"
                )));
            }
            let parent = self.repo.get_node(&parent_id).await?.ok_or_else(|| {
                AppError::invalid_state(format!(
                    "Ancestor chain of {id} references missing node {parent_id}"
                ))
            })?;
            chain.push(parent);
        }

        chain.reverse();
        Ok(Some(chain))
    }

    /// The node's full path: the path segments of its ancestors and itself
    /// joined with `/`, root first.
    pub async fn resolve(&self, id: &NodeId) -> AppResult<String> {
        let chain = self
            .ancestry(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attachment {id} not found")))?;
        Ok(join_segments(&chain))
    }
}

/// Join the path segments of a root-first chain.
pub(crate) fn join_segments(chain: &[AttachmentNode]) -> String {
    chain
        .iter()
        .map(|node| node.path_segment.as_str())
        .collect::<Vec<_>>()
        .join("/")
}
