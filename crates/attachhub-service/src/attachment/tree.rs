//! Descendant subtree assembly.

use std::collections::HashMap;
use std::sync::Arc;

use attachhub_core::result::AppResult;
use attachhub_core::types::NodeId;
use attachhub_database::AttachmentRepository;
use attachhub_entity::attachment::{AttachmentNode, SubtreeNode};

/// Builds nested subtrees from the repository's flat descendant listing.
#[derive(Debug, Clone)]
pub struct DescendantTreeBuilder {
    repo: Arc<dyn AttachmentRepository>,
}

impl DescendantTreeBuilder {
    /// Creates a new tree builder.
    pub fn new(repo: Arc<dyn AttachmentRepository>) -> Self {
        Self { repo }
    }

    /// The immediate children of `id`, each carrying its own descendants.
    ///
    /// A node without children and a missing node both yield an empty list.
    pub async fn descendants_of(&self, id: &NodeId) -> AppResult<Vec<SubtreeNode>> {
        let flat = self.repo.find_children_and_descendants(id).await?;
        Ok(assemble(id, flat))
    }
}

/// Group nodes by parent id, siblings ordered by path segment.
pub(crate) fn group_by_parent(nodes: Vec<AttachmentNode>) -> HashMap<NodeId, Vec<AttachmentNode>> {
    let mut by_parent: HashMap<NodeId, Vec<AttachmentNode>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.parent_id.clone() {
            by_parent.entry(parent).or_default().push(node);
        }
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(|a, b| a.path_segment.cmp(&b.path_segment));
    }
    by_parent
}

/// Peel the flat list one level at a time starting below `root`, then fold
/// the levels back up deepest first. Nodes not reachable from `root` are
/// dropped.
fn assemble(root: &NodeId, flat: Vec<AttachmentNode>) -> Vec<SubtreeNode> {
    let mut by_parent = group_by_parent(flat);

    let mut order: Vec<AttachmentNode> = Vec::new();
    let mut frontier = vec![root.clone()];
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for parent in frontier {
            for child in by_parent.remove(&parent).unwrap_or_default() {
                next.push(child.id.clone());
                order.push(child);
            }
        }
        frontier = next;
    }

    // Reverse level order yields every child before its parent; siblings
    // arrive reversed and are flipped back when their parent is built.
    let mut built: HashMap<NodeId, Vec<SubtreeNode>> = HashMap::new();
    for node in order.into_iter().rev() {
        let mut children = built.remove(&node.id).unwrap_or_default();
        children.reverse();
        let parent = node.parent_id.clone().unwrap_or_else(|| root.clone());
        built
            .entry(parent)
            .or_default()
            .push(SubtreeNode::new(node, children));
    }

    let mut top = built.remove(root).unwrap_or_default();
    top.reverse();
    top
}
