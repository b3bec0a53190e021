//! Nested subtree structure for hierarchical display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attachhub_core::types::NodeId;

use super::model::{AttachmentNode, NodeKind};

/// A node together with all of its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtreeNode {
    /// Node ID.
    pub id: NodeId,
    /// Display name without extension.
    pub name: String,
    /// File or folder.
    pub kind: NodeKind,
    /// Size in bytes.
    pub size: u64,
    /// Storage path fragment.
    pub path_segment: String,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
    /// Last modifier.
    pub modifier: String,
    /// Child nodes.
    pub children: Vec<SubtreeNode>,
}

impl SubtreeNode {
    /// Wrap a node with the given children.
    pub fn new(node: AttachmentNode, children: Vec<SubtreeNode>) -> Self {
        Self {
            id: node.id,
            name: node.name,
            kind: node.kind,
            size: node.size,
            path_segment: node.path_segment,
            modified_at: node.modified_at,
            modifier: node.modifier,
            children,
        }
    }

    /// Number of nodes in this subtree, itself included.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(SubtreeNode::len).sum::<usize>()
    }

    /// A subtree always contains at least its own node.
    pub fn is_empty(&self) -> bool {
        false
    }
}
