//! Attachment node entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attachhub_core::types::NodeId;

/// Whether a node is a file (with its extension) or a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "extension", rename_all = "lowercase")]
pub enum NodeKind {
    /// A regular file; the extension carries no leading dot.
    File(String),
    /// A folder.
    Folder,
}

impl NodeKind {
    /// Check if this kind is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder)
    }

    /// The file extension, if this is a file.
    pub fn extension(&self) -> Option<&str> {
        match self {
            Self::File(ext) => Some(ext),
            Self::Folder => None,
        }
    }
}

/// A file or folder attached to a business module record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentNode {
    /// Unique node identifier.
    pub id: NodeId,
    /// Display name without extension.
    pub name: String,
    /// File or folder.
    pub kind: NodeKind,
    /// Size in bytes (0 for folders).
    #[serde(default)]
    pub size: u64,
    /// This node's own storage path fragment. May itself contain `/`.
    pub path_segment: String,
    /// Owning node (None for roots).
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Tag of the owning business module.
    #[serde(default)]
    pub module_id: Option<String>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// Who created the node.
    pub creator: String,
    /// When the node was last modified.
    pub modified_at: DateTime<Utc>,
    /// Who last modified the node.
    pub modifier: String,
}

impl AttachmentNode {
    /// Check if this is a root node (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this node is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// The display file name: `name` for folders, `name.extension` for files.
    pub fn file_name(&self) -> String {
        match &self.kind {
            NodeKind::File(ext) => format!("{}.{}", self.name, ext),
            NodeKind::Folder => self.name.clone(),
        }
    }
}

/// Data required to create a new node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachment {
    /// Caller-chosen id; a random one is generated when absent.
    #[serde(default)]
    pub id: Option<NodeId>,
    /// Display name without extension.
    pub name: String,
    /// File or folder.
    pub kind: NodeKind,
    /// Known size in bytes; measured from the upload when absent.
    #[serde(default)]
    pub size: Option<u64>,
    /// Storage path fragment below the parent's full path.
    pub path_segment: String,
    /// Owning node (None for roots).
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Tag of the owning business module.
    #[serde(default)]
    pub module_id: Option<String>,
    /// The acting user.
    pub creator: String,
}

impl CreateAttachment {
    /// Build the node record, stamping both audit pairs with `now`.
    pub fn into_node(self, size: u64, now: DateTime<Utc>) -> AttachmentNode {
        AttachmentNode {
            id: self.id.unwrap_or_default(),
            name: self.name,
            kind: self.kind,
            size,
            path_segment: self.path_segment,
            parent_id: self.parent_id,
            module_id: self.module_id,
            created_at: now,
            modifier: self.creator.clone(),
            creator: self.creator,
            modified_at: now,
        }
    }
}
