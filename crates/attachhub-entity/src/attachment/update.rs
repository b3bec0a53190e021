//! Typed partial update for an attachment node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use attachhub_core::types::NodeId;

use super::model::{AttachmentNode, NodeKind};

/// Fields to change on a node. `None` leaves a field untouched.
///
/// The module tag is deliberately absent: a node never changes owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New kind (for example a changed extension after a reupload).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    /// New size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// New storage path fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_segment: Option<String>,
    /// New parent. `Some(None)` turns the node into a root.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<NodeId>>,
    /// The acting user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// Modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl AttachmentUpdate {
    /// An update that relocates the node.
    pub fn relocation(parent_id: Option<Option<NodeId>>, path_segment: Option<String>) -> Self {
        Self {
            parent_id,
            path_segment,
            ..Self::default()
        }
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.size.is_none()
            && self.path_segment.is_none()
            && self.parent_id.is_none()
            && self.modifier.is_none()
            && self.modified_at.is_none()
    }

    /// Whether applying this update changes the node's physical location.
    pub fn relocates(&self) -> bool {
        self.path_segment.is_some() || self.parent_id.is_some()
    }

    /// Apply every set field to `node`.
    pub fn apply_to(&self, node: &mut AttachmentNode) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(kind) = &self.kind {
            node.kind = kind.clone();
        }
        if let Some(size) = self.size {
            node.size = size;
        }
        if let Some(segment) = &self.path_segment {
            node.path_segment = segment.clone();
        }
        if let Some(parent) = &self.parent_id {
            node.parent_id = parent.clone();
        }
        if let Some(modifier) = &self.modifier {
            node.modifier = modifier.clone();
        }
        if let Some(at) = self.modified_at {
            node.modified_at = at;
        }
    }

    /// The update that restores `node`'s current values for every field
    /// this update would touch.
    pub fn inverse_for(&self, node: &AttachmentNode) -> Self {
        Self {
            name: self.name.as_ref().map(|_| node.name.clone()),
            kind: self.kind.as_ref().map(|_| node.kind.clone()),
            size: self.size.map(|_| node.size),
            path_segment: self.path_segment.as_ref().map(|_| node.path_segment.clone()),
            parent_id: self.parent_id.as_ref().map(|_| node.parent_id.clone()),
            modifier: self.modifier.as_ref().map(|_| node.modifier.clone()),
            modified_at: self.modified_at.map(|_| node.modified_at),
        }
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
