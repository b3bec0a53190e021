//! Archive plan types.

use serde::{Deserialize, Serialize};

use attachhub_core::types::NodeId;

use super::model::NodeKind;

/// One node participating in an archive request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// The node this entry writes.
    pub terminus_id: NodeId,
    /// The least common ancestor the zip path was computed from, if any.
    pub origin_id: Option<NodeId>,
    /// Root-relative physical storage path.
    pub physical_path: String,
    /// Display path inside the archive, extension-free for files.
    pub zip_path: String,
    /// File or folder.
    pub kind: NodeKind,
}

impl ArchiveEntry {
    /// The name written into the zip: folders get a trailing `/`, files
    /// get their extension back.
    pub fn entry_name(&self) -> String {
        match &self.kind {
            NodeKind::File(ext) => format!("{}.{}", self.zip_path, ext),
            NodeKind::Folder => format!("{}/", self.zip_path),
        }
    }

    /// The first segment of the zip path.
    pub fn top_segment(&self) -> &str {
        self.zip_path.split('/').next().unwrap_or(&self.zip_path)
    }
}

/// Entries ordered by zip path plus the default archive file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePlan {
    /// Entries sorted by `zip_path` ascending.
    pub entries: Vec<ArchiveEntry>,
    /// `None` when there is nothing to archive.
    pub archive_name: Option<String>,
}

impl ArchivePlan {
    /// A plan with nothing to archive.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether there is nothing to archive.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
