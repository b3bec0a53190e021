//! Zip packaging configuration.

use serde::{Deserialize, Serialize};

/// How file entries are stored inside a produced archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    /// Entries are written uncompressed.
    Store,
    /// Entries are deflate-compressed.
    #[default]
    Deflate,
}

/// Archive writer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Size of each read from a physical file while streaming it into
    /// the archive.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
    /// Entry compression method.
    #[serde(default)]
    pub compression: ArchiveCompression,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size(),
            compression: ArchiveCompression::default(),
        }
    }
}

fn default_chunk_size() -> usize {
    1024
}
