//! Shared test tree.
//!
//! ```text
//! 100/                    200/
//! ├── 110/                └── 201.csv
//! │   ├── 111.xml
//! │   └── 112.txt
//! └── 120/
//!     ├── 121.pdf
//!     ├── 122.pdf
//!     └── 123/
//! ```
//!
//! Every node is named `name{id}` and stored under the segment `path{id}`.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;

use attachhub_core::traits::storage::{ByteStream, StorageProvider};
use attachhub_core::types::NodeId;
use attachhub_database::MemoryAttachmentRepository;
use attachhub_entity::attachment::{AttachmentNode, NodeKind};
use attachhub_storage::LocalStorageProvider;

use super::path::PathResolver;

pub(crate) fn node(id: &str, parent: Option<&str>, kind: NodeKind) -> AttachmentNode {
    let now = Utc::now();
    AttachmentNode {
        id: NodeId::from(id),
        name: format!("name{id}"),
        kind,
        size: 0,
        path_segment: format!("path{id}"),
        parent_id: parent.map(NodeId::from),
        module_id: Some("orders".into()),
        created_at: now,
        creator: "tester".into(),
        modified_at: now,
        modifier: "tester".into(),
    }
}

pub(crate) fn folder(id: &str, parent: Option<&str>) -> AttachmentNode {
    node(id, parent, NodeKind::Folder)
}

pub(crate) fn file(id: &str, parent: Option<&str>, ext: &str) -> AttachmentNode {
    node(id, parent, NodeKind::File(ext.into()))
}

pub(crate) fn sample_nodes() -> Vec<AttachmentNode> {
    vec![
        folder("100", None),
        folder("110", Some("100")),
        file("111", Some("110"), "xml"),
        file("112", Some("110"), "txt"),
        folder("120", Some("100")),
        file("121", Some("120"), "pdf"),
        file("122", Some("120"), "pdf"),
        folder("123", Some("120")),
        folder("200", None),
        file("201", Some("200"), "csv"),
    ]
}

pub(crate) fn sample_memory() -> MemoryAttachmentRepository {
    MemoryAttachmentRepository::with_nodes(sample_nodes())
}

pub(crate) fn sample_repo() -> Arc<MemoryAttachmentRepository> {
    Arc::new(sample_memory())
}

pub(crate) fn ids(raw: &[&str]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId::from).collect()
}

/// The content stored for a file node.
pub(crate) fn content_of(id: &str) -> String {
    format!("content of {id}\n")
}

pub(crate) fn stream_of(data: impl Into<Bytes>) -> ByteStream {
    let data = data.into();
    Box::pin(futures::stream::iter(vec![Ok(data)]))
}

/// A storage root holding every node of `repo` at its resolved path.
pub(crate) async fn materialize(
    repo: &Arc<MemoryAttachmentRepository>,
) -> (tempfile::TempDir, Arc<LocalStorageProvider>) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorageProvider::new(dir.path()).await.unwrap());
    let resolver = PathResolver::new(repo.clone());
    for node in repo.snapshot() {
        let path = resolver.resolve(&node.id).await.unwrap();
        if node.is_folder() {
            storage.create_dir(&path).await.unwrap();
        } else {
            storage
                .write_stream(&path, stream_of(content_of(node.id.as_str())))
                .await
                .unwrap();
        }
    }
    (dir, storage)
}
