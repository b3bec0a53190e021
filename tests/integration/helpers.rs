//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tempfile::TempDir;

use attachhub_core::config::AppConfig;
use attachhub_core::traits::storage::ByteStream;
use attachhub_core::types::NodeId;
use attachhub_database::MemoryAttachmentRepository;
use attachhub_entity::attachment::{AttachmentNode, CreateAttachment, NodeKind};
use attachhub_service::{AttachmentService, RequestContext};
use attachhub_storage::LocalStorageProvider;

/// Test application context
pub struct TestApp {
    /// Keeps the storage root alive for the test's duration
    pub root: TempDir,
    /// Records
    pub repo: Arc<MemoryAttachmentRepository>,
    /// Physical store rooted in `root`
    pub storage: Arc<LocalStorageProvider>,
    /// Service under test
    pub service: AttachmentService,
}

impl TestApp {
    /// Create an empty application over a fresh storage root
    pub async fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create storage root");
        let mut config = AppConfig::default();
        config.storage.root_path = root.path().display().to_string();
        config.archive.chunk_size_bytes = 8;
        config.validate().expect("Invalid test config");

        let repo = Arc::new(MemoryAttachmentRepository::new());
        let storage = Arc::new(
            LocalStorageProvider::new(&config.storage.root_path)
                .await
                .expect("Failed to init storage"),
        );
        let service = AttachmentService::new(repo.clone(), storage.clone(), &config.archive);
        Self {
            root,
            repo,
            storage,
            service,
        }
    }

    /// Create the sample tree through the upload path:
    ///
    /// ```text
    /// 100/ ─┬─ 110/ ─┬─ 111.xml
    ///       │        └─ 112.txt
    ///       └─ 120/ ─┬─ 121.pdf
    ///                ├─ 122.pdf
    ///                └─ 123/
    /// 200/ ─── 201.csv
    /// ```
    pub async fn with_sample_tree() -> Self {
        let app = Self::new().await;
        for (id, parent, ext) in [
            ("100", None, None),
            ("110", Some("100"), None),
            ("111", Some("110"), Some("xml")),
            ("112", Some("110"), Some("txt")),
            ("120", Some("100"), None),
            ("121", Some("120"), Some("pdf")),
            ("122", Some("120"), Some("pdf")),
            ("123", Some("120"), None),
            ("200", None, None),
            ("201", Some("200"), Some("csv")),
        ] {
            app.add(id, parent, ext).await;
        }
        app
    }

    /// Upload one node named `name{id}` at segment `path{id}`
    pub async fn add(&self, id: &str, parent: Option<&str>, ext: Option<&str>) -> AttachmentNode {
        let kind = ext.map_or(NodeKind::Folder, |e| NodeKind::File(e.to_string()));
        let content = ext.map(|_| stream_of(content_of(id)));
        let req = CreateAttachment {
            id: Some(NodeId::from(id)),
            name: format!("name{id}"),
            kind,
            size: None,
            path_segment: format!("path{id}"),
            parent_id: parent.map(NodeId::from),
            module_id: Some("orders".into()),
            creator: "tester".into(),
        };
        self.service.upload(req, content).await.expect("upload")
    }

    /// Package `raw` ids into memory and return the archive name and bytes
    pub async fn package(&self, raw: &[&str]) -> (Option<String>, Vec<u8>) {
        let mut sink = Cursor::new(Vec::new());
        let name = self
            .service
            .package(&ids(raw), &mut sink)
            .await
            .expect("package");
        (name, sink.into_inner())
    }

    /// Whether a root-relative path exists physically
    pub fn exists(&self, path: &str) -> bool {
        self.root.path().join(path).exists()
    }
}

/// Sorted entry names of a zip archive
pub fn entry_names(archive: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(archive)).expect("valid zip");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Content of one zip entry
pub fn entry_content(archive: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive)).expect("valid zip");
    let mut content = String::new();
    archive
        .by_name(name)
        .expect("entry present")
        .read_to_string(&mut content)
        .expect("readable entry");
    content
}

pub fn ids(raw: &[&str]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId::from).collect()
}

pub fn content_of(id: &str) -> String {
    format!("stored bytes of attachment {id}\n")
}

pub fn stream_of(data: impl Into<Bytes>) -> ByteStream {
    let data = data.into();
    Box::pin(futures::stream::iter(vec![Ok(data)]))
}

pub fn ctx() -> RequestContext {
    RequestContext {
        actor: "integration".into(),
        request_time: Utc::now(),
    }
}
