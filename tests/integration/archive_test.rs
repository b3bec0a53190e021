//! Integration tests for archive planning and packaging.

mod helpers;

use helpers::{TestApp, content_of, entry_content, entry_names, ids};

#[tokio::test]
async fn test_cousins_archive_under_common_root() {
    let app = TestApp::with_sample_tree().await;
    let (name, bytes) = app.package(&["110", "121"]).await;

    assert_eq!(name.as_deref(), Some("name100.zip"));
    assert_eq!(
        entry_names(&bytes),
        vec![
            "name100/name110/",
            "name100/name110/name111.xml",
            "name100/name110/name112.txt",
            "name100/name120/name121.pdf",
        ]
    );
    assert_eq!(
        entry_content(&bytes, "name100/name120/name121.pdf"),
        content_of("121")
    );
}

#[tokio::test]
async fn test_single_file_archive_name_keeps_extension() {
    let app = TestApp::with_sample_tree().await;
    let (name, bytes) = app.package(&["111"]).await;
    assert_eq!(name.as_deref(), Some("name111.xml.zip"));
    assert_eq!(entry_names(&bytes), vec!["name111.xml"]);
}

#[tokio::test]
async fn test_single_folder_archive() {
    let app = TestApp::with_sample_tree().await;
    let (name, bytes) = app.package(&["120"]).await;
    assert_eq!(name.as_deref(), Some("name120.zip"));
    assert_eq!(
        entry_names(&bytes),
        vec![
            "name120/",
            "name120/name121.pdf",
            "name120/name122.pdf",
            "name120/name123/",
        ]
    );
}

#[tokio::test]
async fn test_disconnected_trees_archive_as_root() {
    let app = TestApp::with_sample_tree().await;
    let (name, bytes) = app.package(&["112", "201"]).await;
    assert_eq!(name.as_deref(), Some("root.zip"));
    assert_eq!(entry_names(&bytes), vec!["name112.txt", "name201.csv"]);
}

#[tokio::test]
async fn test_requested_parent_absorbs_requested_child() {
    let app = TestApp::with_sample_tree().await;
    let plan = app.service.plan_archive(&ids(&["120", "121"])).await.unwrap();
    assert_eq!(
        plan.entries[0].origin_id.as_ref().map(|id| id.as_str()),
        Some("120")
    );
    let written: Vec<&str> = plan
        .entries
        .iter()
        .map(|e| e.terminus_id.as_str())
        .filter(|id| *id == "121")
        .collect();
    assert_eq!(written.len(), 1);
}

#[tokio::test]
async fn test_nothing_to_archive() {
    let app = TestApp::with_sample_tree().await;
    let (name, bytes) = app.package(&["missing"]).await;
    assert_eq!(name, None);
    assert!(bytes.is_empty());
}
