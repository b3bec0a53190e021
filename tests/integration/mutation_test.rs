//! Integration tests for cascade delete and move.

mod helpers;

use attachhub_core::error::ErrorKind;
use attachhub_core::types::NodeId;
use helpers::{TestApp, ctx, entry_names, ids};

#[tokio::test]
async fn test_delete_parent_and_child_removes_one_path() {
    let app = TestApp::with_sample_tree().await;
    let removed = app.service.cascade_delete(&ids(&["110", "112"])).await.unwrap();

    assert_eq!(removed, vec!["path100/path110"]);
    assert!(!app.exists("path100/path110"));
    assert!(app.exists("path100/path120"));
    assert_eq!(app.repo.len(), 7);
}

#[tokio::test]
async fn test_delete_unrelated_and_repeat() {
    let app = TestApp::with_sample_tree().await;
    let removed = app.service.cascade_delete(&ids(&["123", "201"])).await.unwrap();
    assert_eq!(removed, vec!["path100/path120/path123", "path200/path201"]);

    let again = app.service.cascade_delete(&ids(&["123", "201"])).await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_move_folder_then_package() {
    let app = TestApp::with_sample_tree().await;
    let moved = app
        .service
        .move_node(
            &ctx(),
            &NodeId::from("120"),
            Some(Some(NodeId::from("200"))),
            Some("moved".into()),
        )
        .await
        .unwrap();
    assert_eq!(moved.from, "path100/path120");
    assert_eq!(moved.to, "path200/moved");
    assert!(app.exists("path200/moved/path121"));

    let (name, bytes) = app.package(&["121", "201"]).await;
    assert_eq!(name.as_deref(), Some("name200.zip"));
    assert_eq!(
        entry_names(&bytes),
        vec!["name200/name120/name121.pdf", "name200/name201.csv"]
    );
}

#[tokio::test]
async fn test_move_into_own_subtree_rejected() {
    let app = TestApp::with_sample_tree().await;
    let err = app
        .service
        .move_node(&ctx(), &NodeId::from("100"), Some(Some(NodeId::from("123"))), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert!(app.exists("path100/path120/path123"));
}

#[tokio::test]
async fn test_reupload_replaces_content() {
    let app = TestApp::with_sample_tree().await;
    let node = app
        .service
        .reupload(&ctx(), &NodeId::from("122"), helpers::stream_of("v2"))
        .await
        .unwrap();
    assert_eq!(node.size, 2);
    assert_eq!(node.modifier, "integration");

    let (_, bytes) = app.package(&["122"]).await;
    assert_eq!(helpers::entry_content(&bytes, "name122.pdf"), "v2");
}
