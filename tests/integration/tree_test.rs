//! Integration tests for path resolution and descendant listing.

mod helpers;

use attachhub_core::types::NodeId;
use helpers::TestApp;

#[tokio::test]
async fn test_resolved_paths_match_storage() {
    let app = TestApp::with_sample_tree().await;
    for (id, expected) in [
        ("100", "path100"),
        ("123", "path100/path120/path123"),
        ("201", "path200/path201"),
    ] {
        let path = app.service.resolve_path(&NodeId::from(id)).await.unwrap();
        assert_eq!(path, expected);
        assert!(app.exists(&path));
    }
}

#[tokio::test]
async fn test_descendants_nest_and_missing_is_empty() {
    let app = TestApp::with_sample_tree().await;
    let tree = app
        .service
        .list_descendants(&NodeId::from("100"))
        .await
        .unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[1].children.len(), 3);

    assert!(
        app.service
            .list_descendants(&NodeId::from("nope"))
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        app.service
            .list_descendants(&NodeId::from("201"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_uploaded_sizes_recorded() {
    let app = TestApp::with_sample_tree().await;
    let node = app.service.get(&NodeId::from("111")).await.unwrap();
    assert_eq!(node.size, helpers::content_of("111").len() as u64);
    assert_eq!(node.creator, "tester");
}
