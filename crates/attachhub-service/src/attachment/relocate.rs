//! Physical relocation of renamed or reparented nodes.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use attachhub_core::error::AppError;
use attachhub_core::result::AppResult;
use attachhub_core::traits::storage::StorageProvider;
use attachhub_core::types::NodeId;
use attachhub_database::AttachmentRepository;
use attachhub_entity::attachment::{AttachmentNode, AttachmentUpdate, NodeKind};

use super::path::PathResolver;

/// Where a node's physical content was before and after an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    /// The moved node.
    pub id: NodeId,
    /// Full path before the update.
    pub from: String,
    /// Full path after the update.
    pub to: String,
}

impl Relocation {
    /// Whether the physical location actually changed.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Applies location-changing updates to both the record and the store.
#[derive(Debug, Clone)]
pub struct MoveCoordinator {
    repo: Arc<dyn AttachmentRepository>,
    storage: Arc<dyn StorageProvider>,
    resolver: PathResolver,
}

impl MoveCoordinator {
    /// Creates a new move coordinator.
    pub fn new(repo: Arc<dyn AttachmentRepository>, storage: Arc<dyn StorageProvider>) -> Self {
        let resolver = PathResolver::new(repo.clone());
        Self {
            repo,
            storage,
            resolver,
        }
    }

    /// Apply `update` to `id` and move its file or directory to match.
    ///
    /// The new parent must exist and must not be the node itself or one of
    /// its descendants. A pre-existing target of the same kind is replaced;
    /// one of the other kind is `InvalidState`. If the physical move fails
    /// the record change is reverted before the error is returned.
    pub async fn apply(&self, id: &NodeId, update: &AttachmentUpdate) -> AppResult<Relocation> {
        let node = self
            .repo
            .get_node(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attachment {id} not found")))?;
        if let Some(Some(parent_id)) = &update.parent_id {
            self.check_new_parent(id, parent_id).await?;
        }

        let from = self.resolver.resolve(id).await?;
        self.repo.update_node(id, update).await?;

        let result = match self.resolver.resolve(id).await {
            Ok(to) => self.relocate(&node.kind, &from, &to).await.map(|()| to),
            Err(e) => Err(e),
        };
        let to = match result {
            Ok(to) => to,
            Err(e) => {
                self.roll_back(&node, update).await;
                return Err(e);
            }
        };

        info!(id = %id, from = %from, to = %to, "Relocated attachment");
        Ok(Relocation {
            id: id.clone(),
            from,
            to,
        })
    }

    async fn check_new_parent(&self, id: &NodeId, parent_id: &NodeId) -> AppResult<()> {
        if parent_id == id {
            return Err(AppError::invalid_state(format!(
                "Cannot move attachment {id} into itself"
            )));
        }
        let chain = self.resolver.ancestry(parent_id).await?.ok_or_else(|| {
            AppError::not_found(format!("Target parent {parent_id} not found"))
        })?;
        if chain.iter().any(|ancestor| &ancestor.id == id) {
            return Err(AppError::invalid_state(format!(
                "Cannot move attachment {id} below its own descendant {parent_id}"
            )));
        }
        Ok(())
    }

    async fn relocate(&self, kind: &NodeKind, from: &str, to: &str) -> AppResult<()> {
        if from == to {
            return Ok(());
        }
        if from.starts_with(&format!("{to}/")) || to.starts_with(&format!("{from}/")) {
            return Err(AppError::invalid_state(format!(
                "Move target {to} overlaps its source {from}"
            )));
        }

        let mut replaced = None;
        if self.storage.exists(to).await? {
            let existing = self.storage.metadata(to).await?;
            if existing.is_directory != kind.is_folder() {
                return Err(AppError::invalid_state(format!(
                    "Move target {to} already exists as a different kind"
                )));
            }
            // Parked until the rename succeeds.
            let aside = format!("{to}.replaced-{}", NodeId::new());
            self.storage.rename(to, &aside).await?;
            replaced = Some((aside, existing.is_directory));
        }

        if let Err(e) = self.storage.rename(from, to).await {
            if let Some((aside, _)) = &replaced {
                if let Err(restore) = self.storage.rename(aside, to).await {
                    error!(
                        path = %to,
                        parked = %aside,
                        error = %restore,
                        "Failed to restore replaced move target"
                    );
                }
            }
            return Err(e);
        }

        if let Some((aside, is_directory)) = replaced {
            warn!(path = %to, "Replaced existing move target");
            if is_directory {
                self.storage.delete_dir(&aside).await?;
            } else {
                self.storage.delete(&aside).await?;
            }
        }
        Ok(())
    }

    async fn roll_back(&self, node: &AttachmentNode, update: &AttachmentUpdate) {
        let revert = update.inverse_for(node);
        match self.repo.update_node(&node.id, &revert).await {
            Ok(()) => warn!(id = %node.id, "Reverted attachment update after failed move"),
            Err(e) => error!(id = %node.id, error = %e, "Failed to revert attachment update"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attachhub_core::error::ErrorKind;
    use attachhub_database::MemoryAttachmentRepository;

    use crate::attachment::fixtures::{content_of, materialize, sample_repo, stream_of};

    async fn setup() -> (
        tempfile::TempDir,
        Arc<MemoryAttachmentRepository>,
        Arc<attachhub_storage::LocalStorageProvider>,
        MoveCoordinator,
    ) {
        let repo = sample_repo();
        let (dir, storage) = materialize(&repo).await;
        let mover = MoveCoordinator::new(repo.clone(), storage.clone());
        (dir, repo, storage, mover)
    }

    fn reparent(parent: &str) -> AttachmentUpdate {
        AttachmentUpdate::relocation(Some(Some(NodeId::from(parent))), None)
    }

    #[tokio::test]
    async fn test_folder_move_carries_subtree() {
        let (_dir, repo, storage, mover) = setup().await;
        let moved = mover.apply(&NodeId::from("110"), &reparent("200")).await.unwrap();

        assert_eq!(moved.from, "path100/path110");
        assert_eq!(moved.to, "path200/path110");
        assert!(storage.exists("path200/path110/path111").await.unwrap());
        assert!(!storage.exists("path100/path110").await.unwrap());

        let resolver = PathResolver::new(repo);
        assert_eq!(
            resolver.resolve(&NodeId::from("112")).await.unwrap(),
            "path200/path110/path112"
        );
    }

    #[tokio::test]
    async fn test_rename_segment_and_move_to_root() {
        let (_dir, _repo, storage, mover) = setup().await;
        let update = AttachmentUpdate::relocation(Some(None), Some("loose".into()));
        let moved = mover.apply(&NodeId::from("121"), &update).await.unwrap();
        assert_eq!(moved.to, "loose");
        assert!(storage.exists("loose").await.unwrap());
    }

    #[tokio::test]
    async fn test_same_kind_target_is_replaced() {
        let (_dir, _repo, storage, mover) = setup().await;
        storage
            .write_stream("path100/path120/stale", stream_of("old"))
            .await
            .unwrap();
        let update = AttachmentUpdate::relocation(Some(Some(NodeId::from("120"))), Some("stale".into()));
        mover.apply(&NodeId::from("111"), &update).await.unwrap();

        let meta = storage.metadata("path100/path120/stale").await.unwrap();
        assert_eq!(meta.size_bytes, content_of("111").len() as u64);
    }

    #[tokio::test]
    async fn test_target_containing_source_is_rejected_untouched() {
        let (_dir, repo, storage, mover) = setup().await;
        // 110 lives at path100/path110; moving it to root as "path100" would
        // replace its own ancestor directory
        let update = AttachmentUpdate::relocation(Some(None), Some("path100".into()));
        let err = mover.apply(&NodeId::from("110"), &update).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);

        assert!(storage.exists("path100/path110/path111").await.unwrap());
        assert!(storage.exists("path100/path120/path121").await.unwrap());
        let node = repo.get_node(&NodeId::from("110")).await.unwrap().unwrap();
        assert_eq!(node.parent_id, Some(NodeId::from("100")));
    }

    #[tokio::test]
    async fn test_failed_rename_keeps_replaced_target() {
        let (_dir, _repo, storage, mover) = setup().await;
        storage.delete("path200/path201").await.unwrap();
        storage
            .write_stream("path100/path201", stream_of("keep me"))
            .await
            .unwrap();

        // the source is gone, so the rename fails after the target was parked
        let err = mover
            .apply(&NodeId::from("201"), &reparent("100"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        let meta = storage.metadata("path100/path201").await.unwrap();
        assert_eq!(meta.size_bytes, "keep me".len() as u64);
    }

    #[tokio::test]
    async fn test_kind_mismatch_rolls_back() {
        let (_dir, repo, storage, mover) = setup().await;
        // 123 is a folder at path100/path120/path123; move file 121 onto it
        let update = AttachmentUpdate::relocation(None, Some("path123".into()));
        let err = mover.apply(&NodeId::from("121"), &update).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);

        let node = repo.get_node(&NodeId::from("121")).await.unwrap().unwrap();
        assert_eq!(node.path_segment, "path121");
        assert!(storage.exists("path100/path120/path121").await.unwrap());
    }

    #[tokio::test]
    async fn test_move_below_descendant_rejected() {
        let (_dir, repo, _storage, mover) = setup().await;
        for target in ["100", "110"] {
            let err = mover
                .apply(&NodeId::from("100"), &reparent(target))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidState);
        }
        let root = repo.get_node(&NodeId::from("100")).await.unwrap().unwrap();
        assert!(root.is_root());
    }

    #[tokio::test]
    async fn test_missing_node_or_parent_is_not_found() {
        let (_dir, _repo, _storage, mover) = setup().await;
        assert!(
            mover
                .apply(&NodeId::from("nope"), &reparent("100"))
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            mover
                .apply(&NodeId::from("111"), &reparent("nope"))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_missing_source_rolls_back() {
        let (_dir, repo, storage, mover) = setup().await;
        storage.delete("path200/path201").await.unwrap();
        let err = mover
            .apply(&NodeId::from("201"), &reparent("100"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);

        let node = repo.get_node(&NodeId::from("201")).await.unwrap().unwrap();
        assert_eq!(node.parent_id, Some(NodeId::from("200")));
    }
}
