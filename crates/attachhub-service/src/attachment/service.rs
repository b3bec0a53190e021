//! Attachment service: the public operations over the tree components.

use std::collections::BTreeSet;
use std::io::{Seek, Write};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use attachhub_core::config::archive::ArchiveConfig;
use attachhub_core::error::AppError;
use attachhub_core::result::AppResult;
use attachhub_core::traits::storage::{ByteStream, StorageProvider};
use attachhub_core::types::{NodeId, PageRequest, PageResponse};
use attachhub_database::AttachmentRepository;
use attachhub_entity::attachment::{
    ArchivePlan, AttachmentNode, AttachmentUpdate, CreateAttachment, SubtreeNode,
};

use super::archive::ArchivePlanner;
use super::delete::CascadeDeletePlanner;
use super::package::ZipStreamAssembler;
use super::path::PathResolver;
use super::relocate::{MoveCoordinator, Relocation};
use super::tree::DescendantTreeBuilder;
use crate::context::RequestContext;

/// Attachment operations over a repository and a physical store.
#[derive(Debug, Clone)]
pub struct AttachmentService {
    /// Node records.
    repo: Arc<dyn AttachmentRepository>,
    /// Physical file store.
    storage: Arc<dyn StorageProvider>,
    resolver: PathResolver,
    trees: DescendantTreeBuilder,
    planner: ArchivePlanner,
    assembler: ZipStreamAssembler,
    deleter: CascadeDeletePlanner,
    mover: MoveCoordinator,
}

impl AttachmentService {
    /// Creates a new attachment service.
    pub fn new(
        repo: Arc<dyn AttachmentRepository>,
        storage: Arc<dyn StorageProvider>,
        archive: &ArchiveConfig,
    ) -> Self {
        Self {
            resolver: PathResolver::new(repo.clone()),
            trees: DescendantTreeBuilder::new(repo.clone()),
            planner: ArchivePlanner::new(repo.clone()),
            assembler: ZipStreamAssembler::new(storage.clone(), archive),
            deleter: CascadeDeletePlanner::new(repo.clone()),
            mover: MoveCoordinator::new(repo.clone(), storage.clone()),
            repo,
            storage,
        }
    }

    /// Gets a node by ID.
    pub async fn get(&self, id: &NodeId) -> AppResult<AttachmentNode> {
        self.repo
            .get_node(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attachment {id} not found")))
    }

    /// Nodes tagged with `module_id`, optionally only the direct children of
    /// `parent_id`, newest first.
    pub async fn find_by_module(
        &self,
        module_id: &str,
        parent_id: Option<&NodeId>,
    ) -> AppResult<Vec<AttachmentNode>> {
        self.repo.find_by_module(module_id, parent_id).await
    }

    /// One page over every node, newest first.
    pub async fn find_page(&self, page: &PageRequest) -> AppResult<PageResponse<AttachmentNode>> {
        self.repo.find_page(page).await
    }

    /// The distinct module tags of the existing `ids`. Untagged nodes
    /// contribute `None`.
    pub async fn distinct_modules(&self, ids: &[NodeId]) -> AppResult<Vec<Option<String>>> {
        let mut modules = BTreeSet::new();
        for id in ids {
            if let Some(node) = self.repo.get_node(id).await? {
                modules.insert(node.module_id);
            }
        }
        Ok(modules.into_iter().collect())
    }

    /// The node's root-relative physical path.
    pub async fn resolve_path(&self, id: &NodeId) -> AppResult<String> {
        self.resolver.resolve(id).await
    }

    /// The children of `id` with their descendants nested. Empty when `id`
    /// has no children or does not exist.
    pub async fn list_descendants(&self, id: &NodeId) -> AppResult<Vec<SubtreeNode>> {
        self.trees.descendants_of(id).await
    }

    /// Plan an archive without writing anything.
    pub async fn plan_archive(&self, ids: &[NodeId]) -> AppResult<ArchivePlan> {
        self.planner.plan(ids).await
    }

    /// Plan an archive of `ids` and write it to `sink`.
    ///
    /// Returns the archive's default file name, or `None` without touching
    /// the sink when none of the ids exist.
    pub async fn package<W>(&self, ids: &[NodeId], sink: &mut W) -> AppResult<Option<String>>
    where
        W: Write + Seek + Send,
    {
        let plan = self.planner.plan(ids).await?;
        if plan.is_empty() {
            debug!(requested = ids.len(), "Nothing to archive");
            return Ok(None);
        }
        self.assembler.write(&plan.entries, sink).await?;
        info!(
            entries = plan.entries.len(),
            archive = ?plan.archive_name,
            "Packaged attachments"
        );
        Ok(plan.archive_name)
    }

    /// Delete `ids` and all their descendants, records first, then the
    /// minimal set of physical paths. Returns the removed paths.
    pub async fn cascade_delete(&self, ids: &[NodeId]) -> AppResult<Vec<String>> {
        let plan = self.deleter.plan(ids).await?;
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let removed = self.repo.delete_nodes(&plan.removal_set).await?;
        let mut paths = Vec::with_capacity(plan.physical_targets.len());
        for target in plan.physical_targets {
            if target.kind.is_folder() {
                self.storage.delete_dir(&target.path).await?;
            } else {
                self.storage.delete(&target.path).await?;
            }
            paths.push(target.path);
        }

        info!(records = removed, paths = paths.len(), "Cascade deleted attachments");
        Ok(paths)
    }

    /// Move `id` under a new parent (`Some(None)` for root) and/or give it a
    /// new path segment, relocating its file or directory.
    pub async fn move_node(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        parent_id: Option<Option<NodeId>>,
        path_segment: Option<String>,
    ) -> AppResult<Relocation> {
        let update = AttachmentUpdate::relocation(parent_id, path_segment);
        if !update.relocates() {
            return Err(AppError::validation("A move needs a new parent or path segment"));
        }
        self.mover.apply(id, &stamped(ctx, update)?).await
    }

    /// Apply a partial update. Location changes go through the move
    /// coordinator; everything else only touches the record.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        update: AttachmentUpdate,
    ) -> AppResult<AttachmentNode> {
        let update = stamped(ctx, update)?;
        if update.relocates() {
            self.mover.apply(id, &update).await?;
        } else {
            self.repo.update_node(id, &update).await?;
        }
        info!(id = %id, actor = %ctx.actor, "Updated attachment");
        self.get(id).await
    }

    /// Store node records without touching the physical store.
    pub async fn create(&self, requests: Vec<CreateAttachment>) -> AppResult<Vec<NodeId>> {
        let now = Utc::now();
        let mut nodes = Vec::with_capacity(requests.len());
        for req in requests {
            validate_create(&req)?;
            let size = req.size.unwrap_or(0);
            nodes.push(req.into_node(size, now));
        }
        self.repo.save_nodes(&nodes).await?;
        info!(count = nodes.len(), "Created attachment records");
        Ok(nodes.into_iter().map(|n| n.id).collect())
    }

    /// Create a node and its physical content below its parent.
    ///
    /// Folders create a directory and ignore `content`; files require it.
    /// The written byte count becomes the size unless one was supplied.
    pub async fn upload(
        &self,
        req: CreateAttachment,
        content: Option<ByteStream>,
    ) -> AppResult<AttachmentNode> {
        validate_create(&req)?;
        let path = match &req.parent_id {
            Some(parent_id) => {
                let parent_path = self.resolver.resolve(parent_id).await?;
                format!("{parent_path}/{}", req.path_segment)
            }
            None => req.path_segment.clone(),
        };

        let size = if req.kind.is_folder() {
            self.storage.create_dir(&path).await?;
            0
        } else {
            let content = content
                .ok_or_else(|| AppError::validation("File upload requires content"))?;
            let written = self.storage.write_stream(&path, content).await?;
            req.size.unwrap_or(written)
        };

        let node = req.into_node(size, Utc::now());
        self.repo.save_nodes(std::slice::from_ref(&node)).await?;
        info!(id = %node.id, path = %path, size, "Uploaded attachment");
        Ok(node)
    }

    /// Replace a file's content in place and record its new size.
    pub async fn reupload(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        content: ByteStream,
    ) -> AppResult<AttachmentNode> {
        let node = self.get(id).await?;
        if node.is_folder() {
            return Err(AppError::validation(format!(
                "Attachment {id} is a folder and has no content"
            )));
        }

        let path = self.resolver.resolve(id).await?;
        let written = self.storage.write_stream(&path, content).await?;
        let update = AttachmentUpdate {
            size: Some(written),
            ..AttachmentUpdate::default()
        };
        self.repo.update_node(id, &stamped(ctx, update)?).await?;

        info!(id = %id, path = %path, size = written, "Reuploaded attachment");
        self.get(id).await
    }
}

/// Reject empty updates and stamp the acting user.
fn stamped(ctx: &RequestContext, mut update: AttachmentUpdate) -> AppResult<AttachmentUpdate> {
    if update.is_empty() {
        return Err(AppError::validation("Update changes nothing"));
    }
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("Name must not be empty"));
    }
    if update.path_segment.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(AppError::validation("Path segment must not be empty"));
    }
    update.modifier = Some(ctx.actor.clone());
    update.modified_at = Some(ctx.request_time);
    Ok(update)
}

fn validate_create(req: &CreateAttachment) -> AppResult<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if req.path_segment.trim().is_empty() {
        return Err(AppError::validation("Path segment must not be empty"));
    }
    Ok(())
}
