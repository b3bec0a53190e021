//! JSON manifest persistence for the in-memory repository.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use attachhub_core::result::AppResult;
use attachhub_database::MemoryAttachmentRepository;
use attachhub_entity::attachment::AttachmentNode;

/// Load every node listed in the manifest. A missing manifest is an empty
/// repository.
pub async fn load(path: &Path) -> AppResult<MemoryAttachmentRepository> {
    if !fs::try_exists(path).await? {
        debug!(path = %path.display(), "No manifest yet, starting empty");
        return Ok(MemoryAttachmentRepository::new());
    }
    let raw = fs::read(path).await?;
    let nodes: Vec<AttachmentNode> = serde_json::from_slice(&raw)?;
    debug!(path = %path.display(), nodes = nodes.len(), "Loaded manifest");
    Ok(MemoryAttachmentRepository::with_nodes(nodes))
}

/// Write the repository's current records back, ordered by id.
pub async fn save(path: &Path, repo: &MemoryAttachmentRepository) -> AppResult<()> {
    let nodes = repo.snapshot();
    let raw = serde_json::to_vec_pretty(&nodes)?;
    fs::write(path, raw).await?;
    debug!(path = %path.display(), nodes = nodes.len(), "Saved manifest");
    Ok(())
}
