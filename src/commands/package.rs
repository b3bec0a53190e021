//! The `package` command.

use std::path::{Path, PathBuf};

use clap::Args;
use tempfile::NamedTempFile;

use attachhub_core::error::{AppError, ErrorKind};
use attachhub_core::types::NodeId;
use attachhub_service::AttachmentService;

use super::Workspace;
use crate::output;

/// Arguments for `package`
#[derive(Debug, Args)]
pub struct PackageArgs {
    /// Requested node IDs
    #[arg(required = true)]
    pub ids: Vec<NodeId>,
    /// Output file (defaults to the archive's own name)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Execute `package`
pub async fn execute(args: &PackageArgs, ws: &Workspace) -> Result<(), AppError> {
    match write_archive(&ws.service, &args.ids, args.out.clone(), Path::new(".")).await? {
        Some(out) => output::print_success(&format!("Wrote {}", out.display())),
        None => output::print_warning("None of the requested attachments exist"),
    }
    Ok(())
}

/// Package `ids` into `out`, or under the archive's own name in `default_dir`.
///
/// The archive is staged in a temporary file beside its destination and
/// renamed into place only once complete. Returns `None` when none of the
/// ids exist.
async fn write_archive(
    service: &AttachmentService,
    ids: &[NodeId],
    out: Option<PathBuf>,
    default_dir: &Path,
) -> Result<Option<PathBuf>, AppError> {
    let staging_dir = match &out {
        Some(path) => path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf(),
        None => default_dir.to_path_buf(),
    };
    let mut staged = blocking(move || {
        NamedTempFile::new_in(&staging_dir).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create a staging file in {}", staging_dir.display()),
                e,
            )
        })
    })
    .await?;

    // dropping `staged` on any early return removes it
    let Some(name) = service.package(ids, &mut staged).await? else {
        return Ok(None);
    };

    let target = out.unwrap_or_else(|| default_dir.join(&name));
    let destination = target.clone();
    blocking(move || {
        staged.persist(&destination).map(drop).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write {}", destination.display()),
                e,
            )
        })
    })
    .await?;
    Ok(Some(target))
}

async fn blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Blocking task failed", e))?
}
