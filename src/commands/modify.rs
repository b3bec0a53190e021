//! Mutating commands: delete, move, upload.

use std::path::PathBuf;

use clap::Args;
use tokio_util::io::ReaderStream;

use attachhub_core::error::{AppError, ErrorKind};
use attachhub_core::traits::storage::ByteStream;
use attachhub_core::types::NodeId;
use attachhub_entity::attachment::{CreateAttachment, NodeKind};
use attachhub_service::RequestContext;

use super::Workspace;
use crate::output::{self, OutputFormat};

/// Arguments for `delete`
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Node IDs to delete with their descendants
    #[arg(required = true)]
    pub ids: Vec<NodeId>,
}

/// Arguments for `move`
#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Node ID
    pub id: NodeId,
    /// New parent node ID
    #[arg(short, long, conflicts_with = "root")]
    pub parent: Option<NodeId>,
    /// Make the node a root
    #[arg(long)]
    pub root: bool,
    /// New path segment
    #[arg(short, long)]
    pub segment: Option<String>,
    /// Acting user
    #[arg(long, default_value = "cli")]
    pub actor: String,
}

/// Arguments for `upload`
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Display name without extension
    #[arg(short, long)]
    pub name: String,
    /// File extension; omit to create a folder
    #[arg(short, long)]
    pub extension: Option<String>,
    /// Storage path segment (defaults to a fresh ID)
    #[arg(short, long)]
    pub segment: Option<String>,
    /// Parent node ID (omit for root)
    #[arg(short, long)]
    pub parent: Option<NodeId>,
    /// Owning module tag
    #[arg(short, long)]
    pub module: Option<String>,
    /// Local file to upload (required for files)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Acting user
    #[arg(long, default_value = "cli")]
    pub actor: String,
}

pub async fn delete(args: &DeleteArgs, ws: &Workspace, format: OutputFormat) -> Result<(), AppError> {
    let paths = ws.service.cascade_delete(&args.ids).await?;
    match format {
        OutputFormat::Json => output::print_json(&paths),
        OutputFormat::Table if paths.is_empty() => output::print_warning("Nothing to delete"),
        OutputFormat::Table => {
            for path in &paths {
                output::print_success(&format!("Deleted {path}"));
            }
        }
    }
    Ok(())
}

pub async fn relocate(args: &MoveArgs, ws: &Workspace, format: OutputFormat) -> Result<(), AppError> {
    let parent = if args.root {
        Some(None)
    } else {
        args.parent.clone().map(Some)
    };
    let ctx = RequestContext::new(&args.actor);
    let moved = ws
        .service
        .move_node(&ctx, &args.id, parent, args.segment.clone())
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&moved),
        OutputFormat::Table => {
            output::print_success(&format!("Moved {}", moved.id));
            output::print_kv("From", &moved.from);
            output::print_kv("To", &moved.to);
        }
    }
    Ok(())
}

pub async fn upload(args: &UploadArgs, ws: &Workspace, format: OutputFormat) -> Result<(), AppError> {
    let id = NodeId::new();
    let kind = match &args.extension {
        Some(ext) => NodeKind::File(ext.trim_start_matches('.').to_string()),
        None => NodeKind::Folder,
    };
    let content: Option<ByteStream> = match &args.file {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::NotFound,
                    format!("Cannot read {}", path.display()),
                    e,
                )
            })?;
            let stream: ByteStream = Box::pin(ReaderStream::new(file));
            Some(stream)
        }
        None => None,
    };

    let req = CreateAttachment {
        path_segment: args.segment.clone().unwrap_or_else(|| id.to_string()),
        id: Some(id),
        name: args.name.clone(),
        kind,
        size: None,
        parent_id: args.parent.clone(),
        module_id: args.module.clone(),
        creator: args.actor.clone(),
    };
    let node = ws.service.upload(req, content).await?;

    match format {
        OutputFormat::Json => output::print_json(&node),
        OutputFormat::Table => {
            output::print_success(&format!("Added {}", node.file_name()));
            output::print_kv("ID", node.id.as_str());
            output::print_kv("Size", &node.size.to_string());
        }
    }
    Ok(())
}
