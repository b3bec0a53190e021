//! Read-only commands: path, tree, plan.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use attachhub_core::error::AppError;
use attachhub_core::types::NodeId;
use attachhub_entity::attachment::{NodeKind, SubtreeNode};

use super::Workspace;
use crate::output::{self, OutputFormat};

/// Arguments for `path`
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Node ID
    pub id: NodeId,
}

/// Arguments for `tree`
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Node ID whose descendants to show
    pub id: NodeId,
}

/// Arguments for `plan`
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Requested node IDs
    #[arg(required = true)]
    pub ids: Vec<NodeId>,
}

/// Archive plan display row
#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    /// Path inside the archive
    entry: String,
    /// Physical path
    physical_path: String,
    /// Node ID
    id: String,
    /// Common ancestor
    origin: String,
}

pub async fn path(args: &PathArgs, ws: &Workspace, format: OutputFormat) -> Result<(), AppError> {
    let path = ws.service.resolve_path(&args.id).await?;
    match format {
        OutputFormat::Table => println!("{path}"),
        OutputFormat::Json => output::print_json(&serde_json::json!({ "id": args.id, "path": path })),
    }
    Ok(())
}

pub async fn tree(args: &TreeArgs, ws: &Workspace, format: OutputFormat) -> Result<(), AppError> {
    let tree = ws.service.list_descendants(&args.id).await?;
    match format {
        OutputFormat::Json => output::print_json(&tree),
        OutputFormat::Table if tree.is_empty() => output::print_warning("No descendants"),
        OutputFormat::Table => {
            for node in &tree {
                print_subtree(node, 0);
            }
        }
    }
    Ok(())
}

fn print_subtree(node: &SubtreeNode, depth: usize) {
    let label = match &node.kind {
        NodeKind::File(ext) => format!("{}.{ext} ({} bytes)", node.name, node.size),
        NodeKind::Folder => format!("{}/", node.name),
    };
    println!("{}{label}  [{}]", "  ".repeat(depth), node.id);
    for child in &node.children {
        print_subtree(child, depth + 1);
    }
}

pub async fn plan(args: &PlanArgs, ws: &Workspace, format: OutputFormat) -> Result<(), AppError> {
    let plan = ws.service.plan_archive(&args.ids).await?;
    if format == OutputFormat::Json {
        output::print_json(&plan);
        return Ok(());
    }

    let rows: Vec<EntryRow> = plan
        .entries
        .iter()
        .map(|e| EntryRow {
            entry: e.entry_name(),
            physical_path: e.physical_path.clone(),
            id: e.terminus_id.to_string(),
            origin: e
                .origin_id
                .as_ref()
                .map_or_else(|| "-".to_string(), NodeId::to_string),
        })
        .collect();
    output::print_list(&rows, format);
    if let Some(name) = &plan.archive_name {
        output::print_kv("Archive name", name);
    }
    Ok(())
}
