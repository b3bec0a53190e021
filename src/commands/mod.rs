//! CLI command definitions and dispatch.

pub mod inspect;
pub mod modify;
pub mod package;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use attachhub_core::config::AppConfig;
use attachhub_core::error::AppError;
use attachhub_database::MemoryAttachmentRepository;
use attachhub_service::AttachmentService;
use attachhub_storage::LocalStorageProvider;

use crate::manifest;
use crate::output::OutputFormat;

/// AttachHub: hierarchical attachment trees with zip export
#[derive(Debug, Parser)]
#[command(name = "attachhub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to load from `config/{env}.toml`
    #[arg(long, default_value = "development")]
    pub config_env: String,

    /// JSON manifest holding the attachment records
    #[arg(short, long, default_value = "attachments.json")]
    pub manifest: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print a node's full physical path
    Path(inspect::PathArgs),
    /// Print the subtree below a node
    Tree(inspect::TreeArgs),
    /// Show the archive plan for a set of nodes
    Plan(inspect::PlanArgs),
    /// Write a zip archive of a set of nodes
    Package(package::PackageArgs),
    /// Delete nodes with all their descendants
    Delete(modify::DeleteArgs),
    /// Move or rename a node
    Move(modify::MoveArgs),
    /// Add a file or folder below a parent
    Upload(modify::UploadArgs),
}

impl Commands {
    fn mutates(&self) -> bool {
        matches!(self, Self::Delete(_) | Self::Move(_) | Self::Upload(_))
    }
}

/// Everything a command runs against.
pub struct Workspace {
    /// Records loaded from the manifest.
    pub repo: Arc<MemoryAttachmentRepository>,
    /// Service over `repo` and the configured storage root.
    pub service: AttachmentService,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let workspace = open_workspace(&self.manifest, config).await?;

        match &self.command {
            Commands::Path(args) => inspect::path(args, &workspace, self.format).await?,
            Commands::Tree(args) => inspect::tree(args, &workspace, self.format).await?,
            Commands::Plan(args) => inspect::plan(args, &workspace, self.format).await?,
            Commands::Package(args) => package::execute(args, &workspace).await?,
            Commands::Delete(args) => modify::delete(args, &workspace, self.format).await?,
            Commands::Move(args) => modify::relocate(args, &workspace, self.format).await?,
            Commands::Upload(args) => modify::upload(args, &workspace, self.format).await?,
        }

        if self.command.mutates() {
            manifest::save(&self.manifest, &workspace.repo).await?;
        }
        Ok(())
    }
}

/// Helper: load the manifest and wire the service
async fn open_workspace(manifest_path: &Path, config: &AppConfig) -> Result<Workspace, AppError> {
    let repo = Arc::new(manifest::load(manifest_path).await?);
    let storage = Arc::new(LocalStorageProvider::new(&config.storage.root_path).await?);
    let service = AttachmentService::new(repo.clone(), storage, &config.archive);
    Ok(Workspace { repo, service })
}
