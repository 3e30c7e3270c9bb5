//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use wsmig_migrate::ResourceKind;

use crate::config::CONFIG_FILE_NAME;

/// wsmig CLI - Workspace configuration migration
#[derive(Parser, Debug)]
#[command(name = "wsmig")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "wsmig CLI - Workspace configuration migration", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (.json or .toml)
    #[arg(short, long, global = true, env = "WSMIG_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Migrate resources from the source to the target workspace
    Migrate(MigrateArgs),

    /// Check connectivity and permissions on both workspaces
    Validate,

    /// Export a workspace to Terraform variable files
    Export(ExportArgs),

    /// List resource kinds in migration order
    Kinds,

    /// Display version information
    Version,
}

// =============================================================================
// Migrate Command
// =============================================================================

/// Arguments for the `migrate` command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Resource kinds to migrate (defaults to all, see `wsmig kinds`)
    #[arg(value_parser = parse_kind)]
    pub kinds: Vec<ResourceKind>,

    /// Skip the start confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Stop at the first failed resource kind instead of asking
    #[arg(long)]
    pub no_prompt: bool,
}

fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    s.parse()
}

// =============================================================================
// Export Command
// =============================================================================

/// Arguments for the `export` command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Workspace to export
    #[arg(short, long, default_value = "source")]
    pub workspace: WorkspaceRole,

    /// Output directory for the generated files
    #[arg(short, long, default_value = "./environments/source")]
    pub output: PathBuf,
}

/// Which configured workspace to use
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkspaceRole {
    #[default]
    Source,
    Target,
}

impl std::fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkspaceRole::Source => write!(f, "source"),
            WorkspaceRole::Target => write!(f, "target"),
        }
    }
}
