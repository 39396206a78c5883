//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for cairn using clap's derive API.
//! Each command has its own argument struct with validation and helpful error messages.
//!
//! # Commands
//!
//! - `init`: Create `.cairn/` and the record directories
//! - `rebuild`: Rebuild the index from every record file
//! - `status`: Show index location, counts and last build
//! - `list`: List items of one type
//! - `show`: Show one item with its children and links
//! - `update`: Re-index one record after its file changed
//! - `remove`: Drop one item from the index
//! - `overview`: Catalog statistics and recent activity
//! - `check`: Report dependency cycles, blocked items and dangling references
//!
//! # Global Flags
//!
//! - `--root <dir>`: Catalog root (default: nearest ancestor containing `.cairn/`)
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! cairn list issue --status in-progress
//! cairn update task TASK-12
//! cairn show EPIC-3 --json
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{
    CheckArgs, InitArgs, ListArgs, OverviewArgs, RebuildArgs, RemoveArgs, ShowArgs, StatusArgs,
    UpdateArgs,
};
pub use types::{ItemTypeArg, StatusArg};
pub use validators::validate_item_id;

use crate::index::IndexStore;
use crate::output::OutputMode;

/// Cairn - a plain-text work item catalog
///
/// Projects, epics, issues, tasks and pull requests live as Markdown files
/// with YAML front matter. Cairn keeps a derived index in `.cairn/index.json`
/// for fast queries.
#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Catalog root directory
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new catalog
    ///
    /// Creates `.cairn/config.yaml` and one directory per item type.
    Init(InitArgs),

    /// Rebuild the index from the record files
    Rebuild(RebuildArgs),

    /// Show index status
    ///
    /// Displays the index location, per-type counts and the last build.
    Status(StatusArgs),

    /// List items of one type
    List(ListArgs),

    /// Show detailed information about an item
    Show(ShowArgs),

    /// Re-index one record after editing its file
    ///
    /// If the file no longer exists the item is removed from the index.
    Update(UpdateArgs),

    /// Remove an item from the index
    ///
    /// The record file is not touched.
    Remove(RemoveArgs),

    /// Show catalog statistics
    Overview(OverviewArgs),

    /// Check dependencies and references
    Check(CheckArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// The catalog root: `--root`, else the nearest ancestor of the current
    /// directory containing `.cairn/`, else the current directory.
    fn resolve_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        let cwd = std::env::current_dir()?;
        Ok(crate::commands::init::find_catalog_root(&cwd).unwrap_or(cwd))
    }

    async fn open_store(&self) -> Result<IndexStore> {
        let store = IndexStore::open(self.resolve_root()?).await?;
        tracing::debug!(root = %store.root().display(), "opened catalog");
        Ok(store)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        let output_mode = self.output_mode();

        match &self.command {
            Some(Commands::Init(args)) => {
                let root = match &self.root {
                    Some(root) => root.clone(),
                    None => std::env::current_dir()?,
                };
                execute::execute_init(&root, args).await
            }
            Some(Commands::Rebuild(_)) => {
                let mut store = self.open_store().await?;
                execute::execute_rebuild(&mut store, output_mode).await
            }
            Some(Commands::Status(_)) => {
                let mut store = self.open_store().await?;
                execute::execute_status(&mut store, output_mode).await
            }
            Some(Commands::List(args)) => {
                let mut store = self.open_store().await?;
                execute::execute_list(&mut store, args, output_mode).await
            }
            Some(Commands::Show(args)) => {
                let mut store = self.open_store().await?;
                execute::execute_show(&mut store, args, output_mode).await
            }
            Some(Commands::Update(args)) => {
                let mut store = self.open_store().await?;
                execute::execute_update(&mut store, args, output_mode).await
            }
            Some(Commands::Remove(args)) => {
                let mut store = self.open_store().await?;
                execute::execute_remove(&mut store, args, output_mode).await
            }
            Some(Commands::Overview(args)) => {
                let mut store = self.open_store().await?;
                execute::execute_overview(&mut store, args, output_mode).await
            }
            Some(Commands::Check(args)) => {
                let mut store = self.open_store().await?;
                execute::execute_check(&mut store, args, output_mode).await
            }
            None => {
                println!("Cairn work item catalog");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
