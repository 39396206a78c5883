//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::{Result, bail};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use super::args::{CheckArgs, InitArgs, ListArgs, OverviewArgs, RemoveArgs, ShowArgs, UpdateArgs};
use crate::domain::{ItemId, ItemRef, ItemType};
use crate::error::Error;
use crate::index::{
    BlockedItem, BuildInfo, CacheMetrics, Catalog, DanglingLink, IndexStore, LoadSource,
    TypeCounts, UpdateOutcome, blocked_items, dangling_links, dependency_cycles,
};
use crate::output::{self, OutputConfig, OutputMode};

/// Execute the init command
pub async fn execute_init(root: &Path, args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    if !args.quiet {
        println!("Initializing cairn catalog in {}...", root.display());
    }

    let result = init::init(root).await?;

    if !args.quiet {
        println!("Initialized cairn in {}", result.cairn_dir.display());
        println!("  Config: {}", result.config_file.display());
        for dir in &result.record_dirs {
            println!("  Records: {}", dir.display());
        }
    }

    Ok(())
}

/// Execute the rebuild command
pub async fn execute_rebuild(store: &mut IndexStore, output_mode: OutputMode) -> Result<()> {
    let index = store.rebuild_index().await?;
    let config = OutputConfig::from_env();

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "items": index.len(),
            "stats": index.stats,
            "warnings": store.last_warnings().iter().map(|w| serde_json::json!({
                "kind": w.kind(),
                "path": w.path().display().to_string(),
                "error": w.description(),
            })).collect::<Vec<_>>(),
        }))?,
        OutputMode::Text => {
            let duration = index.stats.last_build.as_ref().map_or(0, |b| b.duration_ms);
            println!(
                "{}",
                output::success(
                    &format!("Indexed {} item(s) in {duration} ms", index.len()),
                    &config
                )
            );
            for warning in store.last_warnings() {
                println!("  {} {warning}", output::warning("skipped", &config));
            }
        }
    }

    Ok(())
}

/// Summary printed by the `status` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    root: PathBuf,
    index_file: PathBuf,
    source: LoadSource,
    counts: TypeCounts,
    total_items: usize,
    total_size: u64,
    last_build: Option<BuildInfo>,
    cache: CacheMetrics,
}

/// Execute the status command
pub async fn execute_status(store: &mut IndexStore, output_mode: OutputMode) -> Result<()> {
    let loaded = store.load().await?;
    let stats = &loaded.index.stats;
    let report = StatusReport {
        root: store.root().to_path_buf(),
        index_file: store.index_path(),
        source: loaded.source,
        counts: stats.counts.clone(),
        total_items: stats.total_items,
        total_size: stats.total_size,
        last_build: stats.last_build.clone(),
        cache: store.metrics(),
    };

    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => {
            println!("Cairn Catalog Status");
            println!("====================");
            println!();
            println!("Root:        {}", report.root.display());
            println!("Index:       {}", report.index_file.display());
            println!("Loaded from: {:?}", report.source);
            println!();
            println!(
                "Items: {} total ({} projects, {} epics, {} issues, {} tasks, {} prs)",
                report.total_items,
                report.counts.projects,
                report.counts.epics,
                report.counts.issues,
                report.counts.tasks,
                report.counts.prs
            );
            println!("Size:  {} bytes", report.total_size);
            if let Some(build) = &report.last_build {
                println!(
                    "Last build: {:?} at {} ({} ms)",
                    build.kind,
                    build.at.format("%Y-%m-%d %H:%M:%S UTC"),
                    build.duration_ms
                );
            }
        }
    }

    Ok(())
}

/// Execute the list command
pub async fn execute_list(
    store: &mut IndexStore,
    args: &ListArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let item_type = ItemType::from(args.item_type);
    let mut entries = store.by_type(item_type).await?;
    if let Some(status) = args.status {
        let status = status.into();
        entries.retain(|entry| entry.status == status);
    }

    match output_mode {
        OutputMode::Json => output::print_json(&entries)?,
        OutputMode::Text => {
            let rows: Vec<_> = entries.into_iter().map(|e| (item_type, e)).collect();
            let stdout = io::stdout();
            output::write_entries(&mut stdout.lock(), &rows, &OutputConfig::from_env())?;
        }
    }

    Ok(())
}

/// Execute the show command
pub async fn execute_show(
    store: &mut IndexStore,
    args: &ShowArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let id = ItemId::new(&args.id);
    let (item_type, entry) = store
        .by_id(&id, args.item_type.map(Into::into))
        .await?
        .ok_or_else(|| Error::ItemNotFound(id.clone()))?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "type": item_type,
            "entry": entry,
        }))?,
        OutputMode::Text => {
            let stdout = io::stdout();
            output::write_entry_details(
                &mut stdout.lock(),
                item_type,
                &entry,
                &OutputConfig::from_env(),
            )?;
        }
    }

    Ok(())
}

/// Execute the update command
pub async fn execute_update(
    store: &mut IndexStore,
    args: &UpdateArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let item = ItemRef::new(args.item_type.into(), args.id.as_str());
    let outcome = store.update_item(item.item_type, &item.id).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "item": item,
            "outcome": outcome,
        }))?,
        OutputMode::Text => {
            let message = match outcome {
                UpdateOutcome::Updated => format!("Updated {item}"),
                UpdateOutcome::Unchanged => format!("{item} is already up to date"),
                UpdateOutcome::Removed => format!("Removed {item}: record file no longer exists"),
            };
            output::print_message(&message)?;
        }
    }

    Ok(())
}

/// Execute the remove command
pub async fn execute_remove(
    store: &mut IndexStore,
    args: &RemoveArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let item = ItemRef::new(args.item_type.into(), args.id.as_str());
    let removed = store.remove_item(item.item_type, &item.id).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "item": item,
            "removed": removed,
        }))?,
        OutputMode::Text if removed => output::print_message(&format!("Removed {item}"))?,
        OutputMode::Text => output::print_message(&format!("{item} is not indexed"))?,
    }

    Ok(())
}

/// Execute the overview command
pub async fn execute_overview(
    store: &mut IndexStore,
    args: &OverviewArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let overview = store.overview().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&overview)?,
        OutputMode::Text => {
            let stdout = io::stdout();
            output::write_overview(
                &mut stdout.lock(),
                &overview,
                args.limit,
                &OutputConfig::from_env(),
            )?;
        }
    }

    Ok(())
}

/// Findings of the `check` command.
#[derive(Debug, Serialize)]
struct CheckReport {
    cycles: Vec<Vec<ItemRef>>,
    blocked: Vec<BlockedItem>,
    dangling: Vec<DanglingLink>,
}

impl CheckReport {
    fn has_problems(&self) -> bool {
        !self.cycles.is_empty() || !self.dangling.is_empty()
    }
}

/// Execute the check command
pub async fn execute_check(
    store: &mut IndexStore,
    args: &CheckArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let index = store.load().await?.index;
    let report = CheckReport {
        cycles: dependency_cycles(&index),
        blocked: blocked_items(&index),
        dangling: dangling_links(&index),
    };

    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => {
            let stdout = io::stdout();
            output::write_check_report(
                &mut stdout.lock(),
                &report.cycles,
                &report.blocked,
                &report.dangling,
                &OutputConfig::from_env(),
            )?;
        }
    }

    if args.strict && report.has_problems() {
        bail!(
            "check failed: {} cycle(s), {} dangling reference(s)",
            report.cycles.len(),
            report.dangling.len()
        );
    }

    Ok(())
}
