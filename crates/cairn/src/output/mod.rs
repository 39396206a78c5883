//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.

pub mod color;

use crate::domain::{ItemRef, ItemType};
use crate::index::{BlockedItem, DanglingLink, IndexEntry, Overview};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};

use color::{bold, colorize_id, colorize_priority, colorize_status, dimmed};

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `CAIRN_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("CAIRN_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self { use_colors }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

/// Print a plain message line.
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

// ============================================================================
// Text Formatting
// ============================================================================

/// Write one line per entry: `ID  status  priority  title`.
pub fn write_entries<W: Write>(
    w: &mut W,
    entries: &[(ItemType, IndexEntry)],
    config: &OutputConfig,
) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(w, "{}", dimmed("No items found.", config));
    }

    let id_width = entries.iter().map(|(_, e)| e.id.as_str().len()).max().unwrap_or(0);
    for (item_type, entry) in entries {
        writeln!(
            w,
            "{}{}  {:<7} {:<11} {:<8} {}",
            colorize_id(entry.id.as_str(), config),
            " ".repeat(id_width - entry.id.as_str().len()),
            item_type.as_str(),
            colorize_status(entry.status, config),
            colorize_priority(entry.priority, config),
            entry.title
        )?;
    }
    writeln!(w)?;
    writeln!(w, "{} item(s)", entries.len())
}

/// Write every field of one entry.
pub fn write_entry_details<W: Write>(
    w: &mut W,
    item_type: ItemType,
    entry: &IndexEntry,
    config: &OutputConfig,
) -> io::Result<()> {
    let label = |name: &str| dimmed(&format!("{name:<12}"), config);

    writeln!(w, "{} {}", colorize_id(entry.id.as_str(), config), bold(&entry.title, config))?;
    writeln!(w, "{}{}", label("Type:"), item_type)?;
    writeln!(w, "{}{}", label("Status:"), colorize_status(entry.status, config))?;
    writeln!(w, "{}{}", label("Priority:"), colorize_priority(entry.priority, config))?;
    if let Some(assignee) = &entry.assignee {
        writeln!(w, "{}{}", label("Assignee:"), assignee)?;
    }
    if !entry.tags.is_empty() {
        writeln!(w, "{}{}", label("Tags:"), entry.tags.join(", "))?;
    }
    writeln!(w, "{}{}", label("File:"), entry.path.display())?;
    if let Some(created) = entry.created_at {
        writeln!(w, "{}{}", label("Created:"), created.format("%Y-%m-%d %H:%M UTC"))?;
    }
    writeln!(
        w,
        "{}{}",
        label("Updated:"),
        entry.activity_at().format("%Y-%m-%d %H:%M UTC")
    )?;

    for (parent_type, parent) in entry.parents.iter() {
        writeln!(w, "{}{}", label(&format!("{}:", capitalize(parent_type.as_str()))), parent)?;
    }

    let children: Vec<_> = entry.children.all().filter(|(_, ids)| !ids.is_empty()).collect();
    if !children.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("Children", config))?;
        for (name, ids) in children {
            let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
            writeln!(w, "  {}{}", label(&format!("{name}:")), ids.join(", "))?;
        }
    }

    if !entry.links.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("Links", config))?;
        for (relation, target) in entry.links.iter() {
            writeln!(w, "  {}{}", label(&format!("{relation}:")), target)?;
        }
    }

    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Write the catalog overview.
pub fn write_overview<W: Write>(
    w: &mut W,
    overview: &Overview,
    activity_limit: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{}", bold("Catalog Overview", config))?;
    writeln!(w)?;
    writeln!(w, "Items:       {}", overview.total_items)?;
    writeln!(w, "Completion:  {:.1}%", overview.completion_rate)?;
    writeln!(w)?;

    writeln!(w, "{}", bold("By type", config))?;
    for (item_type, summary) in &overview.by_type {
        writeln!(
            w,
            "  {:<10} {:>4} ({} done)",
            item_type.as_str(),
            summary.total,
            summary.completed
        )?;
    }

    writeln!(w)?;
    writeln!(w, "{}", bold("By status", config))?;
    for (status, count) in &overview.by_status {
        writeln!(w, "  {:<12} {:>4}", status.as_str(), count)?;
    }

    writeln!(w)?;
    writeln!(w, "{}", bold("By priority", config))?;
    for (priority, count) in &overview.by_priority {
        writeln!(w, "  {:<12} {:>4}", priority.as_str(), count)?;
    }

    writeln!(w)?;
    writeln!(w, "{}", bold("Recent activity", config))?;
    if overview.recent_activity.is_empty() {
        writeln!(w, "  {}", dimmed("Nothing in the last week.", config))?;
    }
    for activity in overview.recent_activity.iter().take(activity_limit) {
        writeln!(
            w,
            "  {}  {} {:<7} {}  {}",
            activity.at.format("%Y-%m-%d"),
            colorize_id(activity.id.as_str(), config),
            activity.item_type.as_str(),
            colorize_status(activity.status, config),
            activity.title
        )?;
    }

    Ok(())
}

/// Write the results of the consistency check.
pub fn write_check_report<W: Write>(
    w: &mut W,
    cycles: &[Vec<ItemRef>],
    blocked: &[BlockedItem],
    dangling: &[DanglingLink],
    config: &OutputConfig,
) -> io::Result<()> {
    let join = |items: &[ItemRef]| {
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    };

    writeln!(w, "{}", bold(&format!("Dependency cycles ({})", cycles.len()), config))?;
    for cycle in cycles {
        writeln!(w, "  {}", error(&join(cycle), config))?;
    }

    writeln!(w, "{}", bold(&format!("Blocked items ({})", blocked.len()), config))?;
    for item in blocked {
        let blockers: Vec<String> = item.blockers.iter().map(ToString::to_string).collect();
        writeln!(
            w,
            "  {} {}",
            item.item,
            warning(&format!("waits on {}", blockers.join(", ")), config)
        )?;
    }

    writeln!(w, "{}", bold(&format!("Dangling references ({})", dangling.len()), config))?;
    for link in dangling {
        writeln!(w, "  {} {}: {}", link.from, link.relation, error(link.target.as_str(), config))?;
    }

    if cycles.is_empty() && blocked.is_empty() && dangling.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", success("No problems found.", config))?;
    }

    Ok(())
}
