//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;

use super::types::{ItemTypeArg, StatusArg};
use super::validators::validate_item_id;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Item type to list
    #[arg(value_enum)]
    pub item_type: ItemTypeArg,

    /// Only show items with this status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Item ID (e.g., ISS-12)
    #[arg(value_parser = validate_item_id)]
    pub id: String,

    /// Only look in this item type
    #[arg(short = 't', long = "type", value_enum)]
    pub item_type: Option<ItemTypeArg>,
}

/// Arguments for the `update` command
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Type of the item whose record file changed
    #[arg(value_enum)]
    pub item_type: ItemTypeArg,

    /// Item ID
    #[arg(value_parser = validate_item_id)]
    pub id: String,
}

/// Arguments for the `remove` command
#[derive(Parser, Debug, Clone)]
pub struct RemoveArgs {
    /// Type of the item to drop from the index
    #[arg(value_enum)]
    pub item_type: ItemTypeArg,

    /// Item ID
    #[arg(value_parser = validate_item_id)]
    pub id: String,
}

/// Arguments for the `status` command
#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {}

/// Arguments for the `rebuild` command
#[derive(Parser, Debug, Clone)]
pub struct RebuildArgs {}

/// Arguments for the `overview` command
#[derive(Parser, Debug, Clone)]
pub struct OverviewArgs {
    /// Maximum number of recent-activity rows to print
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for the `check` command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Exit with an error if any problem is found
    #[arg(long)]
    pub strict: bool,
}
