//! CLI value enums and domain type conversions.
//!
//! This module contains the value enums used for CLI argument parsing
//! and their conversions to domain types.

use clap::ValueEnum;

use crate::domain::{ItemType, Status};

/// Item type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTypeArg {
    /// Top-level project
    #[value(alias = "projects")]
    Project,
    /// Epic within a project
    #[value(alias = "epics")]
    Epic,
    /// Issue within an epic
    #[value(alias = "issues")]
    Issue,
    /// Task within an issue
    #[value(alias = "tasks")]
    Task,
    /// Pull request
    #[value(alias = "prs", alias = "pull-request")]
    Pr,
}

impl From<ItemTypeArg> for ItemType {
    fn from(arg: ItemTypeArg) -> Self {
        match arg {
            ItemTypeArg::Project => ItemType::Project,
            ItemTypeArg::Epic => ItemType::Epic,
            ItemTypeArg::Issue => ItemType::Issue,
            ItemTypeArg::Task => ItemType::Task,
            ItemTypeArg::Pr => ItemType::Pr,
        }
    }
}

impl std::fmt::Display for ItemTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        ItemType::from(*self).fmt(f)
    }
}

/// Item status for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    /// Not started
    #[value(alias = "open")]
    Todo,
    /// Being worked on
    #[value(name = "in-progress", alias = "in_progress")]
    InProgress,
    /// Waiting for review
    #[value(name = "in-review", alias = "review")]
    InReview,
    /// Cannot proceed
    Blocked,
    /// Finished
    #[value(alias = "closed")]
    Done,
    /// Abandoned
    Cancelled,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Todo => Status::Todo,
            StatusArg::InProgress => Status::InProgress,
            StatusArg::InReview => Status::InReview,
            StatusArg::Blocked => Status::Blocked,
            StatusArg::Done => Status::Done,
            StatusArg::Cancelled => Status::Cancelled,
        }
    }
}

impl std::fmt::Display for StatusArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Status::from(*self).fmt(f)
    }
}
