//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Done:      green   (done status, successful rebuilds)
//!   - Active:    yellow  (in-progress, in-review, high priority)
//!   - Problem:   red     (blocked status, critical priority, check failures)
//!   - Reference: cyan    (item IDs)
//!   - Muted:     dimmed  (field labels, cancelled items)

use crate::domain::{Priority, Status};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply color to status text.
pub(crate) fn colorize_status(status: Status, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        Status::Todo => text.white().to_string(),
        Status::InProgress | Status::InReview => text.yellow().to_string(),
        Status::Blocked => text.red().to_string(),
        Status::Done => text.green().to_string(),
        Status::Cancelled => text.dimmed().to_string(),
    }
}

/// Apply color to priority text.
pub(crate) fn colorize_priority(priority: Priority, config: &OutputConfig) -> String {
    let text = priority.to_string();
    if !config.use_colors {
        return text;
    }
    match priority {
        Priority::Critical => text.red().bold().to_string(),
        Priority::High => text.yellow().to_string(),
        Priority::Medium | Priority::Low => text,
    }
}

/// Colorize an item ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Apply dimmed style to text (for field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use colored::control::set_override;
    use std::sync::{Mutex, MutexGuard};

    static GLOBAL_STATE_MUTEX: Mutex<()> = Mutex::new(());

    struct ColorGuard<'a> {
        _guard: MutexGuard<'a, ()>,
    }

    impl ColorGuard<'_> {
        fn new() -> Self {
            let guard = GLOBAL_STATE_MUTEX
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            set_override(true);
            Self { _guard: guard }
        }
    }

    impl Drop for ColorGuard<'_> {
        fn drop(&mut self) {
            colored::control::unset_override();
        }
    }

    #[test]
    fn statuses_get_ansi_codes_when_enabled() {
        let _guard = ColorGuard::new();
        let config = OutputConfig::new(true);

        for status in [Status::Todo, Status::InProgress, Status::Blocked, Status::Done] {
            let text = colorize_status(status, &config);
            assert!(text.contains(status.as_str()));
            assert!(text.contains("\x1b["), "{status} should be colored");
        }
    }

    #[test]
    fn plain_text_when_colors_disabled() {
        let config = OutputConfig::new(false);
        assert_eq!(colorize_status(Status::Blocked, &config), "blocked");
        assert_eq!(colorize_priority(Priority::Critical, &config), "critical");
        assert_eq!(colorize_id("ISS-1", &config), "ISS-1");
        assert_eq!(bold("x", &config), "x");
    }
}
