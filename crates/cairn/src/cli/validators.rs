//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

/// Maximum accepted length of an item ID.
pub const MAX_ID_LENGTH: usize = 128;

/// Validate an item ID.
///
/// IDs name record files (`<dir>/<id>.md`), so they must be a single path
/// component: no separators, no leading dot, no whitespace.
pub fn validate_item_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Item ID cannot be empty".to_string());
    }

    if s.len() > MAX_ID_LENGTH {
        return Err(format!("Item ID cannot exceed {MAX_ID_LENGTH} characters"));
    }

    if s.starts_with('.') {
        return Err(format!("Invalid item ID '{s}': cannot start with '.'"));
    }

    if let Some(c) = s
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '/' | '\\' | ':'))
    {
        return Err(format!("Invalid item ID '{s}': contains '{c}'"));
    }

    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::prefixed("ISS-12")]
    #[case::plain("E1")]
    #[case::padded("  TASK-3  ")]
    fn accepts_valid_ids(#[case] id: &str) {
        assert_eq!(validate_item_id(id).unwrap(), id.trim());
    }

    #[rstest]
    #[case::empty("", "empty")]
    #[case::blank("   ", "empty")]
    #[case::traversal("../etc", "cannot start")]
    #[case::separator("a/b", "contains '/'")]
    #[case::space("ISS 1", "contains ' '")]
    fn rejects_invalid_ids(#[case] id: &str, #[case] expected: &str) {
        let err = validate_item_id(id).unwrap_err();
        assert!(err.contains(expected), "{err}");
    }

    #[test]
    fn rejects_overlong_ids() {
        assert!(validate_item_id(&"X".repeat(MAX_ID_LENGTH + 1)).is_err());
    }
}
