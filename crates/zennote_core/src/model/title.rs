//! Display title normalization.
//!
//! Titles double as store keys, so inline editing artifacts (trailing
//! newlines from an inline editor, doubled spaces) are folded away before
//! a title reaches the tree. Case is preserved.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Returns the normalized title, or `None` when nothing but whitespace remains.
pub fn normalize_title(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.into_owned())
}

#[cfg(test)]
mod tests {
    use super::normalize_title;

    #[test]
    fn collapses_inner_whitespace_and_line_breaks() {
        assert_eq!(
            normalize_title("  Shopping \n list\t2 ").as_deref(),
            Some("Shopping list 2")
        );
    }

    #[test]
    fn keeps_case() {
        assert_eq!(normalize_title("ToDo").as_deref(), Some("ToDo"));
    }

    #[test]
    fn blank_is_rejected() {
        assert_eq!(normalize_title(" \n\t "), None);
        assert_eq!(normalize_title(""), None);
    }
}
