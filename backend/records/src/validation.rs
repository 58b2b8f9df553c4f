use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("space pattern"));

pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn validate_required(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Trims a tag name and collapses inner whitespace to single spaces.
pub fn normalize_tag_name(input: &str) -> String {
    SPACES.replace_all(input.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("rep@example.com"));
        assert!(validate_email("a.b+c@sub.example.co.jp"));
        assert!(!validate_email("rep@example"));
        assert!(!validate_email("rep example@example.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_required() {
        assert!(validate_required("x"));
        assert!(!validate_required("   "));
        assert!(!validate_required(""));
    }

    #[test]
    fn test_normalize_tag_name() {
        assert_eq!(normalize_tag_name("  Web   開発 "), "Web 開発");
        assert_eq!(normalize_tag_name("AI\t機械学習"), "AI 機械学習");
        assert_eq!(normalize_tag_name("   "), "");
    }
}
