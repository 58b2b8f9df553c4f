use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};

fn parse(date: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(date).ok()
}

/// Orders ISO 8601 dates newest first. Parsed dates sort before unparseable
/// ones, which fall back to plain string order.
pub fn newest_first(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}

#[cfg(test)]
mod tests {
    use super::newest_first;

    #[test]
    fn test_sorting() {
        let mut dates = vec![
            "2025-04-01T09:00:00Z",
            "someday",
            "2025-08-01T09:00:00+09:00",
            "2025-08-01T01:00:00Z",
            "2024-12-31T23:59:59Z",
        ];

        dates.sort_by(|a, b| newest_first(a, b));

        assert_eq!(
            dates,
            vec![
                "2025-08-01T01:00:00Z",
                "2025-08-01T09:00:00+09:00",
                "2025-04-01T09:00:00Z",
                "2024-12-31T23:59:59Z",
                "someday",
            ]
        );
    }
}
