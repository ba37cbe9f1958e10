//! Client-side log filtering.
//!
//! An entry is shown when its stream is enabled, its container is in the
//! allowed set, its message contains the search text (case-insensitive) and
//! its timestamp is not outside `[from, until]`.
//!
//! Range checks follow NaN comparison rules: a bound or entry time that does
//! not parse never compares as out of range. An invalid `from` therefore
//! disables the lower bound instead of hiding everything, and an entry with
//! an unreadable timestamp is never dropped by the range check.

use crate::models::{FilterSpec, LogEntry};
use crate::timestamp::{parse_timestamp, truncate_to_millis};
use chrono::NaiveDateTime;

/// Filter state prepared once per pass so bounds and search text are not
/// re-parsed for every entry.
struct Predicate<'a> {
    filters: &'a FilterSpec,
    search: String,
    from: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
}

impl<'a> Predicate<'a> {
    fn new(filters: &'a FilterSpec, search_text: &str) -> Self {
        Self {
            filters,
            search: search_text.to_uppercase(),
            from: parse_timestamp(&filters.from),
            until: parse_timestamp(&filters.until),
        }
    }

    fn matches(&self, entry: &LogEntry) -> bool {
        if !self.filters.stream_enabled(entry.stream) {
            return false;
        }
        if !self.filters.allowed_containers.contains(&entry.container_id) {
            return false;
        }
        if !self.search.is_empty() && !entry.message.to_uppercase().contains(&self.search) {
            return false;
        }
        self.in_range(parse_timestamp(truncate_to_millis(&entry.timestamp)))
    }

    fn in_range(&self, time: Option<NaiveDateTime>) -> bool {
        let Some(time) = time else {
            return true;
        };
        let after_until = self.until.is_some_and(|until| time > until);
        let before_from = self.from.is_some_and(|from| time < from);
        !(after_until || before_from)
    }
}

/// Returns the entries of `logs` that pass `filters` and `search_text`, in
/// their original order.
pub fn filter_logs(logs: &[LogEntry], filters: &FilterSpec, search_text: &str) -> Vec<LogEntry> {
    let predicate = Predicate::new(filters, search_text);
    logs.iter()
        .filter(|entry| predicate.matches(entry))
        .cloned()
        .collect()
}

/// Single-entry form of [`filter_logs`].
pub fn entry_matches(entry: &LogEntry, filters: &FilterSpec, search_text: &str) -> bool {
    Predicate::new(filters, search_text).matches(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreamKind;

    fn entry(container_id: &str, stream: StreamKind, time: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: time.to_string(),
            container_id: container_id.to_string(),
            container_name: format!("{container_id}-name"),
            stream,
            message: message.to_string(),
        }
    }

    fn sample_logs() -> Vec<LogEntry> {
        vec![
            entry("a", StreamKind::Stdout, "2023-06-21T13:43:55.100000000Z", "server started"),
            entry("b", StreamKind::Stderr, "2023-06-21T13:44:00.000000000Z", "Connection REFUSED"),
            entry("a", StreamKind::Stderr, "2023-12-31T23:59:59.999999999Z", "disk almost full"),
            entry("b", StreamKind::Stdout, "2024-01-01T00:00:00.500000000Z", "new year"),
        ]
    }

    fn permissive() -> FilterSpec {
        FilterSpec::allowing(["a", "b"])
    }

    #[test]
    fn test_permissive_filter_keeps_everything_in_order() {
        let logs = sample_logs();
        assert_eq!(filter_logs(&logs, &permissive(), ""), logs);
    }

    #[test]
    fn test_stream_clause() {
        let logs = sample_logs();

        let mut filters = permissive();
        filters.stdout = false;
        let result = filter_logs(&logs, &filters, "");
        assert!(result.iter().all(|e| e.stream == StreamKind::Stderr));
        assert_eq!(result.len(), 2);

        filters.stdout = true;
        filters.stderr = false;
        let result = filter_logs(&logs, &filters, "");
        assert!(result.iter().all(|e| e.stream == StreamKind::Stdout));
        assert_eq!(result.len(), 2);

        filters.stdout = false;
        assert!(filter_logs(&logs, &filters, "").is_empty());
    }

    #[test]
    fn test_container_clause() {
        let logs = sample_logs();
        let filters = FilterSpec::allowing(["a"]);
        let result = filter_logs(&logs, &filters, "");
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|e| e.container_id == "a"));

        let none = FilterSpec::default();
        assert!(filter_logs(&logs, &none, "").is_empty());
    }

    #[test]
    fn test_search_clause_is_case_insensitive() {
        let logs = sample_logs();
        let result = filter_logs(&logs, &permissive(), "refused");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].message, "Connection REFUSED");

        let result = filter_logs(&logs, &permissive(), "SERVER");
        assert_eq!(result.len(), 1);

        assert!(filter_logs(&logs, &permissive(), "no such text").is_empty());
    }

    #[test]
    fn test_time_range_clause_is_inclusive() {
        let logs = sample_logs();
        let mut filters = permissive();
        filters.from = "2023-06-21T13:44:00".to_string();
        filters.until = "2023-12-31T23:59:59.999".to_string();

        let result = filter_logs(&logs, &filters, "");
        let messages: Vec<&str> = result.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Connection REFUSED", "disk almost full"]);
    }

    #[test]
    fn test_invalid_from_disables_lower_bound_only() {
        let logs = sample_logs();
        let mut filters = permissive();
        filters.from = "not-a-date".to_string();
        filters.until = "2024-01-01T00:00:00".to_string();

        let result = filter_logs(&logs, &filters, "");
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|e| e.message != "new year"));
    }

    #[test]
    fn test_invalid_until_disables_upper_bound_only() {
        let logs = sample_logs();
        let mut filters = permissive();
        filters.from = "2023-12-01".to_string();
        filters.until = "tomorrow".to_string();

        let result = filter_logs(&logs, &filters, "");
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_unparsable_entry_time_passes_range_check() {
        let logs = vec![entry("a", StreamKind::Stdout, "garbled", "still shown")];
        let mut filters = permissive();
        filters.from = "2023-01-01".to_string();
        filters.until = "2023-01-02".to_string();
        assert_eq!(filter_logs(&logs, &filters, "").len(), 1);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let logs = sample_logs();
        let mut filters = FilterSpec::allowing(["a", "b"]);
        filters.stderr = false;
        filters.until = "2023-12-31".to_string();

        let once = filter_logs(&logs, &filters, "e");
        let twice = filter_logs(&once, &filters, "e");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_entry_matches_agrees_with_filter_logs() {
        let logs = sample_logs();
        let filters = FilterSpec::allowing(["b"]);
        let expected = filter_logs(&logs, &filters, "year");
        let matched: Vec<LogEntry> = logs
            .iter()
            .filter(|e| entry_matches(e, &filters, "year"))
            .cloned()
            .collect();
        assert_eq!(expected, matched);
    }
}
