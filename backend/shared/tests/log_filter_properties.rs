use dockboard_shared::{entry_matches, filter_logs, FilterSpec, LogEntry, StreamKind};
use proptest::prelude::*;
use std::collections::HashSet;

fn container_id() -> impl Strategy<Value = String> {
    prop_oneof![Just("a"), Just("b"), Just("c")].prop_map(String::from)
}

fn stream_kind() -> impl Strategy<Value = StreamKind> {
    prop_oneof![Just(StreamKind::Stdout), Just(StreamKind::Stderr)]
}

/// Engine timestamps, plus the empty and garbled values a broken line yields.
fn entry_time() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (1u32..=28, 0u32..24, 0u32..60, 0u32..60, 0u32..1_000_000_000).prop_map(
            |(day, hour, minute, second, nanos)| {
                format!("2023-06-{day:02}T{hour:02}:{minute:02}:{second:02}.{nanos:09}Z")
            }
        ),
        1 => Just(String::new()),
        1 => "[a-z:. -]{1,12}",
    ]
}

/// Range input as typed: empty, valid at various precisions, or junk.
fn bound() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        (1u32..=28, 0u32..24, 0u32..60)
            .prop_map(|(day, hour, minute)| format!("2023-06-{day:02}T{hour:02}:{minute:02}")),
        (1u32..=28).prop_map(|day| format!("2023-06-{day:02}")),
        "[a-z]{1,8}",
    ]
}

fn message() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,16}",
        "\\PC{0,16}",
        Just("Straße".to_string()),
        Just("STRASSE".to_string()),
    ]
}

fn search_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-zA-Z]{1,3}",
        Just("ß".to_string()),
        Just("ss".to_string()),
        "\\PC{1,2}",
    ]
}

fn log_entry() -> impl Strategy<Value = LogEntry> {
    (container_id(), stream_kind(), entry_time(), message()).prop_map(
        |(container_id, stream, timestamp, message)| LogEntry {
            timestamp,
            container_name: format!("{container_id}-name"),
            container_id,
            stream,
            message,
        },
    )
}

fn allowed_set() -> impl Strategy<Value = HashSet<String>> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(a, b, c)| {
        [("a", a), ("b", b), ("c", c)]
            .into_iter()
            .filter(|(_, allowed)| *allowed)
            .map(|(id, _)| id.to_string())
            .collect()
    })
}

fn filter_spec() -> impl Strategy<Value = FilterSpec> {
    (
        any::<bool>(),
        any::<bool>(),
        allowed_set(),
        bound(),
        bound(),
    )
        .prop_map(|(stdout, stderr, allowed_containers, from, until)| FilterSpec {
            stdout,
            stderr,
            allowed_containers,
            from,
            until,
        })
}

/// Filter that lets `entry` through on every clause.
fn permissive_for(entry: &LogEntry) -> FilterSpec {
    FilterSpec {
        allowed_containers: HashSet::from([entry.container_id.clone()]),
        ..FilterSpec::default()
    }
}

// Property: filtering an already filtered set changes nothing
proptest! {
    #[test]
    fn prop_filter_is_idempotent(logs in prop::collection::vec(log_entry(), 0..40),
                                 filters in filter_spec(),
                                 search in search_text()) {
        let once = filter_logs(&logs, &filters, &search);
        let twice = filter_logs(&once, &filters, &search);
        prop_assert_eq!(once, twice);
    }
}

// Property: output is the input with non-matching entries removed, order kept
proptest! {
    #[test]
    fn prop_filter_preserves_order(logs in prop::collection::vec(log_entry(), 0..40),
                                   filters in filter_spec(),
                                   search in search_text()) {
        let filtered = filter_logs(&logs, &filters, &search);

        let mut remaining = logs.iter();
        for kept in &filtered {
            prop_assert!(remaining.any(|entry| entry == kept));
        }

        let expected: Vec<LogEntry> = logs
            .iter()
            .filter(|entry| entry_matches(entry, &filters, &search))
            .cloned()
            .collect();
        prop_assert_eq!(filtered, expected);
    }
}

// Property: an entry passes exactly when each clause passes on its own
proptest! {
    #[test]
    fn prop_clauses_are_independent(entry in log_entry(),
                                    filters in filter_spec(),
                                    search in search_text()) {
        let open = permissive_for(&entry);

        let stream_only = FilterSpec {
            stdout: filters.stdout,
            stderr: filters.stderr,
            ..open.clone()
        };
        let container_only = FilterSpec {
            allowed_containers: filters.allowed_containers.clone(),
            ..open.clone()
        };
        let range_only = FilterSpec {
            from: filters.from.clone(),
            until: filters.until.clone(),
            ..open.clone()
        };

        let stream_ok = entry_matches(&entry, &stream_only, "");
        let container_ok = entry_matches(&entry, &container_only, "");
        let text_ok = entry_matches(&entry, &open, &search);
        let range_ok = entry_matches(&entry, &range_only, "");

        prop_assert_eq!(stream_ok, filters.stream_enabled(entry.stream));
        prop_assert_eq!(container_ok, filters.allowed_containers.contains(&entry.container_id));
        prop_assert_eq!(
            text_ok,
            entry.message.to_uppercase().contains(&search.to_uppercase())
        );
        prop_assert_eq!(
            entry_matches(&entry, &filters, &search),
            stream_ok && container_ok && text_ok && range_ok
        );
    }
}

// Property: entries whose time cannot be read are never dropped by the range
proptest! {
    #[test]
    fn prop_unreadable_time_passes_range(entry in log_entry(),
                                         garbage in "[a-z]{1,8}",
                                         from in bound(),
                                         until in bound()) {
        let entry = LogEntry { timestamp: garbage, ..entry };
        let filters = FilterSpec { from, until, ..permissive_for(&entry) };
        prop_assert!(entry_matches(&entry, &filters, ""));
    }
}
