use crate::log_filter::filter_logs;
use crate::models::{Container, FilterSpec, LogEntry};
use crate::timestamp::{validate_timestamp, TimestampError};
use serde::{Deserialize, Serialize};

/// Tri-state of a group checkbox in the filter drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    All,
    Partial,
    None,
}

/// State behind the log viewer: the fetched snapshot plus the user's filters.
///
/// Nothing here persists; a reload starts from [`LogView::default`].
#[derive(Debug, Clone, Default)]
pub struct LogView {
    containers: Vec<Container>,
    logs: Vec<LogEntry>,
    filters: FilterSpec,
    search_text: String,
}

impl LogView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot and re-allows every known container.
    pub fn refresh(&mut self, containers: Vec<Container>, logs: Vec<LogEntry>) {
        self.filters.allowed_containers = containers.iter().map(|c| c.id.clone()).collect();
        self.containers = containers;
        self.logs = logs;
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_stdout(&mut self, enabled: bool) {
        self.filters.stdout = enabled;
    }

    pub fn set_stderr(&mut self, enabled: bool) {
        self.filters.stderr = enabled;
    }

    pub fn set_all_streams(&mut self, enabled: bool) {
        self.filters.stdout = enabled;
        self.filters.stderr = enabled;
    }

    pub fn stream_selection(&self) -> Selection {
        match (self.filters.stdout, self.filters.stderr) {
            (true, true) => Selection::All,
            (false, false) => Selection::None,
            _ => Selection::Partial,
        }
    }

    /// Allows or hides a single container. Ids outside the snapshot are ignored.
    pub fn toggle_container(&mut self, id: &str, allowed: bool) {
        if !self.containers.iter().any(|c| c.id == id) {
            return;
        }
        if allowed {
            self.filters.allowed_containers.insert(id.to_string());
        } else {
            self.filters.allowed_containers.remove(id);
        }
    }

    pub fn set_all_containers(&mut self, allowed: bool) {
        self.filters.allowed_containers = if allowed {
            self.containers.iter().map(|c| c.id.clone()).collect()
        } else {
            Default::default()
        };
    }

    pub fn container_selection(&self) -> Selection {
        let allowed = self.filters.allowed_containers.len();
        if allowed == 0 {
            Selection::None
        } else if allowed == self.containers.len() {
            Selection::All
        } else {
            Selection::Partial
        }
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// Sets the lower bound. Invalid input is reported and the previous
    /// bound stays in effect; an empty input clears the bound.
    pub fn set_from(&mut self, input: &str) -> Result<(), TimestampError> {
        Self::apply_bound(&mut self.filters.from, input)
    }

    /// Sets the upper bound with the same rules as [`LogView::set_from`].
    pub fn set_until(&mut self, input: &str) -> Result<(), TimestampError> {
        Self::apply_bound(&mut self.filters.until, input)
    }

    fn apply_bound(bound: &mut String, input: &str) -> Result<(), TimestampError> {
        if input.trim().is_empty() {
            bound.clear();
            return Ok(());
        }
        validate_timestamp(input)?;
        *bound = input.to_string();
        Ok(())
    }

    /// Entries currently passing every filter.
    pub fn visible(&self) -> Vec<LogEntry> {
        filter_logs(&self.logs, &self.filters, &self.search_text)
    }
}
