use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Lifecycle state reported by the container engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    #[serde(other)]
    Unknown,
}

impl FromStr for ContainerState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Snapshot of one container as returned by a single inventory pass.
///
/// Serialized with the engine's field names (`Id`, `Names`, ...) since that
/// is what the log viewer consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub state: ContainerState,
}

impl Container {
    /// First name with the engine's leading slash removed, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.strip_prefix('/').unwrap_or(n.as_str()))
            .filter(|n| !n.is_empty())
            .unwrap_or(self.id.as_str())
    }
}

/// Output stream a log line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Engine timestamp as emitted, e.g. `2023-06-21T13:43:55.123456789Z`.
    #[serde(rename = "time")]
    pub timestamp: String,
    pub container_id: String,
    pub container_name: String,
    pub stream: StreamKind,
    #[serde(rename = "log")]
    pub message: String,
}

/// Predicate state controlling which log entries are displayed.
///
/// `from` and `until` hold the raw bound text; an empty or unparsable bound
/// disables that side of the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub stdout: bool,
    pub stderr: bool,
    pub allowed_containers: HashSet<String>,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub until: String,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            stdout: true,
            stderr: true,
            allowed_containers: HashSet::new(),
            from: String::new(),
            until: String::new(),
        }
    }
}

impl FilterSpec {
    /// Default stream flags with every given container allowed.
    pub fn allowing<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            allowed_containers: ids.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn stream_enabled(&self, stream: StreamKind) -> bool {
        match stream {
            StreamKind::Stdout => self.stdout,
            StreamKind::Stderr => self.stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(names: &[&str]) -> Container {
        Container {
            id: "abc123".to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            image: "nginx:latest".to_string(),
            state: ContainerState::Running,
        }
    }

    #[test]
    fn test_display_name_strips_leading_slash() {
        assert_eq!(container(&["/web-1", "/alias"]).display_name(), "web-1");
        assert_eq!(container(&["db"]).display_name(), "db");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        assert_eq!(container(&[]).display_name(), "abc123");
        assert_eq!(container(&["/"]).display_name(), "abc123");
    }

    #[test]
    fn test_container_wire_format() {
        let json = serde_json::to_value(container(&["/web-1"])).unwrap();
        assert_eq!(json["Id"], "abc123");
        assert_eq!(json["Names"][0], "/web-1");
        assert_eq!(json["State"], "running");
    }

    #[test]
    fn test_unknown_state_parses() {
        assert_eq!("RUNNING".parse::<ContainerState>().unwrap(), ContainerState::Running);
        assert_eq!("".parse::<ContainerState>().unwrap(), ContainerState::Unknown);
        let state: ContainerState = serde_json::from_str("\"hibernating\"").unwrap();
        assert_eq!(state, ContainerState::Unknown);
    }

    #[test]
    fn test_log_entry_wire_format() {
        let entry = LogEntry {
            timestamp: "2023-06-21T13:43:55.123Z".to_string(),
            container_id: "abc".to_string(),
            container_name: "web".to_string(),
            stream: StreamKind::Stderr,
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["time"], "2023-06-21T13:43:55.123Z");
        assert_eq!(json["containerId"], "abc");
        assert_eq!(json["containerName"], "web");
        assert_eq!(json["stream"], "stderr");
        assert_eq!(json["log"], "boom");
    }
}
