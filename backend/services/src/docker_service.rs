use crate::error::RuntimeError;
use crate::event_watcher::ContainerEvent;
use crate::log_framing::LineFramer;
use anyhow::Context;
use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::models::ContainerSummary;
use bollard::query_parameters::{EventsOptions, ListContainersOptions, LogsOptions};
use bollard::Docker;
use dockboard_shared::{Container, ContainerState, LogEntry, StreamKind};
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;

/// Read access to the container engine.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Containers currently in the running state, from one completed listing.
    async fn list_running_containers(&self) -> Result<Vec<Container>, RuntimeError>;

    /// Every container regardless of state.
    async fn list_containers(&self) -> Result<Vec<Container>, RuntimeError>;

    /// Buffered log output of one container. `tail` limits the line count.
    async fn container_logs(
        &self,
        container: &Container,
        tail: Option<u64>,
    ) -> Result<Vec<LogEntry>, RuntimeError>;

    /// Long-lived stream of container start/destroy events.
    fn container_events(&self) -> BoxStream<'static, Result<ContainerEvent, RuntimeError>>;
}

pub struct DockerService {
    docker: Docker,
}

impl DockerService {
    /// Connects to the engine at `docker_host` (`unix://` or `tcp://`), or at
    /// `socket_path` when no host is configured, and checks it answers.
    pub async fn connect(docker_host: Option<&str>, socket_path: &str) -> anyhow::Result<Self> {
        let docker = match docker_host {
            Some(host) if host.starts_with("unix://") => {
                let path = host.strip_prefix("unix://").unwrap_or(host);
                log::info!("Connecting to Docker socket from DOCKER_HOST: {}", path);
                Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION)
                    .with_context(|| format!("Failed to connect to Docker socket: {}", path))?
            }
            Some(host) => {
                log::info!("Connecting to Docker host: {}", host);
                Docker::connect_with_http(host, 120, bollard::API_DEFAULT_VERSION)
                    .with_context(|| format!("Failed to connect to Docker host: {}", host))?
            }
            None => {
                log::info!("Connecting to Docker socket: {}", socket_path);
                Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                    .with_context(|| format!("Failed to connect to Docker socket: {}", socket_path))?
            }
        };

        docker
            .ping()
            .await
            .context("Docker daemon did not answer ping. Make sure Docker is running and accessible.")?;
        log::info!("Docker connection successful");

        Ok(Self { docker })
    }

    async fn list(&self, filters: Option<HashMap<String, Vec<String>>>) -> Result<Vec<Container>, RuntimeError> {
        let options = ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };

        let summaries = self.docker.list_containers(Some(options)).await.map_err(|e| {
            log::error!("Docker API error: {:?}", e);
            RuntimeError::from(e)
        })?;

        log::debug!("Docker API returned {} containers", summaries.len());
        Ok(summaries.into_iter().filter_map(container_from_summary).collect())
    }
}

#[async_trait]
impl ContainerRuntime for DockerService {
    async fn list_running_containers(&self) -> Result<Vec<Container>, RuntimeError> {
        let filters = HashMap::from([("status".to_string(), vec!["running".to_string()])]);
        let containers = self.list(Some(filters)).await?;
        log::info!("Found {} running containers", containers.len());
        Ok(containers)
    }

    async fn list_containers(&self) -> Result<Vec<Container>, RuntimeError> {
        self.list(None).await
    }

    async fn container_logs(
        &self,
        container: &Container,
        tail: Option<u64>,
    ) -> Result<Vec<LogEntry>, RuntimeError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            follow: false,
            timestamps: true,
            tail: tail.map_or_else(|| "all".to_string(), |t| t.to_string()),
            ..Default::default()
        };

        let mut stream = self.docker.logs(&container.id, Some(options));
        let mut stdout = LineFramer::new();
        let mut stderr = LineFramer::new();
        let mut entries = Vec::new();

        while let Some(chunk) = stream.next().await {
            let (lines, kind) = match chunk? {
                LogOutput::StdOut { message } | LogOutput::Console { message } => {
                    (stdout.push(&message), StreamKind::Stdout)
                }
                LogOutput::StdErr { message } => (stderr.push(&message), StreamKind::Stderr),
                LogOutput::StdIn { .. } => continue,
            };
            entries.extend(lines.iter().map(|line| log_entry_from_line(container, kind, line)));
        }

        if let Some(line) = stdout.finish() {
            entries.push(log_entry_from_line(container, StreamKind::Stdout, &line));
        }
        if let Some(line) = stderr.finish() {
            entries.push(log_entry_from_line(container, StreamKind::Stderr, &line));
        }

        log::debug!("Read {} log lines for container {}", entries.len(), container.display_name());
        Ok(entries)
    }

    fn container_events(&self) -> BoxStream<'static, Result<ContainerEvent, RuntimeError>> {
        let filters = HashMap::from([
            ("type".to_string(), vec!["container".to_string()]),
            ("event".to_string(), vec!["start".to_string(), "destroy".to_string()]),
        ]);
        let options = EventsOptions {
            filters: Some(filters),
            ..Default::default()
        };

        self.docker
            .events(Some(options))
            .map(|message| message.map_err(RuntimeError::from).and_then(ContainerEvent::try_from))
            .boxed()
    }
}

/// Converts an engine listing entry, skipping entries without an id.
pub fn container_from_summary(summary: ContainerSummary) -> Option<Container> {
    let id = summary.id.filter(|id| !id.is_empty());
    let Some(id) = id else {
        log::warn!("Skipping container with empty ID: names={:?}", summary.names);
        return None;
    };

    let state = summary
        .state
        .as_ref()
        .map(|s| s.to_string())
        .and_then(|s| s.parse().ok())
        .unwrap_or(ContainerState::Unknown);

    Some(Container {
        id,
        names: summary.names.unwrap_or_default(),
        image: summary.image.unwrap_or_default(),
        state,
    })
}

/// Splits a `timestamps=true` log line into its timestamp and message.
pub fn log_entry_from_line(container: &Container, stream: StreamKind, line: &str) -> LogEntry {
    let (timestamp, message) = match line.split_once(' ') {
        Some((ts, msg)) if ts.contains('T') => (ts, msg),
        _ => ("", line),
    };

    LogEntry {
        timestamp: timestamp.to_string(),
        container_id: container.id.clone(),
        container_name: container.display_name().to_string(),
        stream,
        message: message.to_string(),
    }
}
