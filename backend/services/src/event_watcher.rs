use crate::error::RuntimeError;
use crate::provisioning_service::ProvisioningService;
use async_trait::async_trait;
use bollard::models::EventMessage;
use dockboard_shared::{Container, ContainerState};
use futures::{Stream, StreamExt};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Start,
    Destroy,
    Other(String),
}

impl From<&str> for EventAction {
    fn from(action: &str) -> Self {
        match action {
            "start" => Self::Start,
            "destroy" => Self::Destroy,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A decoded container lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEvent {
    pub action: EventAction,
    pub container_id: String,
    pub container_name: Option<String>,
    pub image: Option<String>,
}

impl ContainerEvent {
    /// Container snapshot for a freshly started container.
    pub fn to_container(&self) -> Container {
        Container {
            id: self.container_id.clone(),
            names: self
                .container_name
                .iter()
                .map(|name| format!("/{}", name.trim_start_matches('/')))
                .collect(),
            image: self.image.clone().unwrap_or_default(),
            state: ContainerState::Running,
        }
    }
}

impl TryFrom<EventMessage> for ContainerEvent {
    type Error = RuntimeError;

    fn try_from(message: EventMessage) -> Result<Self, Self::Error> {
        let action = message
            .action
            .ok_or_else(|| RuntimeError::Decode("event without action".to_string()))?;
        let actor = message
            .actor
            .ok_or_else(|| RuntimeError::Decode(format!("'{}' event without actor", action)))?;
        let container_id = actor
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RuntimeError::Decode(format!("'{}' event without container id", action)))?;
        let mut attributes = actor.attributes.unwrap_or_default();

        Ok(Self {
            action: EventAction::from(action.as_str()),
            container_id,
            container_name: attributes.remove("name"),
            image: attributes.remove("image"),
        })
    }
}

/// Reaction to lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_start(&self, event: &ContainerEvent);
    async fn on_destroy(&self, event: &ContainerEvent);
}

/// Logs events and does nothing else.
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn on_start(&self, event: &ContainerEvent) {
        log::info!("STARTED CONTAINER: {}", event.container_id);
    }

    async fn on_destroy(&self, event: &ContainerEvent) {
        log::info!("DESTROYED CONTAINER: {}", event.container_id);
    }
}

/// Keeps dashboards in step with containers: provisions on start, removes
/// on destroy.
pub struct DashboardSyncHandler {
    provisioning: Arc<ProvisioningService>,
}

impl DashboardSyncHandler {
    pub fn new(provisioning: Arc<ProvisioningService>) -> Self {
        Self { provisioning }
    }
}

#[async_trait]
impl EventHandler for DashboardSyncHandler {
    async fn on_start(&self, event: &ContainerEvent) {
        LoggingEventHandler.on_start(event).await;
        let container = event.to_container();
        match self.provisioning.provision_container(&container).await {
            Ok(result) => log::info!(
                "Dashboard sync for {}: {:?}",
                result.container_name,
                result.outcome
            ),
            Err(e) => log::error!("Dashboard sync for {} failed: {}", event.container_id, e),
        }
    }

    async fn on_destroy(&self, event: &ContainerEvent) {
        LoggingEventHandler.on_destroy(event).await;
        if let Err(e) = self.provisioning.remove_container(&event.container_id).await {
            log::error!("Removing dashboard for {} failed: {}", event.container_id, e);
        }
    }
}

/// Drives an [`EventHandler`] from an event stream.
pub struct EventWatcher<H> {
    handler: H,
}

impl<H: EventHandler> EventWatcher<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// Dispatches events until the stream ends or fails. Undecodable events
    /// are skipped; transport errors end the watch. Returns the number of
    /// events dispatched.
    pub async fn run<S>(&self, events: S) -> usize
    where
        S: Stream<Item = Result<ContainerEvent, RuntimeError>> + Unpin,
    {
        log::info!("Watching container start/destroy events");
        let mut events = events;
        let mut dispatched = 0;

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(RuntimeError::Decode(detail)) => {
                    log::warn!("Skipping undecodable event: {}", detail);
                    continue;
                }
                Err(e) => {
                    log::error!("Event stream failed: {}", e);
                    return dispatched;
                }
            };

            log::debug!("Container event: {:?}", event);
            match &event.action {
                EventAction::Start => self.handler.on_start(&event).await,
                EventAction::Destroy => self.handler.on_destroy(&event).await,
                EventAction::Other(action) => {
                    log::debug!("Ignoring '{}' event for {}", action, event.container_id);
                    continue;
                }
            }
            dispatched += 1;
        }

        log::info!("Event stream ended");
        dispatched
    }
}
