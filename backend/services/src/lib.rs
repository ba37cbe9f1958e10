pub mod dashboard_builder;
pub mod docker_service;
pub mod error;
pub mod event_watcher;
pub mod grafana_models;
pub mod grafana_service;
pub mod log_framing;
pub mod provisioning_service;

pub use dashboard_builder::{DashboardBuilder, PanelDefaults};
pub use docker_service::{ContainerRuntime, DockerService};
pub use error::{GrafanaError, ProvisionError, RuntimeError};
pub use event_watcher::{
    ContainerEvent, DashboardSyncHandler, EventAction, EventHandler, EventWatcher,
    LoggingEventHandler,
};
pub use grafana_service::{DashboardBackend, GrafanaService, PublishOutcome, ReadinessPolicy};
pub use provisioning_service::{ProvisioningReport, ProvisioningService, ProvisioningStatus};
