use crate::dashboard_builder::{dashboard_uid, DashboardBuilder};
use crate::docker_service::ContainerRuntime;
use crate::error::{GrafanaError, ProvisionError};
use crate::grafana_models::Datasource;
use crate::grafana_service::{wait_until_ready, DashboardBackend, PublishOutcome, ReadinessPolicy};
use chrono::{DateTime, Utc};
use dockboard_shared::Container;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Publish result for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerProvisioning {
    pub container_id: String,
    pub container_name: String,
    pub dashboard_uid: String,
    #[serde(flatten)]
    pub outcome: PublishOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub datasource_uid: String,
    pub results: Vec<ContainerProvisioning>,
}

impl ProvisioningReport {
    pub fn published(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_published()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.published()
    }
}

/// Where the startup run currently stands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisioningStatus {
    Pending,
    Running,
    Completed { report: ProvisioningReport },
    Failed { stage: String, detail: String },
}

/// Discovers running containers and publishes one dashboard per container.
pub struct ProvisioningService {
    runtime: Arc<dyn ContainerRuntime>,
    grafana: Arc<dyn DashboardBackend>,
    builder: DashboardBuilder,
    readiness: ReadinessPolicy,
    status: RwLock<ProvisioningStatus>,
}

impl ProvisioningService {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        grafana: Arc<dyn DashboardBackend>,
        builder: DashboardBuilder,
        readiness: ReadinessPolicy,
    ) -> Self {
        Self {
            runtime,
            grafana,
            builder,
            readiness,
            status: RwLock::new(ProvisioningStatus::Pending),
        }
    }

    pub async fn status(&self) -> ProvisioningStatus {
        self.status.read().await.clone()
    }

    /// Startup run: inventory, wait for Grafana, look up the datasource, then
    /// publish dashboards one container at a time.
    ///
    /// A failure before publishing stops the run. Publish failures are
    /// recorded per container and never stop the batch.
    pub async fn run_startup(&self) -> Result<ProvisioningReport, ProvisionError> {
        *self.status.write().await = ProvisioningStatus::Running;

        let result = self.run_stages().await;
        *self.status.write().await = match &result {
            Ok(report) => ProvisioningStatus::Completed {
                report: report.clone(),
            },
            Err(e) => ProvisioningStatus::Failed {
                stage: e.stage().to_string(),
                detail: e.to_string(),
            },
        };
        result
    }

    async fn run_stages(&self) -> Result<ProvisioningReport, ProvisionError> {
        let started_at = Utc::now();

        let containers = self
            .runtime
            .list_running_containers()
            .await
            .map_err(ProvisionError::Inventory)?;
        log::info!(
            "Running containers: {:?}",
            containers.iter().map(Container::display_name).collect::<Vec<_>>()
        );

        wait_until_ready(self.grafana.as_ref(), &self.readiness)
            .await
            .map_err(ProvisionError::Readiness)?;

        let datasource = self
            .grafana
            .datasource()
            .await
            .map_err(ProvisionError::Datasource)?;

        let results = self.provision_all(&containers, &datasource).await;
        let report = ProvisioningReport {
            started_at,
            finished_at: Utc::now(),
            datasource_uid: datasource.uid,
            results,
        };
        log::info!(
            "Provisioning finished: {} published, {} failed",
            report.published(),
            report.failed()
        );
        Ok(report)
    }

    /// Publishes a dashboard per container, sequentially, awaiting each
    /// publish before starting the next.
    pub async fn provision_all(
        &self,
        containers: &[Container],
        datasource: &Datasource,
    ) -> Vec<ContainerProvisioning> {
        let mut results = Vec::with_capacity(containers.len());
        for container in containers {
            results.push(self.publish_one(container, datasource).await);
        }
        results
    }

    async fn publish_one(&self, container: &Container, datasource: &Datasource) -> ContainerProvisioning {
        let name = container.display_name();
        let dashboard = self.builder.build_dashboard(&container.id, name, datasource);
        let outcome = PublishOutcome::from(self.grafana.publish(&dashboard).await);

        match &outcome {
            PublishOutcome::Published { uid, .. } => {
                log::info!("Published dashboard '{}' ({})", dashboard.title, uid)
            }
            PublishOutcome::TransportError { detail } => {
                log::error!("Could not reach Grafana for '{}': {}", dashboard.title, detail)
            }
            PublishOutcome::Rejected { status, detail } => {
                log::error!("Grafana rejected '{}' with {}: {}", dashboard.title, status, detail)
            }
        }

        ContainerProvisioning {
            container_id: container.id.clone(),
            container_name: name.to_string(),
            dashboard_uid: dashboard.uid,
            outcome,
        }
    }

    /// Provisions a single container with a fresh datasource lookup.
    pub async fn provision_container(
        &self,
        container: &Container,
    ) -> Result<ContainerProvisioning, ProvisionError> {
        let datasource = self
            .grafana
            .datasource()
            .await
            .map_err(ProvisionError::Datasource)?;
        Ok(self.publish_one(container, &datasource).await)
    }

    /// Deletes the dashboard belonging to `container_id`.
    pub async fn remove_container(&self, container_id: &str) -> Result<(), GrafanaError> {
        let uid = dashboard_uid(container_id);
        self.grafana.remove(&uid).await?;
        log::info!("Removed dashboard {}", uid);
        Ok(())
    }
}
