use crate::error::GrafanaError;
use crate::grafana_models::{
    DashboardDefinition, Datasource, HealthResponse, PublishReceipt, SaveDashboardRequest,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// The metrics-visualization service as seen by the provisioning pipeline.
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    /// One readiness check.
    async fn health(&self) -> Result<(), GrafanaError>;

    async fn datasource(&self) -> Result<Datasource, GrafanaError>;

    async fn publish(&self, dashboard: &DashboardDefinition) -> Result<PublishReceipt, GrafanaError>;

    /// Removes a dashboard by uid. Removing an absent dashboard succeeds.
    async fn remove(&self, uid: &str) -> Result<(), GrafanaError>;
}

/// Typed result of publishing one dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published {
        uid: String,
        url: Option<String>,
        version: Option<u64>,
    },
    TransportError {
        detail: String,
    },
    Rejected {
        status: u16,
        detail: String,
    },
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

impl From<Result<PublishReceipt, GrafanaError>> for PublishOutcome {
    fn from(result: Result<PublishReceipt, GrafanaError>) -> Self {
        match result {
            Ok(receipt) => Self::Published {
                uid: receipt.uid,
                url: receipt.url,
                version: receipt.version,
            },
            Err(GrafanaError::Rejected { status, body }) => Self::Rejected { status, detail: body },
            Err(e) => Self::TransportError {
                detail: e.to_string(),
            },
        }
    }
}

/// Bounded exponential backoff for the readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl ReadinessPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Polls `backend.health()` until it succeeds or the policy runs out.
///
/// Dropping the returned future cancels the wait.
pub async fn wait_until_ready(
    backend: &dyn DashboardBackend,
    policy: &ReadinessPolicy,
) -> Result<(), GrafanaError> {
    for attempt in 1..=policy.max_attempts {
        match backend.health().await {
            Ok(()) => {
                log::info!("Grafana ready after {} attempt(s)", attempt);
                return Ok(());
            }
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                log::info!(
                    "Grafana not ready (attempt {}/{}): {}. Retrying in {:?}",
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                log::warn!("Grafana still not ready after {} attempts: {}", attempt, e);
            }
        }
    }

    Err(GrafanaError::NotReady {
        attempts: policy.max_attempts,
    })
}

/// HTTP client for Grafana's dashboard API.
pub struct GrafanaService {
    client: Client,
    base_url: String,
    datasource_name: String,
}

impl GrafanaService {
    pub fn new(base_url: &str, datasource_name: &str, timeout: Duration) -> Result<Self, GrafanaError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            datasource_name: datasource_name.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns a non-2xx response into [`GrafanaError::Rejected`].
async fn check_status(response: Response) -> Result<Response, GrafanaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GrafanaError::Rejected {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, GrafanaError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| GrafanaError::Decode(e.to_string()))
}

#[async_trait]
impl DashboardBackend for GrafanaService {
    async fn health(&self) -> Result<(), GrafanaError> {
        let response = self.client.get(self.url("/api/health")).send().await?;
        let health: HealthResponse = decode(check_status(response).await?).await?;

        match health.database.as_deref() {
            None | Some("ok") => {
                log::debug!("Grafana health ok (version {:?})", health.version);
                Ok(())
            }
            Some(other) => Err(GrafanaError::Decode(format!("database status is '{}'", other))),
        }
    }

    async fn datasource(&self) -> Result<Datasource, GrafanaError> {
        let path = format!("/api/datasources/name/{}", self.datasource_name);
        let response = self.client.get(self.url(&path)).send().await?;
        let datasource: Datasource = decode(check_status(response).await?).await?;
        log::info!("Using Grafana datasource '{}' ({})", datasource.name, datasource.uid);
        Ok(datasource)
    }

    async fn publish(&self, dashboard: &DashboardDefinition) -> Result<PublishReceipt, GrafanaError> {
        let body = SaveDashboardRequest {
            dashboard,
            overwrite: true,
            message: format!("Provisioned {}", dashboard.title),
        };
        let response = self
            .client
            .post(self.url("/api/dashboards/db"))
            .json(&body)
            .send()
            .await?;
        decode(check_status(response).await?).await
    }

    async fn remove(&self, uid: &str) -> Result<(), GrafanaError> {
        let path = format!("/api/dashboards/uid/{}", uid);
        let response = self.client.delete(self.url(&path)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            log::debug!("Dashboard {} already absent", uid);
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }
}
