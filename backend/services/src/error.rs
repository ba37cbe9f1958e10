//! Error types for each stage of the provisioning pipeline.

use thiserror::Error;

/// Failures talking to the container engine.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Socket unreachable, connection reset, or an engine-side error status.
    #[error("docker transport error: {0}")]
    Transport(#[from] bollard::errors::Error),

    /// The engine answered with something we could not interpret.
    #[error("docker decode error: {0}")]
    Decode(String),
}

/// Failures talking to the Grafana HTTP API.
#[derive(Debug, Error)]
pub enum GrafanaError {
    #[error("grafana transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("grafana rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("grafana response could not be decoded: {0}")]
    Decode(String),

    #[error("grafana not ready after {attempts} attempts")]
    NotReady { attempts: u32 },
}

/// Stage at which a provisioning run stopped before publishing anything.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("container inventory failed: {0}")]
    Inventory(#[source] RuntimeError),

    #[error("grafana readiness check failed: {0}")]
    Readiness(#[source] GrafanaError),

    #[error("datasource lookup failed: {0}")]
    Datasource(#[source] GrafanaError),
}

impl ProvisionError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Inventory(_) => "inventory",
            Self::Readiness(_) => "readiness",
            Self::Datasource(_) => "datasource",
        }
    }
}
