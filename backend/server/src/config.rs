use dockboard_services::ReadinessPolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_socket: String,
    pub docker_host: Option<String>,
    pub docker_socket: String,
    pub grafana_url: String,
    pub grafana_datasource: String,
    pub grafana_timeout: Duration,
    pub readiness: ReadinessPolicy,
    pub live_dashboard_sync: bool,
    pub log_tail: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            backend_socket: string("BACKEND_SOCKET", "/run/guest-services/backend.sock"),
            docker_host: lookup("DOCKER_HOST").filter(|h| !h.is_empty()),
            docker_socket: string("DOCKER_SOCKET", "/var/run/docker.sock"),
            grafana_url: string("GRAFANA_URL", "http://host.docker.internal:2999"),
            grafana_datasource: string("GRAFANA_DATASOURCE", "Prometheus"),
            grafana_timeout: Duration::from_secs(parsed(&lookup, "GRAFANA_TIMEOUT_SECS", 10)),
            readiness: ReadinessPolicy {
                max_attempts: parsed(&lookup, "READINESS_MAX_ATTEMPTS", 10),
                initial_backoff: Duration::from_millis(parsed(&lookup, "READINESS_INITIAL_BACKOFF_MS", 500)),
                max_backoff: Duration::from_millis(parsed(&lookup, "READINESS_MAX_BACKOFF_MS", 8000)),
            },
            live_dashboard_sync: parsed(&lookup, "LIVE_DASHBOARD_SYNC", false),
            log_tail: lookup("LOG_TAIL").and_then(|v| v.parse().ok()),
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid value '{}' for {}, using default {:?}", raw, key, default);
            default
        }),
        None => default,
    }
}
