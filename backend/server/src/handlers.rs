use actix_web::{web, HttpResponse, Responder};
use dockboard_services::{ContainerRuntime, ProvisioningService};
use serde::Deserialize;
use std::sync::Arc;

pub struct AppState {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub provisioning: Arc<ProvisioningService>,
    pub log_tail: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub tail: Option<u64>,
}

pub async fn hello() -> impl Responder {
    HttpResponse::Ok().body("hello world from the server")
}

pub async fn get_containers(state: web::Data<AppState>) -> impl Responder {
    match state.runtime.list_containers().await {
        Ok(containers) => HttpResponse::Ok().json(containers),
        Err(e) => {
            log::error!("Failed to list containers: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to list containers: {}", e)
            }))
        }
    }
}

/// Buffered logs of one container. `?tail=N` overrides the configured tail.
pub async fn get_container_logs(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<LogsQuery>,
) -> impl Responder {
    let container_id = path.into_inner();

    let containers = match state.runtime.list_containers().await {
        Ok(containers) => containers,
        Err(e) => {
            log::error!("Failed to list containers: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to list containers: {}", e)
            }));
        }
    };

    let Some(container) = containers.iter().find(|c| c.id == container_id) else {
        return HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Container {} not found", container_id)
        }));
    };

    let tail = query.tail.or(state.log_tail);
    match state.runtime.container_logs(container, tail).await {
        Ok(logs) => HttpResponse::Ok().json(logs),
        Err(e) => {
            log::error!("Failed to get logs for {}: {}", container_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to get container logs: {}", e)
            }))
        }
    }
}

pub async fn get_dashboard_status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.provisioning.status().await)
}
