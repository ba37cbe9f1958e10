use crate::handlers;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/hello", web::get().to(handlers::hello))
        // Container endpoints
        .route("/api/containers", web::get().to(handlers::get_containers))
        .route(
            "/api/containers/{id}/logs",
            web::get().to(handlers::get_container_logs),
        )
        // Dashboard provisioning
        .route(
            "/api/dashboards/status",
            web::get().to(handlers::get_dashboard_status),
        );
}
