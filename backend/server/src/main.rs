mod config;
mod handlers;
mod routes;
mod socket;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use config::Config;
use dockboard_services::{
    ContainerRuntime, DashboardBuilder, DashboardSyncHandler, DockerService, EventWatcher,
    GrafanaService, LoggingEventHandler, PanelDefaults, ProvisioningService,
};
use handlers::AppState;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    log::info!("Starting dashboard backend on {}", config.backend_socket);

    let runtime: Arc<dyn ContainerRuntime> = Arc::new(
        DockerService::connect(config.docker_host.as_deref(), &config.docker_socket).await?,
    );

    let grafana = Arc::new(
        GrafanaService::new(
            &config.grafana_url,
            &config.grafana_datasource,
            config.grafana_timeout,
        )
        .context("Failed to build the Grafana client")?,
    );

    let provisioning = Arc::new(ProvisioningService::new(
        runtime.clone(),
        grafana,
        DashboardBuilder::new(PanelDefaults::default()),
        config.readiness,
    ));

    let startup = {
        let provisioning = provisioning.clone();
        tokio::spawn(async move {
            if let Err(e) = provisioning.run_startup().await {
                log::error!("Dashboard provisioning stopped at {}: {}", e.stage(), e);
            }
        })
    };

    let watcher = {
        let events = runtime.container_events();
        if config.live_dashboard_sync {
            log::info!("Live dashboard sync enabled");
            let watcher = EventWatcher::new(DashboardSyncHandler::new(provisioning.clone()));
            tokio::spawn(async move {
                watcher.run(events).await;
            })
        } else {
            tokio::spawn(async move {
                EventWatcher::new(LoggingEventHandler).run(events).await;
            })
        }
    };

    let app_state = web::Data::new(AppState {
        runtime,
        provisioning,
        log_tail: config.log_tail,
    });

    socket::remove_stale_socket(&config.backend_socket)
        .with_context(|| format!("Failed to remove stale socket {}", config.backend_socket))?;

    let result = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_method()
            .allow_any_origin()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind_uds(&config.backend_socket)
    .with_context(|| format!("Failed to bind {}", config.backend_socket))?
    .run()
    .await;

    startup.abort();
    watcher.abort();
    log::info!("Dashboard backend stopped");
    result.context("HTTP server failed")
}
