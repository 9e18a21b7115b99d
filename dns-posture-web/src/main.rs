//! HTTP server entry point for DNS posture checks.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use dns_posture_core::{CheckService, ServiceContext};
use dns_posture_web::{AppConfig, configure, logging};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::locate(std::env::args()) {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    let _log_guard = logging::init(&config.log).context("failed to initialize logging")?;

    tracing::info!("Starting DNS posture server");
    tracing::info!(
        "Enabled checks: {}",
        config
            .checks
            .enabled_checks()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    if config.checks.zone_transfer.enabled {
        tracing::warn!(
            "Zone transfer probing enabled via '{}'",
            config.checks.zone_transfer.program
        );
    }

    let ctx = ServiceContext::from_config(&config.checks)
        .await
        .context("failed to create service context")?;
    let service = CheckService::new(Arc::new(ctx), &config.checks)
        .context("invalid check configuration")?;
    let service = web::Data::new(service);

    let workers = config.server.workers.unwrap_or_else(num_cpus::get).max(1);
    let addr = (config.server.host.clone(), config.server.port);
    tracing::info!("Listening on {}:{} with {workers} workers", addr.0, addr.1);

    HttpServer::new(move || App::new().app_data(service.clone()).configure(configure))
        .workers(workers)
        .bind(addr)
        .context("failed to bind server address")?
        .run()
        .await
        .context("server terminated with an error")?;

    tracing::info!("Server stopped");
    Ok(())
}
