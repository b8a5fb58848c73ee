use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

use auth_gateway::config::AppConfig;
use auth_gateway::telemetry::{TraceMiddleware, ZipkinReporter};
use auth_gateway::{AppMetrics, LoginService, MetricsMiddleware, clients, config, router, telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load().context("failed to load configuration")?;

    telemetry::init(&config.observability);
    log_startup(&config);

    let metrics = AppMetrics::with_config(Some(&config));
    let reporter = ZipkinReporter::from_config(&config);
    let caller = clients::from_config(&config, reporter.clone());
    let login = LoginService::from_config(&config, caller).with_metrics(metrics.clone());

    let address = (config.server.host.clone(), config.server.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(MetricsMiddleware::new(metrics.clone()))
            .wrap(TraceMiddleware::new(reporter.clone()))
            // access log, forwarded to the tracing subscriber through its log bridge
            .wrap(Logger::default())
            .app_data(Data::new(login.clone()))
            .configure(router::route)
    })
    .workers(config.server.workers)
    .bind(&address)
    .with_context(|| format!("failed to bind {}:{}", address.0, address.1))?
    .run()
    .await?;

    ::tracing::info!("Server stopped");

    Ok(())
}

fn log_startup(config: &AppConfig) {
    ::tracing::info!(
        name = %config.app.name,
        version = %config.app.version,
        environment = %config.app.environment,
        host = %config.server.host,
        port = config.server.port,
        workers = config.server.workers,
        users_api = %config.users_api.address,
        allowed_credentials = config.auth.allowed_credentials.len(),
        circuit_breaker = config.resilience.circuit_breaker.enabled,
        "Starting auth gateway"
    );
}
