use actix_web::web::Data;
use actix_web::{HttpResponse, get};

use crate::metrics::AppMetrics;

/// Metrics endpoint for Prometheus scraping
#[get("/metrics")]
pub async fn metrics(metrics: Data<AppMetrics>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics.render())
}
