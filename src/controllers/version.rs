use actix_web::{HttpResponse, get};

pub const VERSION_BANNER: &str = "Auth API, written in Rust\n";

/// Implementation banner
#[utoipa::path(
    tag = "Meta",
    responses(
        (status = 200, description = "Implementation banner", body = String, content_type = "text/plain"),
    )
)]
#[get("/version")]
pub async fn version() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(VERSION_BANNER)
}
