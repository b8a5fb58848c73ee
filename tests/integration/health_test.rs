//! Version, liveness, readiness and documentation endpoints

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{TestRequest, call_service, read_body};
use serde_json::Value;

use auth_gateway::LoginService;
use auth_gateway::clients::UsersClient;
use auth_gateway::testing::{Reply, StubCaller, setup};

fn stub() -> Arc<StubCaller> {
    Arc::new(StubCaller::always(Reply::status(404)))
}

#[actix_web::test]
async fn test_version_is_plain_text_banner() {
    let service = auth_gateway::service!(setup::login_service(stub()));

    let resp = call_service(&service, TestRequest::get().uri("/version").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));

    let body = read_body(resp).await;
    assert_eq!(body, "Auth API, written in Rust\n".as_bytes());
}

#[actix_web::test]
async fn test_health_always_ok() {
    let service = auth_gateway::service!(setup::login_service(stub()));

    let resp = call_service(&service, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
}

#[actix_web::test]
async fn test_ready_reports_closed_circuit() {
    let service = auth_gateway::service!(setup::login_service(stub()));

    let resp = call_service(&service, TestRequest::get().uri("/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["usersApi"], "Closed");
}

#[actix_web::test]
async fn test_ready_without_breaker() {
    let login_service = LoginService::new(
        UsersClient::new(setup::USERS_API_ADDRESS, stub()),
        None,
        setup::allow_set(),
        setup::token_issuer(),
    );
    let service = auth_gateway::service!(login_service);

    let resp = call_service(&service, TestRequest::get().uri("/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(body["usersApi"], "Disabled");
}

#[actix_web::test]
async fn test_openapi_document_is_served() {
    let service = auth_gateway::service!(setup::login_service(stub()));

    let resp = call_service(&service, TestRequest::get().uri("/api.json").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert!(body["paths"]["/login"]["post"].is_object());
}

#[actix_web::test]
async fn test_metrics_are_exposed() {
    let service = auth_gateway::service!(setup::login_service(stub()));

    let req = TestRequest::post()
        .uri("/login")
        .set_json(serde_json::json!({ "username": "ghost", "password": "x" }))
        .to_request();
    call_service(&service, req).await;

    let resp = call_service(&service, TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = read_body(resp).await;
    let body = std::str::from_utf8(&body).unwrap();
    assert!(body.contains("auth_login_attempts_total"));
}
