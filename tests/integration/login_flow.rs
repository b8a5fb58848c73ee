//! End-to-end login scenarios through the actix app
//!
//! The users API is replaced with a [`StubCaller`], so every test controls
//! exactly what the dependency answers and can count the calls it received.

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test::{TestRequest, call_service, read_body};
use serde_json::{Value, json};

use auth_gateway::error::{
    DEPENDENCY_UNAVAILABLE_MESSAGE, GENERIC_MESSAGE, WRONG_CREDENTIALS_MESSAGE,
};
use auth_gateway::testing::{Reply, StubCaller, setup};

fn admin_record() -> Reply {
    Reply::user("admin", "Admin", "User", "admin")
}

fn login(username: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": username, "password": password }))
}

async fn body_json(resp: actix_web::dev::ServiceResponse) -> Value {
    let body = read_body(resp).await;
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// SUCCESS
// =============================================================================

#[actix_web::test]
async fn test_valid_credentials_return_access_token() {
    let stub = Arc::new(StubCaller::always(admin_record()));
    let login_service = setup::login_service(stub.clone());
    let issuer = login_service.issuer().clone();
    let service = auth_gateway::service!(login_service);

    let resp = call_service(&service, login("admin", "admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    let token = body["accessToken"].as_str().expect("accessToken should be a string");

    let claims = issuer.verify(token).unwrap();
    assert_eq!(claims.username, "admin");
    assert_eq!(claims.firstname, "Admin");
    assert_eq!(claims.lastname, "User");
    assert_eq!(claims.role, "admin");

    let lifetime = claims.exp - chrono::Utc::now().timestamp();
    assert!((72 * 3600 - 5..=72 * 3600).contains(&lifetime));

    let sent = stub.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "http://users-api:8083/users/admin");
    assert!(sent[0].header_value("Authorization").unwrap().starts_with("Bearer "));
}

#[actix_web::test]
async fn test_every_shipped_credential_logs_in() {
    let stub = Arc::new(StubCaller::sequence([
        Reply::user("johnd", "John", "Doe", "user"),
        Reply::user("janed", "Jane", "Doe", "user"),
    ]));
    let service = auth_gateway::service!(setup::login_service(stub));

    for (username, password) in [("johnd", "foo"), ("janed", "ddd")] {
        let resp = call_service(&service, login(username, password).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{} should log in", username);
    }
}

// =============================================================================
// CREDENTIALS
// =============================================================================

#[actix_web::test]
async fn test_wrong_password_is_unauthorized() {
    let stub = Arc::new(StubCaller::always(admin_record()));
    let service = auth_gateway::service!(setup::login_service(stub.clone()));

    let resp = call_service(&service, login("admin", "wrongpass").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(resp).await;
    assert_eq!(body["message"], WRONG_CREDENTIALS_MESSAGE);
    assert!(body.get("accessToken").is_none());
    assert_eq!(stub.calls(), 1);
}

#[actix_web::test]
async fn test_unknown_user_is_indistinguishable_from_wrong_password() {
    let stub = Arc::new(StubCaller::always(Reply::status(404)));
    let service = auth_gateway::service!(setup::login_service(stub));

    let resp = call_service(&service, login("ghost", "admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(resp).await;
    assert_eq!(body["message"], WRONG_CREDENTIALS_MESSAGE);
}

#[actix_web::test]
async fn test_credential_check_is_case_sensitive() {
    let stub = Arc::new(StubCaller::always(admin_record()));
    let service = auth_gateway::service!(setup::login_service(stub));

    let resp = call_service(&service, login("admin", "ADMIN").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// DEPENDENCY FAILURES
// =============================================================================

#[actix_web::test]
async fn test_failing_users_api_is_service_unavailable() {
    let stub = Arc::new(StubCaller::always(Reply::json(500, r#"{"error":"db down"}"#)));
    let service = auth_gateway::service!(setup::login_service(stub));

    let resp = call_service(&service, login("admin", "admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(resp).await;
    assert_eq!(body["message"], DEPENDENCY_UNAVAILABLE_MESSAGE);
    assert!(!body.to_string().contains("db down"));
}

#[actix_web::test]
async fn test_slow_users_api_is_service_unavailable() {
    let stub = Arc::new(StubCaller::always(Reply::Hang));
    let login_service =
        setup::login_service(stub).with_deadline(Duration::from_millis(50));
    let service = auth_gateway::service!(login_service);

    let resp = call_service(&service, login("admin", "admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_undecodable_record_is_internal_error() {
    let stub = Arc::new(StubCaller::always(Reply::json(200, "<html>oops</html>")));
    let service = auth_gateway::service!(setup::login_service(stub));

    let resp = call_service(&service, login("admin", "admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(resp).await;
    assert_eq!(body["message"], GENERIC_MESSAGE);
}

#[actix_web::test]
async fn test_repeated_timeouts_open_the_circuit() {
    let stub = Arc::new(StubCaller::always(Reply::Timeout));
    let service = auth_gateway::service!(setup::login_service(stub.clone()));

    for _ in 0..10 {
        let resp = call_service(&service, login("admin", "admin").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
    assert_eq!(stub.calls(), 10);

    // the 11th request is rejected without reaching the users API
    let resp = call_service(&service, login("admin", "admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(stub.calls(), 10);

    let resp = call_service(&service, TestRequest::get().uri("/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_unknown_users_do_not_open_the_circuit() {
    let stub = Arc::new(StubCaller::always(Reply::status(404)));
    let service = auth_gateway::service!(setup::login_service(stub.clone()));

    for _ in 0..15 {
        let resp = call_service(&service, login("ghost", "ghost").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(stub.calls(), 15);
}

// =============================================================================
// MALFORMED REQUESTS
// =============================================================================

#[actix_web::test]
async fn test_malformed_body_is_internal_error() {
    let stub = Arc::new(StubCaller::always(admin_record()));
    let service = auth_gateway::service!(setup::login_service(stub.clone()));

    let req = TestRequest::post()
        .uri("/login")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"username\": \"admin\", ")
        .to_request();
    let resp = call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["message"], GENERIC_MESSAGE);
    assert_eq!(stub.calls(), 0);
}

#[actix_web::test]
async fn test_missing_field_is_internal_error() {
    let stub = Arc::new(StubCaller::always(admin_record()));
    let service = auth_gateway::service!(setup::login_service(stub.clone()));

    let req = TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": "admin" }))
        .to_request();
    let resp = call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stub.calls(), 0);
}
