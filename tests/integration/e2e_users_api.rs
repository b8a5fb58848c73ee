//! The real awc transport against local HTTP servers playing the users API
//! and a Zipkin collector

use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::test::{TestRequest, call_service, init_service};
use actix_web::web::Data;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};

use auth_gateway::clients::{DependencyCaller, DependencyError, PlainCaller, TracedCaller, UsersClient};
use auth_gateway::telemetry::{TraceMiddleware, ZipkinReporter};
use auth_gateway::testing::setup;
use auth_gateway::{LoginService, router};

type Collected = Mutex<Vec<Value>>;

async fn user(req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    let authorized = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer "));
    if !authorized {
        return HttpResponse::Forbidden().finish();
    }

    match path.as_str() {
        "admin" => HttpResponse::Ok().json(json!({
            "username": "admin",
            "firstname": "Admin",
            "lastname": "User",
            "role": "admin",
        })),
        "traced" if req.headers().contains_key("X-B3-TraceId") => HttpResponse::Ok().json(json!({
            "username": "traced",
            "firstname": "Trace",
            "lastname": "Header",
            "role": "user",
        })),
        "slow" => {
            actix_web::rt::time::sleep(Duration::from_secs(2)).await;
            HttpResponse::Ok().finish()
        }
        "broken" => HttpResponse::InternalServerError().body("database is down"),
        _ => HttpResponse::NotFound().finish(),
    }
}

/// Start the fake users API on an ephemeral port
fn users_api() -> (String, ServerHandle) {
    let server = HttpServer::new(|| App::new().route("/users/{username}", web::get().to(user)))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let address = format!("http://{}", server.addrs()[0]);

    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    (address, handle)
}

async fn collect(collected: Data<Collected>, spans: web::Json<Vec<Value>>) -> HttpResponse {
    collected.lock().unwrap().extend(spans.into_inner());
    HttpResponse::Accepted().finish()
}

/// Start a fake Zipkin collector; returns its span endpoint
fn collector() -> (String, Data<Collected>, ServerHandle) {
    let collected = Data::new(Collected::default());
    let server = HttpServer::new({
        let collected = collected.clone();
        move || {
            App::new()
                .app_data(collected.clone())
                .route("/api/v2/spans", web::post().to(collect))
        }
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let endpoint = format!("http://{}/api/v2/spans", server.addrs()[0]);

    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    (endpoint, collected, handle)
}

/// Wait until the collector has received `count` spans
async fn received_spans(collected: &Collected, count: usize) -> Vec<Value> {
    for _ in 0..40 {
        if collected.lock().unwrap().len() >= count {
            break;
        }
        actix_web::rt::time::sleep(Duration::from_millis(50)).await;
    }
    collected.lock().unwrap().clone()
}

fn client(address: &str, caller: Arc<dyn DependencyCaller>) -> UsersClient {
    UsersClient::new(address, caller)
}

fn plain() -> Arc<dyn DependencyCaller> {
    Arc::new(PlainCaller::new(Duration::from_millis(300)))
}

#[actix_web::test]
async fn test_plain_caller_fetches_user() {
    let (address, handle) = users_api();

    let user = client(&address, plain()).fetch_user("admin", "token").await.unwrap();
    assert_eq!(user.username, "admin");
    assert_eq!(user.first_name, "Admin");
    assert_eq!(user.last_name, "User");
    assert_eq!(user.role, "admin");

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_plain_caller_classifies_failures() {
    let (address, handle) = users_api();
    let users = client(&address, plain());

    assert!(matches!(
        users.fetch_user("ghost", "token").await,
        Err(DependencyError::NotFound)
    ));
    assert!(matches!(
        users.fetch_user("slow", "token").await,
        Err(DependencyError::Timeout)
    ));
    match users.fetch_user("broken", "token").await {
        Err(DependencyError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "database is down");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_unreachable_users_api_is_transport_error() {
    let (address, handle) = users_api();
    handle.stop(false).await;

    let result = client(&address, plain()).fetch_user("admin", "token").await;

    assert!(matches!(
        result,
        Err(DependencyError::Transport(_) | DependencyError::Timeout)
    ));
}

#[actix_web::test]
async fn test_traced_caller_propagates_b3_headers() {
    let (address, handle) = users_api();
    let (endpoint, collected, collector_handle) = collector();
    let reporter = ZipkinReporter::spawn(endpoint, "auth-gateway");
    let traced = Arc::new(TracedCaller::new(plain(), reporter));

    let user = client(&address, traced).fetch_user("traced", "token").await.unwrap();
    assert_eq!(user.first_name, "Trace");

    let spans = received_spans(&collected, 1).await;
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0]["kind"], "CLIENT");
    assert_eq!(spans[0]["localEndpoint"]["serviceName"], "auth-gateway");
    assert_eq!(spans[0]["tags"]["http.status_code"], "200");

    handle.stop(true).await;
    collector_handle.stop(true).await;
}

#[actix_web::test]
async fn test_traced_login_continues_inbound_trace() {
    let (address, handle) = users_api();
    let (endpoint, collected, collector_handle) = collector();
    let reporter = ZipkinReporter::spawn(endpoint, "auth-gateway");

    let mut config = setup::config();
    config.users_api.address = address;
    let caller = Arc::new(TracedCaller::new(plain(), reporter.clone()));
    let login_service = LoginService::from_config(&config, caller);
    let service = init_service(
        App::new()
            .wrap(TraceMiddleware::new(Some(reporter)))
            .app_data(Data::new(login_service))
            .configure(router::route),
    )
    .await;

    let req = TestRequest::post()
        .uri("/login")
        .insert_header(("X-B3-TraceId", "463ac35c9f6413ad48485a3953bb6124"))
        .insert_header(("X-B3-SpanId", "a2fb4a1d1a96d312"))
        .set_json(json!({ "username": "admin", "password": "admin" }))
        .to_request();
    let resp = call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let spans = received_spans(&collected, 2).await;
    let server = spans.iter().find(|span| span["kind"] == "SERVER").unwrap();
    let outbound = spans.iter().find(|span| span["kind"] == "CLIENT").unwrap();

    assert_eq!(server["traceId"], "463ac35c9f6413ad48485a3953bb6124");
    assert_eq!(server["parentId"], "a2fb4a1d1a96d312");
    assert_eq!(server["tags"]["http.path"], "/login");
    assert_eq!(outbound["traceId"], "463ac35c9f6413ad48485a3953bb6124");
    assert_eq!(outbound["parentId"], server["id"]);

    handle.stop(true).await;
    collector_handle.stop(true).await;
}

#[actix_web::test]
async fn test_login_over_real_transport() {
    let (address, handle) = users_api();

    let mut config = setup::config();
    config.users_api.address = address;
    let login_service = LoginService::from_config(&config, plain());
    let service = auth_gateway::service!(login_service);

    let req = TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": "admin", "password": "admin" }))
        .to_request();
    let resp = call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": "ghost", "password": "ghost" }))
        .to_request();
    let resp = call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    handle.stop(true).await;
}
