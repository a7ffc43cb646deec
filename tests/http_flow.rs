use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use ecomgo::app::build_app;
use ecomgo::auth::repo::MemoryUserStore;
use ecomgo::config::AppConfig;
use ecomgo::state::AppState;

fn test_config() -> AppConfig {
    AppConfig::from_lookup(|k| match k {
        "DB_PASSWORD" => Some("unused".into()),
        _ => None,
    })
    .expect("test config")
}

fn build(store: Arc<MemoryUserStore>, shutdown: CancellationToken) -> Router {
    build_app(AppState::with_store(store, &test_config(), shutdown))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn register_login_lookup_scenario() {
    let app = build(Arc::new(MemoryUserStore::new()), CancellationToken::new());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/register",
            json!({"email": "a@x.com", "password": "secret1", "first_name": "A"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user = &body["user"];
    let id = user["id"].as_str().expect("id").to_string();
    assert_eq!(user["email"], "a@x.com");
    assert_eq!(user["first_name"], "A");
    assert!(user.get("password_hash").is_none());
    assert!(body["token"].as_str().unwrap().ends_with(&id));
    assert!(body["expires_at"].is_i64());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/register",
            json!({"email": "a@x.com", "password": "anything-else"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "user already exists");

    let (status, wrong_pw) = send(
        &app,
        post_json("/api/v1/login", json!({"email": "a@x.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = send(
        &app,
        post_json("/api/v1/login", json!({"email": "b@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);

    let (status, body) = send(
        &app,
        post_json("/api/v1/login", json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().unwrap().ends_with(&id));

    let (status, body) = send(&app, get(&format!("/api/v1/users/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["email"], "a@x.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn short_password_and_bad_json_are_bad_request() {
    let app = build(Arc::new(MemoryUserStore::new()), CancellationToken::new());

    let (status, _) = send(
        &app,
        post_json("/api/v1/register", json!({"email": "a@x.com", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json("/api/v1/register", json!({"email": "not-an-email", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, post_json("/api/v1/login", json!({"email": "a@x.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid request");

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overlong_email_is_bad_request() {
    let app = build(Arc::new(MemoryUserStore::new()), CancellationToken::new());
    let email = format!("{}@x.com", "a".repeat(300));

    let (status, body) = send(
        &app,
        post_json("/api/v1/register", json!({"email": email, "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email must be at most 254 characters");

    let (status, _) = send(
        &app,
        post_json("/api/v1/login", json!({"email": email, "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_and_deleted_users_are_not_found() {
    let store = Arc::new(MemoryUserStore::new());
    let app = build(store.clone(), CancellationToken::new());

    let (status, _) = send(&app, get(&format!("/api/v1/users/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/api/v1/users/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(
        &app,
        post_json("/api/v1/register", json!({"email": "gone@x.com", "password": "secret1"})),
    )
    .await;
    let id: uuid::Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();
    assert!(store.soft_delete(id).await);

    let (status, body) = send(&app, get(&format!("/api/v1/users/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user not found");
}

#[tokio::test]
async fn lookup_ignores_authorization_header() {
    let app = build(Arc::new(MemoryUserStore::new()), CancellationToken::new());
    let (_, body) = send(
        &app,
        post_json("/api/v1/register", json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await;
    let id = body["user"]["id"].as_str().unwrap().to_string();

    let req = Request::builder()
        .uri(format!("/api/v1/users/{id}"))
        .header("authorization", "Bearer garbage")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn requests_after_shutdown_are_unavailable() {
    let shutdown = CancellationToken::new();
    let app = build(Arc::new(MemoryUserStore::new()), shutdown.clone());
    shutdown.cancel();

    let (status, body) = send(
        &app,
        post_json("/api/v1/register", json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "request cancelled");
}

#[tokio::test]
async fn health_is_ok() {
    let app = build(Arc::new(MemoryUserStore::new()), CancellationToken::new());
    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}
