mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use lunchlit::config::cache::CacheConfig;
use lunchlit::config::chat::ChatConfig;
use lunchlit::config::cors::CorsConfig;
use lunchlit::config::email::EmailConfig;
use lunchlit::config::jwt::JwtConfig;
use lunchlit::config::rate_limit::RateLimitConfig;
use lunchlit::events::EventBus;
use lunchlit::router::init_router;
use lunchlit::state::AppState;
use common::{create_test_user, generate_unique_email};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

async fn setup_test_app(pool: PgPool) -> axum::Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool,
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
        chat_config: ChatConfig::from_env(),
        cache_config: CacheConfig::default(),
        cache: None,
        events: EventBus::new(),
        http: reqwest::Client::new(),
    };
    init_router(state)
}

async fn get_auth_token(app: axum::Router, email: &str, password: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "email": email,
                "password": password
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    body["access_token"].as_str().unwrap().to_string()
}

// ============ Feed endpoint ============

#[sqlx::test(migrations = "./migrations")]
async fn test_events_feed_requires_auth(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/events")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_events_feed_opens_as_event_stream(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/events")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    // Only inspect the head; the stream itself never ends.
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_events_feed_accepts_stream_filter(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/events?streams=study_halls,discussions")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_events_feed_rejects_unknown_stream(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/events?streams=menus")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Unknown stream"));
}
