mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
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
use common::{create_test_school, create_test_user, generate_unique_email};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

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

// ============ Create ============

#[sqlx::test(migrations = "./migrations")]
async fn test_create_school_as_admin(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin_email = generate_unique_email();
    create_test_user(&mut tx, &admin_email, "password123", "admin", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &admin_email, "password123").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/schools")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": "Northside High",
                "address": "42 Maple Ave",
                "signup_domain": "Northside.EDU",
                "menu_source_url": "https://northside.edu/lunch"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["name"], "Northside High");
    // Domains are matched case-insensitively at signup, so they are
    // stored lowercase.
    assert_eq!(body["signup_domain"], "northside.edu");
    assert!(body["id"].as_str().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_school_forbidden_for_students(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/schools")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": "Rogue Academy"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_school_rejects_invalid_menu_url(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin_email = generate_unique_email();
    create_test_user(&mut tx, &admin_email, "password123", "admin", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &admin_email, "password123").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/schools")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": "Northside High",
                "menu_source_url": "not a url"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_signup_domain_rejected(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin_email = generate_unique_email();
    create_test_user(&mut tx, &admin_email, "password123", "admin", None, None).await;
    create_test_school(&mut tx, "Eastside High", Some("shared-domain-test.edu")).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &admin_email, "password123").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/schools")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": "Westside High",
                "signup_domain": "shared-domain-test.edu"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("signup domain"));
}

// ============ Read ============

#[sqlx::test(migrations = "./migrations")]
async fn test_list_schools_with_search(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    create_test_school(&mut tx, "Lakeview Magnet", None).await;
    create_test_school(&mut tx, "Hillcrest Prep", None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/schools?search=lakeview")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Lakeview Magnet");
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["has_more"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_school_not_found(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/schools/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_schools_requires_auth(pool: PgPool) {
    let app = setup_test_app(pool).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/schools")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============ Update / delete ============

#[sqlx::test(migrations = "./migrations")]
async fn test_update_school(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin_email = generate_unique_email();
    create_test_user(&mut tx, &admin_email, "password123", "admin", None, None).await;
    let school = create_test_school(&mut tx, "Old Name High", None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &admin_email, "password123").await;

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/schools/{}", school.id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": "New Name High",
                "menu_source_url": "https://newname.edu/menus"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["name"], "New Name High");
    assert_eq!(body["menu_source_url"], "https://newname.edu/menus");
    // Untouched fields survive the partial update.
    assert_eq!(body["address"], "1 Test Street");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_school_detaches_members(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin_email = generate_unique_email();
    create_test_user(&mut tx, &admin_email, "password123", "admin", None, None).await;
    let school = create_test_school(&mut tx, "Closing Academy", None).await;
    let member_email = generate_unique_email();
    let member = create_test_user(
        &mut tx,
        &member_email,
        "password123",
        "student",
        Some(school.id),
        None,
    )
    .await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &admin_email, "password123").await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/schools/{}", school.id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The member keeps their account but loses the school link.
    let remaining_school: Option<Uuid> =
        sqlx::query_scalar("SELECT school_id FROM users WHERE id = $1")
            .bind(member.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(remaining_school.is_none());

    // Deleting again is a 404.
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/schools/{}", school.id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
