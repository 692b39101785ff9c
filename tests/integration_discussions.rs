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
use common::{create_test_school, create_test_user, generate_unique_email, generate_unique_school_name};
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

async fn create_discussion(app: axum::Router, token: &str, title: &str) -> serde_json::Value {
    let request = Request::builder()
        .method("POST")
        .uri("/api/discussions")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "title": title,
                "body": "Opening post"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn post_reply(
    app: axum::Router,
    token: &str,
    discussion_id: &str,
    body_text: &str,
) -> axum::response::Response {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/discussions/{}/replies", discussion_id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "body": body_text
            }))
            .unwrap(),
        ))
        .unwrap();

    app.oneshot(request).await.unwrap()
}

// ============ Threads ============

#[sqlx::test(migrations = "./migrations")]
async fn test_create_and_read_thread(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let school = create_test_school(&mut tx, &generate_unique_school_name(), None).await;
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", Some(school.id), None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let discussion = create_discussion(app.clone(), &token, "Lost water bottle").await;
    assert_eq!(discussion["title"], "Lost water bottle");
    assert_eq!(discussion["is_locked"], false);
    assert_eq!(discussion["school_id"], school.id.to_string());

    let id = discussion["id"].as_str().unwrap();
    let response = post_reply(app.clone(), &token, id, "Check the gym").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = post_reply(app.clone(), &token, id, "Found it, thanks").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/discussions/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let thread: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(thread["discussion"]["title"], "Lost water bottle");

    let replies = thread["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 2);
    // Oldest first.
    assert_eq!(replies[0]["body"], "Check the gym");
    assert_eq!(replies[1]["body"], "Found it, thanks");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_discussion_requires_a_school(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/discussions")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "title": "Hello",
                "body": "Anyone here?"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_discussions_newest_first(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let school = create_test_school(&mut tx, &generate_unique_school_name(), None).await;
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", Some(school.id), None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let first = create_discussion(app.clone(), &token, "First thread").await;
    let first_id = first["id"].as_str().unwrap();
    let response = post_reply(app.clone(), &token, first_id, "A reply").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    create_discussion(app.clone(), &token, "Second thread").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/discussions")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["title"], "Second thread");
    assert_eq!(data[0]["reply_count"], 0);
    assert_eq!(data[1]["title"], "First thread");
    assert_eq!(data[1]["reply_count"], 1);
    assert_eq!(body["meta"]["total"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_thread_not_found(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/discussions/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============ Locking ============

#[sqlx::test(migrations = "./migrations")]
async fn test_locked_thread_rejects_all_replies(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let school = create_test_school(&mut tx, &generate_unique_school_name(), None).await;
    let student_email = generate_unique_email();
    create_test_user(
        &mut tx,
        &student_email,
        "password123",
        "student",
        Some(school.id),
        None,
    )
    .await;
    let teacher_email = generate_unique_email();
    create_test_user(
        &mut tx,
        &teacher_email,
        "password123",
        "teacher",
        Some(school.id),
        None,
    )
    .await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let student_token = get_auth_token(app.clone(), &student_email, "password123").await;
    let teacher_token = get_auth_token(app.clone(), &teacher_email, "password123").await;

    let discussion = create_discussion(app.clone(), &student_token, "Getting heated").await;
    let id = discussion["id"].as_str().unwrap();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/discussions/{}/lock", id))
        .header("authorization", format!("Bearer {}", teacher_token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["is_locked"], true);

    // The lock applies to moderators too, not just students.
    let response = post_reply(app.clone(), &student_token, id, "One more thing").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = post_reply(app.clone(), &teacher_token, id, "Settle down").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/discussions/{}/unlock", id))
        .header("authorization", format!("Bearer {}", teacher_token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_reply(app, &student_token, id, "Sorry about that").await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lock_requires_moderation_permission(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let school = create_test_school(&mut tx, &generate_unique_school_name(), None).await;
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", Some(school.id), None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let discussion = create_discussion(app.clone(), &token, "My own thread").await;
    let id = discussion["id"].as_str().unwrap();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/discussions/{}/lock", id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============ Deletion ============

#[sqlx::test(migrations = "./migrations")]
async fn test_author_deletes_own_discussion(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let school = create_test_school(&mut tx, &generate_unique_school_name(), None).await;
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", Some(school.id), None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let discussion = create_discussion(app.clone(), &token, "Never mind").await;
    let id = discussion["id"].as_str().unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/discussions/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/discussions/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_moderator_deletes_someone_elses_discussion(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let school = create_test_school(&mut tx, &generate_unique_school_name(), None).await;
    let author_email = generate_unique_email();
    create_test_user(
        &mut tx,
        &author_email,
        "password123",
        "student",
        Some(school.id),
        None,
    )
    .await;
    let other_email = generate_unique_email();
    create_test_user(
        &mut tx,
        &other_email,
        "password123",
        "student",
        Some(school.id),
        None,
    )
    .await;
    let teacher_email = generate_unique_email();
    create_test_user(
        &mut tx,
        &teacher_email,
        "password123",
        "teacher",
        Some(school.id),
        None,
    )
    .await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let author_token = get_auth_token(app.clone(), &author_email, "password123").await;

    let discussion = create_discussion(app.clone(), &author_token, "Unpopular opinion").await;
    let id = discussion["id"].as_str().unwrap();

    // Another student has no standing.
    let other_token = get_auth_token(app.clone(), &other_email, "password123").await;
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/discussions/{}", id))
        .header("authorization", format!("Bearer {}", other_token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A teacher moderates it away.
    let teacher_token = get_auth_token(app.clone(), &teacher_email, "password123").await;
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/discussions/{}", id))
        .header("authorization", format!("Bearer {}", teacher_token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reply_deletion_permissions(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let school = create_test_school(&mut tx, &generate_unique_school_name(), None).await;
    let author_email = generate_unique_email();
    create_test_user(
        &mut tx,
        &author_email,
        "password123",
        "student",
        Some(school.id),
        None,
    )
    .await;
    let other_email = generate_unique_email();
    create_test_user(
        &mut tx,
        &other_email,
        "password123",
        "student",
        Some(school.id),
        None,
    )
    .await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let author_token = get_auth_token(app.clone(), &author_email, "password123").await;

    let discussion = create_discussion(app.clone(), &author_token, "Reply thread").await;
    let id = discussion["id"].as_str().unwrap();

    let response = post_reply(app.clone(), &author_token, id, "My reply").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let reply: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let reply_id = reply["id"].as_str().unwrap();

    // A bystander cannot delete it.
    let other_token = get_auth_token(app.clone(), &other_email, "password123").await;
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/discussions/{}/replies/{}", id, reply_id))
        .header("authorization", format!("Bearer {}", other_token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The author can.
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/discussions/{}/replies/{}", id, reply_id))
        .header("authorization", format!("Bearer {}", author_token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Gone means gone.
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/discussions/{}/replies/{}", id, reply_id))
        .header("authorization", format!("Bearer {}", author_token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
