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

async fn create_task(app: axum::Router, token: &str, payload: serde_json::Value) -> serde_json::Value {
    let request = Request::builder()
        .method("POST")
        .uri("/api/tasks")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&payload).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ============ CRUD ============

#[sqlx::test(migrations = "./migrations")]
async fn test_task_lifecycle(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let task = create_task(
        app.clone(),
        &token,
        json!({
            "title": "Finish history essay",
            "notes": "Three pages minimum",
            "due_date": "2026-04-10"
        }),
    )
    .await;
    assert_eq!(task["completed"], false);
    assert!(task["completed_at"].is_null());
    let id = task["id"].as_str().unwrap();

    // Completing stamps completed_at.
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/tasks/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "completed": true
            }))
            .unwrap(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let task: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(task["completed"], true);
    assert!(task["completed_at"].as_str().is_some());

    // Un-completing clears it again.
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/tasks/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "completed": false
            }))
            .unwrap(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let task: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(task["completed"], false);
    assert!(task["completed_at"].is_null());

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/tasks/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/tasks/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_tasks_are_owner_scoped(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let owner_email = generate_unique_email();
    create_test_user(&mut tx, &owner_email, "password123", "student", None, None).await;
    let other_email = generate_unique_email();
    create_test_user(&mut tx, &other_email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let owner_token = get_auth_token(app.clone(), &owner_email, "password123").await;

    let task = create_task(
        app.clone(),
        &owner_token,
        json!({
            "title": "Private errand"
        }),
    )
    .await;
    let id = task["id"].as_str().unwrap();

    let other_token = get_auth_token(app.clone(), &other_email, "password123").await;
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/tasks/{}", id))
        .header("authorization", format!("Bearer {}", other_token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_tasks_with_filters(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let early = create_task(
        app.clone(),
        &token,
        json!({"title": "Signup sheet", "due_date": "2026-04-01"}),
    )
    .await;
    create_task(
        app.clone(),
        &token,
        json!({"title": "Book report", "due_date": "2026-04-15"}),
    )
    .await;
    create_task(app.clone(), &token, json!({"title": "Someday list"})).await;

    // Mark the earliest one done.
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/tasks/{}", early["id"].as_str().unwrap()))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({"completed": true})).unwrap(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Default list: due dates first, undated last.
    let request = Request::builder()
        .method("GET")
        .uri("/api/tasks")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["title"], "Signup sheet");
    assert_eq!(data[2]["title"], "Someday list");
    assert_eq!(body["meta"]["total"], 3);

    // Only open tasks.
    let request = Request::builder()
        .method("GET")
        .uri("/api/tasks?completed=false")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Only tasks due soon.
    let request = Request::builder()
        .method("GET")
        .uri("/api/tasks?due_before=2026-04-10")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "Signup sheet");
}

// ============ Export ============

#[sqlx::test(migrations = "./migrations")]
async fn test_export_tasks_as_json_document(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    create_task(
        app.clone(),
        &token,
        json!({"title": "Study chemistry", "due_date": "2026-04-03"}),
    )
    .await;
    create_task(app.clone(), &token, json!({"title": "Return library books"})).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/tasks/export")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"tasks.json\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let document: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(document["version"], 1);

    let tasks = document["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["title"], "Study chemistry");
    assert_eq!(tasks[0]["due_date"], "2026-04-03");
    // Nothing owner-specific leaves the account.
    assert!(tasks[0].get("user_id").is_none());
    assert!(tasks[0].get("id").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_export_tasks_as_csv(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    create_task(
        app.clone(),
        &token,
        json!({"title": "Pack lunch", "due_date": "2026-04-03"}),
    )
    .await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/tasks/export?format=csv")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"tasks.csv\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("title,notes,due_date,completed"));
    assert_eq!(lines.next(), Some("Pack lunch,,2026-04-03,false"));
}

// ============ Import ============

#[sqlx::test(migrations = "./migrations")]
async fn test_import_json_keeps_good_rows(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let payload = json!({
        "version": 1,
        "tasks": [
            {"title": "Finish essay draft", "due_date": "2026-04-12"},
            {"title": ""},
            {"title": "Sign up for SAT", "due_date": "not-a-date"}
        ]
    });

    let request = Request::builder()
        .method("POST")
        .uri("/api/tasks/import")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&payload).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["imported"], 1);
    assert_eq!(report["rejected"], 2);

    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors[0]["row"], 2);
    assert_eq!(errors[1]["row"], 3);

    // Only the good row landed.
    let request = Request::builder()
        .method("GET")
        .uri("/api/tasks")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "Finish essay draft");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_import_rejects_unsupported_version(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/tasks/import")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(r#"{"version": 2, "tasks": []}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("version"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_import_csv_requires_exact_header(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    // Wrong first column name.
    let request = Request::builder()
        .method("POST")
        .uri("/api/tasks/import?format=csv")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from("name,notes,due_date,completed\nEssay,,,false\n"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // With the right header, valid and invalid rows are split.
    let csv = "title,notes,due_date,completed\n\
        Pack lunch,,2026-04-08,false\n\
        Renew bus pass,,,maybe\n";
    let request = Request::builder()
        .method("POST")
        .uri("/api/tasks/import?format=csv")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(csv))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["imported"], 1);
    assert_eq!(report["rejected"], 1);
    assert_eq!(report["errors"][0]["row"], 2);
}
