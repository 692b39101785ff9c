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

async fn create_entry(app: axum::Router, token: &str, payload: serde_json::Value) -> serde_json::Value {
    let request = Request::builder()
        .method("POST")
        .uri("/api/schedules")
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
async fn test_schedule_entry_lifecycle(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let entry = create_entry(
        app.clone(),
        &token,
        json!({
            "title": "AP Chemistry",
            "period": 3,
            "weekday": 2,
            "starts_at": "10:05:00",
            "ends_at": "10:55:00",
            "room": "Lab 2",
            "instructor": "Dr. Okafor"
        }),
    )
    .await;
    assert_eq!(entry["title"], "AP Chemistry");
    assert_eq!(entry["weekday"], 2);
    let id = entry["id"].as_str().unwrap();

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/schedules/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "room": "Lab 4"
            }))
            .unwrap(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let entry: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(entry["room"], "Lab 4");
    assert_eq!(entry["title"], "AP Chemistry");

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/schedules/{}", id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::builder()
        .method("GET")
        .uri("/api/schedules")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let entries: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_entries_sorted_by_weekday_then_time(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    create_entry(
        app.clone(),
        &token,
        json!({"title": "Gym", "weekday": 3, "starts_at": "14:00:00", "ends_at": "14:50:00"}),
    )
    .await;
    create_entry(
        app.clone(),
        &token,
        json!({"title": "Homeroom", "weekday": 1, "starts_at": "08:00:00", "ends_at": "08:15:00"}),
    )
    .await;
    create_entry(
        app.clone(),
        &token,
        json!({"title": "Algebra II", "weekday": 1, "starts_at": "09:00:00", "ends_at": "09:50:00"}),
    )
    .await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/schedules")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let entries: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries[0]["title"], "Homeroom");
    assert_eq!(entries[1]["title"], "Algebra II");
    assert_eq!(entries[2]["title"], "Gym");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_rejects_backwards_times(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/schedules")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "title": "Time warp",
                "weekday": 1,
                "starts_at": "10:00:00",
                "ends_at": "09:00:00"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_rejects_weekday_out_of_range(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/schedules")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "title": "Eighth day",
                "weekday": 8,
                "starts_at": "10:00:00",
                "ends_at": "11:00:00"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ============ Export ============

#[sqlx::test(migrations = "./migrations")]
async fn test_export_defaults_to_ics(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    create_entry(
        app.clone(),
        &token,
        json!({
            "title": "AP Chemistry",
            "weekday": 3,
            "starts_at": "10:05:00",
            "ends_at": "10:55:00",
            "room": "Lab 2"
        }),
    )
    .await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/schedules/export")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/calendar"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"schedule.ics\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let ics = String::from_utf8(body.to_vec()).unwrap();
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(ics.contains("PRODID:-//LunchLit//Class Schedule//EN\r\n"));
    assert!(ics.contains("SUMMARY:AP Chemistry\r\n"));
    assert!(ics.contains("RRULE:FREQ=WEEKLY;BYDAY=WE\r\n"));
    assert!(ics.contains("LOCATION:Lab 2\r\n"));
    assert!(ics.trim_end().ends_with("END:VCALENDAR"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_export_json_document(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    create_entry(
        app.clone(),
        &token,
        json!({
            "title": "World History",
            "period": 4,
            "weekday": 5,
            "starts_at": "11:00:00",
            "ends_at": "11:50:00"
        }),
    )
    .await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/schedules/export?format=json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"schedule.json\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let document: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(document["version"], 1);
    let entries = document["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "World History");
    assert_eq!(entries[0]["weekday"], 5);
    assert!(entries[0].get("user_id").is_none());
}

// ============ Import ============

#[sqlx::test(migrations = "./migrations")]
async fn test_import_json_schedule(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let payload = json!({
        "version": 1,
        "entries": [
            {"title": "Homeroom", "weekday": 1, "starts_at": "08:00:00", "ends_at": "08:15:00"},
            {"title": "Nowhere", "weekday": 9, "starts_at": "08:00:00", "ends_at": "09:00:00"},
            {"title": "Backwards", "weekday": 2, "starts_at": "10:00:00", "ends_at": "09:00:00"}
        ]
    });

    let request = Request::builder()
        .method("POST")
        .uri("/api/schedules/import")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&payload).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["imported"], 1);
    assert_eq!(report["rejected"], 2);

    let request = Request::builder()
        .method("GET")
        .uri("/api/schedules")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let entries: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "Homeroom");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_import_csv_schedule(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "password123", "student", None, None).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(app.clone(), &email, "password123").await;

    let csv = "title,period,weekday,starts_at,ends_at,room,instructor\n\
        Algebra II,1,1,09:00:00,09:50:00,114,Ms. Whitfield\n\
        ,2,1,10:00:00,10:50:00,,\n";

    let request = Request::builder()
        .method("POST")
        .uri("/api/schedules/import?format=csv")
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
