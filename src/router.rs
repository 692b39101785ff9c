use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::analytics::router::init_analytics_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::brag_sheets::router::init_brag_sheet_router;
use crate::modules::chat::router::init_chat_router;
use crate::modules::discussions::router::init_discussions_router;
use crate::modules::events::router::init_events_router;
use crate::modules::feedback::router::init_feedback_router;
use crate::modules::menus::router::init_menus_router;
use crate::modules::roles::router::{init_roles_router, init_user_roles_router};
use crate::modules::schedules::router::init_schedules_router;
use crate::modules::schools::router::init_schools_router;
use crate::modules::study_halls::router::init_study_halls_router;
use crate::modules::tasks::router::init_tasks_router;
use crate::modules::users::router::{init_profile_router, init_users_router};
use crate::state::AppState;

async fn health() -> &'static str {
    "OK"
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest("/me", init_profile_router())
                .nest(
                    "/users",
                    init_users_router().nest("/{user_id}/roles", init_user_roles_router()),
                )
                .nest("/roles", init_roles_router())
                .nest("/schools", init_schools_router())
                .nest("/menus", init_menus_router())
                .nest("/tasks", init_tasks_router())
                .nest("/schedules", init_schedules_router())
                .nest("/study-halls", init_study_halls_router())
                .nest("/discussions", init_discussions_router())
                .nest("/brag-sheet", init_brag_sheet_router())
                .nest("/feedback", init_feedback_router())
                .nest("/chat", init_chat_router())
                .nest("/events", init_events_router())
                .nest("/analytics", init_analytics_router()),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
