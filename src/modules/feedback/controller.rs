use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, RequireManageUsers};
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateFeedbackDto, Feedback, FeedbackFilterParams, PaginatedFeedbackResponse,
    UpdateFeedbackStatusDto,
};
use super::service::FeedbackService;

#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = CreateFeedbackDto,
    responses(
        (status = 201, description = "Feedback submitted", body = Feedback),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Feedback",
    security(("bearer_auth" = []))
)]
pub async fn create_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateFeedbackDto>,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let user_id = auth_user.user_id()?;
    let feedback = FeedbackService::create_feedback(&state.db, user_id, dto).await?;

    Ok((StatusCode::CREATED, Json(feedback)))
}

#[utoipa::path(
    get,
    path = "/api/feedback",
    responses(
        (status = 200, description = "The caller's feedback, newest first", body = Vec<Feedback>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Feedback",
    security(("bearer_auth" = []))
)]
pub async fn get_my_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Feedback>>, AppError> {
    let user_id = auth_user.user_id()?;
    let feedback = FeedbackService::list_my_feedback(&state.db, user_id).await?;

    Ok(Json(feedback))
}

#[utoipa::path(
    get,
    path = "/api/feedback/all",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("offset" = Option<i64>, Query, description = "Rows to skip"),
        ("page" = Option<i64>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "All feedback with submitters", body = PaginatedFeedbackResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Feedback",
    security(("bearer_auth" = []))
)]
pub async fn get_all_feedback(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Query(params): Query<FeedbackFilterParams>,
) -> Result<Json<PaginatedFeedbackResponse>, AppError> {
    let feedback = FeedbackService::list_all_feedback(&state.db, params).await?;

    Ok(Json(feedback))
}

#[utoipa::path(
    patch,
    path = "/api/feedback/{id}/status",
    params(("id" = Uuid, Path, description = "Feedback ID")),
    request_body = UpdateFeedbackStatusDto,
    responses(
        (status = 200, description = "Status updated", body = Feedback),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Feedback not found")
    ),
    tag = "Feedback",
    security(("bearer_auth" = []))
)]
pub async fn update_feedback_status(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateFeedbackStatusDto>,
) -> Result<Json<Feedback>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    let feedback = FeedbackService::update_status(&state.db, &email, id, dto.status).await?;

    Ok(Json(feedback))
}
