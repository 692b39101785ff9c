use axum::{
    Json,
    extract::{Query, State},
};

use crate::middleware::auth::RequireViewAnalytics;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{AnalyticsOverview, AnalyticsParams};
use super::service::AnalyticsService;

#[utoipa::path(
    get,
    path = "/api/analytics/overview",
    params(
        ("school_id" = Option<Uuid>, Query, description = "School override for accounts without one")
    ),
    responses(
        (status = 200, description = "Dashboard counts for one school", body = AnalyticsOverview),
        (status = 400, description = "No school to report on"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Analytics",
    security(("bearer_auth" = []))
)]
pub async fn get_overview(
    State(state): State<AppState>,
    RequireViewAnalytics(auth_user): RequireViewAnalytics,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsOverview>, AppError> {
    let school_id = auth_user.school_id().or(params.school_id).ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!(
            "No school specified and your account has none"
        ))
    })?;

    let overview = AnalyticsService::overview(&state.db, school_id).await?;

    Ok(Json(overview))
}
