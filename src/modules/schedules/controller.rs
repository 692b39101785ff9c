use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::transfer::ImportReport;
use crate::validator::ValidatedJson;

use super::ics;
use super::model::{
    CreateScheduleEntryDto, ScheduleEntry, ScheduleExportFormat, ScheduleExportQuery,
    ScheduleImportFormat, ScheduleImportQuery, UpdateScheduleEntryDto,
};
use super::service::ScheduleService;
use super::transfer;

#[utoipa::path(
    post,
    path = "/api/schedules",
    request_body = CreateScheduleEntryDto,
    responses(
        (status = 201, description = "Schedule entry created", body = ScheduleEntry),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
pub async fn create_entry(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateScheduleEntryDto>,
) -> Result<(StatusCode, Json<ScheduleEntry>), AppError> {
    let entry = ScheduleService::create_entry(&state.db, auth_user.user_id()?, dto).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/schedules",
    responses(
        (status = 200, description = "The caller's weekly schedule", body = Vec<ScheduleEntry>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
pub async fn get_entries(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let entries = ScheduleService::list_entries(&state.db, auth_user.user_id()?).await?;

    Ok(Json(entries))
}

#[utoipa::path(
    patch,
    path = "/api/schedules/{id}",
    params(("id" = Uuid, Path, description = "Schedule entry ID")),
    request_body = UpdateScheduleEntryDto,
    responses(
        (status = 200, description = "Schedule entry updated", body = ScheduleEntry),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
pub async fn update_entry(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateScheduleEntryDto>,
) -> Result<Json<ScheduleEntry>, AppError> {
    let entry = ScheduleService::update_entry(&state.db, auth_user.user_id()?, id, dto).await?;

    Ok(Json(entry))
}

#[utoipa::path(
    delete,
    path = "/api/schedules/{id}",
    params(("id" = Uuid, Path, description = "Schedule entry ID")),
    responses(
        (status = 204, description = "Schedule entry deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ScheduleService::delete_entry(&state.db, auth_user.user_id()?, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/schedules/export",
    params(("format" = Option<String>, Query, description = "ics (default), json, or csv")),
    responses(
        (status = 200, description = "Schedule export as a download"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
pub async fn export_entries(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ScheduleExportQuery>,
) -> Result<Response, AppError> {
    let entries = ScheduleService::list_entries(&state.db, auth_user.user_id()?).await?;

    let (content_type, filename, body) = match query.format.unwrap_or(ScheduleExportFormat::Ics) {
        ScheduleExportFormat::Ics => {
            let now = Utc::now();
            let calendar = ics::render_calendar(&entries, now, ics::week_start(now.date_naive()));
            ("text/calendar", "schedule.ics", calendar)
        }
        ScheduleExportFormat::Json => (
            "application/json",
            "schedule.json",
            transfer::to_json(&entries)?,
        ),
        ScheduleExportFormat::Csv => ("text/csv", "schedule.csv", transfer::to_csv(&entries)?),
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/schedules/import",
    request_body(content = String, description = "A version-1 schedule export, JSON or CSV"),
    params(("format" = Option<String>, Query, description = "json (default) or csv")),
    responses(
        (status = 200, description = "Import report with per-row errors", body = ImportReport),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schedules",
    security(("bearer_auth" = []))
)]
pub async fn import_entries(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ScheduleImportQuery>,
    body: String,
) -> Result<Json<ImportReport>, AppError> {
    let (records, errors) = match query.format.unwrap_or(ScheduleImportFormat::Json) {
        ScheduleImportFormat::Json => transfer::parse_json(&body)?,
        ScheduleImportFormat::Csv => transfer::parse_csv(&body)?,
    };

    let report =
        ScheduleService::import_entries(&state.db, auth_user.user_id()?, records, errors).await?;

    Ok(Json(report))
}
