use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::schedule,
    errors::ServiceError,
    models::{DayPlan, SlotAction},
    services::schedules::{
        AvailableQuery, GenerateScheduleInput, GenerationReport, PreviewQuery, ScheduleFilter,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

use super::common::{created, page_params, paginated, CreatedResult};

#[utoipa::path(
    post,
    path = "/api/v1/service-points/:id/schedule/generate",
    params(("id" = Uuid, Path, description = "Service point ID")),
    request_body = GenerateScheduleInput,
    responses(
        (status = 201, description = "Slots generated", body = ApiResponse<GenerationReport>),
        (status = 400, description = "Invalid range or duration", body = crate::errors::ErrorResponse),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent generation for the same range", body = crate::errors::ErrorResponse),
        (status = 422, description = "Service point is not active", body = crate::errors::ErrorResponse)
    ),
    tag = "schedules"
)]
pub async fn generate_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GenerateScheduleInput>,
) -> CreatedResult<GenerationReport> {
    payload.validate()?;
    let report = state.services.schedules.generate(id, payload).await?;
    created(report)
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points/:id/schedule/preview",
    params(("id" = Uuid, Path, description = "Service point ID"), PreviewQuery),
    responses(
        (status = 200, description = "Slot grid for the date", body = ApiResponse<DayPlan>),
        (status = 400, description = "Invalid duration", body = crate::errors::ErrorResponse),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "schedules"
)]
pub async fn preview_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> ApiResult<DayPlan> {
    let plan = state
        .services
        .schedules
        .preview(id, query.date, query.slot_duration_minutes)
        .await?;
    Ok(Json(ApiResponse::success(plan)))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points/:id/schedule",
    params(("id" = Uuid, Path, description = "Service point ID"), ScheduleFilter),
    responses(
        (status = 200, description = "Slots listed", body = ApiResponse<PaginatedResponse<schedule::Model>>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "schedules"
)]
pub async fn list_slots(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(filter): Query<ScheduleFilter>,
) -> ApiResult<PaginatedResponse<schedule::Model>> {
    let (page, limit) = page_params(&state.config, filter.page, filter.limit);
    let (items, total) = state
        .services
        .schedules
        .list(id, &filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points/:id/schedule/available",
    params(("id" = Uuid, Path, description = "Service point ID"), AvailableQuery),
    responses(
        (status = 200, description = "Available slots for the date", body = ApiResponse<Vec<schedule::Model>>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "schedules"
)]
pub async fn available_slots(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailableQuery>,
) -> ApiResult<Vec<schedule::Model>> {
    let slots = state
        .services
        .schedules
        .available_for_date(id, query.date)
        .await?;
    Ok(Json(ApiResponse::success(slots)))
}

#[utoipa::path(
    get,
    path = "/api/v1/schedules/:id",
    params(("id" = Uuid, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Slot fetched", body = ApiResponse<schedule::Model>),
        (status = 404, description = "Slot not found", body = crate::errors::ErrorResponse)
    ),
    tag = "schedules"
)]
pub async fn get_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<schedule::Model> {
    let slot = state.services.schedules.get(id).await?;
    Ok(Json(ApiResponse::success(slot)))
}

#[utoipa::path(
    post,
    path = "/api/v1/schedules/:id/:action",
    params(
        ("id" = Uuid, Path, description = "Slot ID"),
        ("action" = String, Path, description = "One of book, complete, cancel, reopen")
    ),
    responses(
        (status = 200, description = "Slot transitioned", body = ApiResponse<schedule::Model>),
        (status = 400, description = "Unknown action", body = crate::errors::ErrorResponse),
        (status = 404, description = "Slot not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Transition not allowed from the current status", body = crate::errors::ErrorResponse)
    ),
    tag = "schedules"
)]
pub async fn transition_slot(
    State(state): State<AppState>,
    Path((id, action)): Path<(Uuid, String)>,
) -> ApiResult<schedule::Model> {
    let action: SlotAction = action
        .parse()
        .map_err(|_| ServiceError::BadRequest(format!("Unknown slot action '{}'", action)))?;
    let slot = state.services.schedules.transition(id, action).await?;
    Ok(Json(ApiResponse::success(slot)))
}
