use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{partner, service_point},
    services::{
        partners::{CreatePartnerInput, PartnerFilter, UpdatePartnerInput},
        service_points::ServicePointFilter,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

use super::common::{created, no_content, page_params, paginated, CreatedResult, NoContentResult};

#[utoipa::path(
    get,
    path = "/api/v1/partners",
    params(PartnerFilter),
    responses(
        (status = 200, description = "Partners listed", body = ApiResponse<PaginatedResponse<partner::Model>>)
    ),
    tag = "partners"
)]
pub async fn list_partners(
    State(state): State<AppState>,
    Query(filter): Query<PartnerFilter>,
) -> ApiResult<PaginatedResponse<partner::Model>> {
    let (page, limit) = page_params(&state.config, filter.page, filter.limit);
    let (items, total) = state.services.partners.list(&filter, page, limit).await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/partners/:id",
    params(("id" = Uuid, Path, description = "Partner ID")),
    responses(
        (status = 200, description = "Partner fetched", body = ApiResponse<partner::Model>),
        (status = 404, description = "Partner not found", body = crate::errors::ErrorResponse)
    ),
    tag = "partners"
)]
pub async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<partner::Model> {
    let partner = state.services.partners.get(id).await?;
    Ok(Json(ApiResponse::success(partner)))
}

#[utoipa::path(
    post,
    path = "/api/v1/partners",
    request_body = CreatePartnerInput,
    responses(
        (status = 201, description = "Partner created", body = ApiResponse<partner::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "partners"
)]
pub async fn create_partner(
    State(state): State<AppState>,
    Json(payload): Json<CreatePartnerInput>,
) -> CreatedResult<partner::Model> {
    payload.validate()?;
    let partner = state.services.partners.create(payload).await?;
    created(partner)
}

#[utoipa::path(
    put,
    path = "/api/v1/partners/:id",
    params(("id" = Uuid, Path, description = "Partner ID")),
    request_body = UpdatePartnerInput,
    responses(
        (status = 200, description = "Partner updated", body = ApiResponse<partner::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Partner not found", body = crate::errors::ErrorResponse)
    ),
    tag = "partners"
)]
pub async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePartnerInput>,
) -> ApiResult<partner::Model> {
    payload.validate()?;
    let partner = state.services.partners.update(id, payload).await?;
    Ok(Json(ApiResponse::success(partner)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/partners/:id",
    params(("id" = Uuid, Path, description = "Partner ID")),
    responses(
        (status = 204, description = "Partner deleted"),
        (status = 404, description = "Partner not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Partner still owns service points", body = crate::errors::ErrorResponse)
    ),
    tag = "partners"
)]
pub async fn delete_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> NoContentResult {
    state.services.partners.delete(id).await?;
    no_content()
}

#[utoipa::path(
    get,
    path = "/api/v1/partners/:id/service-points",
    params(
        ("id" = Uuid, Path, description = "Partner ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Service points of the partner", body = ApiResponse<PaginatedResponse<service_point::Model>>),
        (status = 404, description = "Partner not found", body = crate::errors::ErrorResponse)
    ),
    tag = "partners"
)]
pub async fn list_partner_service_points(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ServicePointFilter>,
) -> ApiResult<PaginatedResponse<service_point::Model>> {
    state.services.partners.get(id).await?;

    let filter = ServicePointFilter {
        partner_id: Some(id),
        ..query
    };
    let (page, limit) = page_params(&state.config, filter.page, filter.limit);
    let (items, total) = state
        .services
        .service_points
        .list(&filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}
