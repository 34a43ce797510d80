use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::service,
    services::catalog::{CreateServiceInput, ServiceFilter, UpdateServiceInput},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

use super::common::{created, no_content, page_params, paginated, CreatedResult, NoContentResult};

#[utoipa::path(
    get,
    path = "/api/v1/services",
    params(ServiceFilter),
    responses(
        (status = 200, description = "Catalog services listed", body = ApiResponse<PaginatedResponse<service::Model>>)
    ),
    tag = "services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(filter): Query<ServiceFilter>,
) -> ApiResult<PaginatedResponse<service::Model>> {
    let (page, limit) = page_params(&state.config, filter.page, filter.limit);
    let (items, total) = state.services.catalog.list(&filter, page, limit).await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/services/:id",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service fetched", body = ApiResponse<service::Model>),
        (status = 404, description = "Service not found", body = crate::errors::ErrorResponse)
    ),
    tag = "services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<service::Model> {
    let service = state.services.catalog.get(id).await?;
    Ok(Json(ApiResponse::success(service)))
}

#[utoipa::path(
    post,
    path = "/api/v1/services",
    request_body = CreateServiceInput,
    responses(
        (status = 201, description = "Service created", body = ApiResponse<service::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already used", body = crate::errors::ErrorResponse)
    ),
    tag = "services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<CreateServiceInput>,
) -> CreatedResult<service::Model> {
    payload.validate()?;
    let service = state.services.catalog.create(payload).await?;
    created(service)
}

#[utoipa::path(
    put,
    path = "/api/v1/services/:id",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceInput,
    responses(
        (status = 200, description = "Service updated", body = ApiResponse<service::Model>),
        (status = 404, description = "Service not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already used", body = crate::errors::ErrorResponse)
    ),
    tag = "services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceInput>,
) -> ApiResult<service::Model> {
    payload.validate()?;
    let service = state.services.catalog.update(id, payload).await?;
    Ok(Json(ApiResponse::success(service)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/services/:id",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 204, description = "Service deleted"),
        (status = 404, description = "Service not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Service still offered", body = crate::errors::ErrorResponse)
    ),
    tag = "services"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> NoContentResult {
    state.services.catalog.delete(id).await?;
    no_content()
}
