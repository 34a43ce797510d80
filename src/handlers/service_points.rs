use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{service_point, service_point_photo, service_post},
    errors::ServiceError,
    models::{ServicePointStatus, WorkingHours},
    services::service_points::{
        AddPhotoInput, AttachServiceInput, CreatePostInput, CreateServicePointInput,
        OfferedService, ServicePointDetail, ServicePointFilter, UpdatePostInput,
        UpdateServicePointInput,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

use super::common::{created, no_content, page_params, paginated, CreatedResult, NoContentResult};

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"status": "временно закрыта"}))]
pub struct ChangeStatusRequest {
    /// Canonical or legacy status value
    #[schema(value_type = String)]
    pub status: ServicePointStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceServicesRequest {
    pub services: Vec<AttachServiceInput>,
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points",
    params(ServicePointFilter),
    responses(
        (status = 200, description = "Service points listed", body = ApiResponse<PaginatedResponse<service_point::Model>>)
    ),
    tag = "service-points"
)]
pub async fn list_service_points(
    State(state): State<AppState>,
    Query(filter): Query<ServicePointFilter>,
) -> ApiResult<PaginatedResponse<service_point::Model>> {
    let (page, limit) = page_params(&state.config, filter.page, filter.limit);
    let (items, total) = state
        .services
        .service_points
        .list(&filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points/:id",
    params(("id" = Uuid, Path, description = "Service point ID")),
    responses(
        (status = 200, description = "Service point with posts, services and photos", body = ApiResponse<ServicePointDetail>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn get_service_point(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ServicePointDetail> {
    let detail = state.services.service_points.get_detail(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-points",
    request_body = CreateServicePointInput,
    responses(
        (status = 201, description = "Service point created", body = ApiResponse<service_point::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn create_service_point(
    State(state): State<AppState>,
    Json(payload): Json<CreateServicePointInput>,
) -> CreatedResult<service_point::Model> {
    payload.validate()?;
    let point = state.services.service_points.create(payload).await?;
    created(point)
}

#[utoipa::path(
    put,
    path = "/api/v1/service-points/:id",
    params(("id" = Uuid, Path, description = "Service point ID")),
    request_body = UpdateServicePointInput,
    responses(
        (status = 200, description = "Service point updated", body = ApiResponse<service_point::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn update_service_point(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServicePointInput>,
) -> ApiResult<service_point::Model> {
    payload.validate()?;
    let point = state.services.service_points.update(id, payload).await?;
    Ok(Json(ApiResponse::success(point)))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-points/:id/status",
    params(("id" = Uuid, Path, description = "Service point ID")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<service_point::Model>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn change_service_point_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusRequest>,
) -> ApiResult<service_point::Model> {
    let point = state
        .services
        .service_points
        .change_status(id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(point)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-points/:id",
    params(("id" = Uuid, Path, description = "Service point ID")),
    responses(
        (status = 204, description = "Service point soft-deleted"),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Service point has active bookings", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn delete_service_point(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> NoContentResult {
    state.services.service_points.soft_delete(id).await?;
    no_content()
}

#[utoipa::path(
    post,
    path = "/api/v1/service-points/:id/restore",
    params(("id" = Uuid, Path, description = "Service point ID")),
    responses(
        (status = 200, description = "Service point restored", body = ApiResponse<service_point::Model>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Service point is not deleted", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn restore_service_point(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<service_point::Model> {
    let point = state.services.service_points.restore(id).await?;
    Ok(Json(ApiResponse::success(point)))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points/:id/working-hours",
    params(("id" = Uuid, Path, description = "Service point ID")),
    responses(
        (status = 200, description = "Weekly working hours", body = ApiResponse<WorkingHours>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn get_working_hours(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkingHours> {
    let hours = state.services.service_points.working_hours(id).await?;
    Ok(Json(ApiResponse::success(hours)))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-points/:id/working-hours",
    params(("id" = Uuid, Path, description = "Service point ID")),
    request_body = WorkingHours,
    responses(
        (status = 200, description = "Working hours replaced", body = ApiResponse<WorkingHours>),
        (status = 400, description = "Invalid working hours", body = crate::errors::ErrorResponse),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn replace_working_hours(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WorkingHours>,
) -> ApiResult<WorkingHours> {
    let hours = state
        .services
        .service_points
        .replace_working_hours(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(hours)))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points/:id/posts",
    params(("id" = Uuid, Path, description = "Service point ID")),
    responses(
        (status = 200, description = "Posts ordered by number", body = ApiResponse<Vec<service_post::Model>>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<service_post::Model>> {
    state.services.service_points.get(id).await?;
    let posts = state.services.service_points.list_posts(id).await?;
    Ok(Json(ApiResponse::success(posts)))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-points/:id/posts",
    params(("id" = Uuid, Path, description = "Service point ID")),
    request_body = CreatePostInput,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<service_post::Model>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Post number already used", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn create_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePostInput>,
) -> CreatedResult<service_post::Model> {
    payload.validate()?;
    let post = state.services.service_points.create_post(id, payload).await?;
    created(post)
}

#[utoipa::path(
    put,
    path = "/api/v1/service-points/:id/posts/:post_id",
    params(
        ("id" = Uuid, Path, description = "Service point ID"),
        ("post_id" = Uuid, Path, description = "Post ID")
    ),
    request_body = UpdatePostInput,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<service_post::Model>),
        (status = 404, description = "Post not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Post number already used", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path((id, post_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdatePostInput>,
) -> ApiResult<service_post::Model> {
    payload.validate()?;
    let post = state
        .services
        .service_points
        .update_post(id, post_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(post)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-points/:id/posts/:post_id",
    params(
        ("id" = Uuid, Path, description = "Service point ID"),
        ("post_id" = Uuid, Path, description = "Post ID")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Post not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Post has bookings", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path((id, post_id)): Path<(Uuid, Uuid)>,
) -> NoContentResult {
    state.services.service_points.delete_post(id, post_id).await?;
    no_content()
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points/:id/services",
    params(("id" = Uuid, Path, description = "Service point ID")),
    responses(
        (status = 200, description = "Services offered with point comments", body = ApiResponse<Vec<OfferedService>>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn list_offered_services(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<OfferedService>> {
    state.services.service_points.get(id).await?;
    let services = state.services.service_points.list_services(id).await?;
    Ok(Json(ApiResponse::success(services)))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-points/:id/services",
    params(("id" = Uuid, Path, description = "Service point ID")),
    request_body = AttachServiceInput,
    responses(
        (status = 200, description = "Service attached or comment updated", body = ApiResponse<Vec<OfferedService>>),
        (status = 400, description = "Unknown service", body = crate::errors::ErrorResponse),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn attach_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachServiceInput>,
) -> ApiResult<Vec<OfferedService>> {
    payload.validate()?;
    let services = state
        .services
        .service_points
        .attach_service(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(services)))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-points/:id/services",
    params(("id" = Uuid, Path, description = "Service point ID")),
    request_body = ReplaceServicesRequest,
    responses(
        (status = 200, description = "Offered services replaced", body = ApiResponse<Vec<OfferedService>>),
        (status = 400, description = "Unknown service", body = crate::errors::ErrorResponse),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn replace_services(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplaceServicesRequest>,
) -> ApiResult<Vec<OfferedService>> {
    for entry in &payload.services {
        entry.validate()?;
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = payload.services.iter().find(|s| !seen.insert(s.service_id)) {
        return Err(ServiceError::ValidationError(format!(
            "Service {} is listed twice",
            dup.service_id
        )));
    }

    let services = state
        .services
        .service_points
        .replace_services(id, payload.services)
        .await?;
    Ok(Json(ApiResponse::success(services)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-points/:id/services/:service_id",
    params(
        ("id" = Uuid, Path, description = "Service point ID"),
        ("service_id" = Uuid, Path, description = "Catalog service ID")
    ),
    responses(
        (status = 204, description = "Service detached"),
        (status = 404, description = "Service not offered here", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn detach_service(
    State(state): State<AppState>,
    Path((id, service_id)): Path<(Uuid, Uuid)>,
) -> NoContentResult {
    state
        .services
        .service_points
        .detach_service(id, service_id)
        .await?;
    no_content()
}

#[utoipa::path(
    get,
    path = "/api/v1/service-points/:id/photos",
    params(("id" = Uuid, Path, description = "Service point ID")),
    responses(
        (status = 200, description = "Photos, main photo first", body = ApiResponse<Vec<service_point_photo::Model>>),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn list_photos(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<service_point_photo::Model>> {
    state.services.service_points.get(id).await?;
    let photos = state.services.service_points.list_photos(id).await?;
    Ok(Json(ApiResponse::success(photos)))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-points/:id/photos",
    params(("id" = Uuid, Path, description = "Service point ID")),
    request_body = AddPhotoInput,
    responses(
        (status = 201, description = "Photo added", body = ApiResponse<service_point_photo::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Service point not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn add_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddPhotoInput>,
) -> CreatedResult<service_point_photo::Model> {
    payload.validate()?;
    let photo = state.services.service_points.add_photo(id, payload).await?;
    created(photo)
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-points/:id/photos/:photo_id",
    params(
        ("id" = Uuid, Path, description = "Service point ID"),
        ("photo_id" = Uuid, Path, description = "Photo ID")
    ),
    responses(
        (status = 204, description = "Photo deleted"),
        (status = 404, description = "Photo not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn delete_photo(
    State(state): State<AppState>,
    Path((id, photo_id)): Path<(Uuid, Uuid)>,
) -> NoContentResult {
    state.services.service_points.delete_photo(id, photo_id).await?;
    no_content()
}

#[utoipa::path(
    put,
    path = "/api/v1/service-points/:id/photos/:photo_id/main",
    params(
        ("id" = Uuid, Path, description = "Service point ID"),
        ("photo_id" = Uuid, Path, description = "Photo ID")
    ),
    responses(
        (status = 200, description = "Main photo set", body = ApiResponse<service_point_photo::Model>),
        (status = 404, description = "Photo not found", body = crate::errors::ErrorResponse)
    ),
    tag = "service-points"
)]
pub async fn set_main_photo(
    State(state): State<AppState>,
    Path((id, photo_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<service_point_photo::Model> {
    let photo = state
        .services
        .service_points
        .set_main_photo(id, photo_id)
        .await?;
    Ok(Json(ApiResponse::success(photo)))
}
