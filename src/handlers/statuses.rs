use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{RawStatus, ServicePointStatus},
    ApiResponse, ApiResult,
};

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"status": "Временно закрыта"}))]
pub struct NormalizeStatusRequest {
    /// String, number or boolean in any supported spelling
    #[schema(value_type = Object)]
    pub status: RawStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NormalizedStatus {
    #[schema(value_type = Object)]
    pub input: RawStatus,
    pub status: ServicePointStatus,
    /// False when the input was unknown and the default was applied
    pub recognized: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/statuses/normalize",
    request_body = NormalizeStatusRequest,
    responses(
        (status = 200, description = "Canonical status", body = ApiResponse<NormalizedStatus>),
        (status = 400, description = "Malformed body", body = crate::errors::ErrorResponse)
    ),
    tag = "statuses"
)]
pub async fn normalize_status(
    Json(payload): Json<NormalizeStatusRequest>,
) -> ApiResult<NormalizedStatus> {
    let recognized = ServicePointStatus::recognize(&payload.status);
    Ok(Json(ApiResponse::success(NormalizedStatus {
        status: recognized.unwrap_or_default(),
        recognized: recognized.is_some(),
        input: payload.status,
    })))
}
