use axum::{http::StatusCode, response::Json};
use serde::Serialize;

use crate::{
    config::AppConfig, errors::ServiceError, services::total_pages, ApiResponse,
    PaginatedResponse,
};

/// Result of a handler that creates a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ServiceError>;

/// Result of a handler that answers with an empty 204.
pub type NoContentResult = Result<StatusCode, ServiceError>;

pub fn created<T: Serialize>(data: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

pub fn no_content() -> NoContentResult {
    Ok(StatusCode::NO_CONTENT)
}

/// Resolves `page`/`limit` query values against the configured page sizes.
pub fn page_params(config: &AppConfig, page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    (page.unwrap_or(1).max(1), config.page_size(limit))
}

/// Wraps one page of results with its totals.
pub fn paginated<T, U: From<T>>(
    items: Vec<T>,
    total: u64,
    page: u64,
    limit: u64,
) -> PaginatedResponse<U> {
    PaginatedResponse {
        items: items.into_iter().map(U::from).collect(),
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }
}
