use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::booking,
    services::bookings::{
        BookingFilter, ChangeBookingStatusInput, CreateBookingInput, UpdateBookingInput,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

use super::common::{created, page_params, paginated, CreatedResult};

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    params(BookingFilter),
    responses(
        (status = 200, description = "Bookings listed, newest first", body = ApiResponse<PaginatedResponse<booking::Model>>)
    ),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> ApiResult<PaginatedResponse<booking::Model>> {
    let (page, limit) = page_params(&state.config, filter.page, filter.limit);
    let (items, total) = state.services.bookings.list(&filter, page, limit).await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/:id",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking fetched", body = ApiResponse<booking::Model>),
        (status = 404, description = "Booking not found", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<booking::Model> {
    let booking = state.services.bookings.get(id).await?;
    Ok(Json(ApiResponse::success(booking)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingInput,
    responses(
        (status = 201, description = "Slot booked", body = ApiResponse<booking::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Slot not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Slot not available or point not accepting bookings", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingInput>,
) -> CreatedResult<booking::Model> {
    payload.validate()?;
    let booking = state.services.bookings.create(payload).await?;
    created(booking)
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/:id",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingInput,
    responses(
        (status = 200, description = "Booking details updated", body = ApiResponse<booking::Model>),
        (status = 404, description = "Booking not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Booking already finished", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingInput>,
) -> ApiResult<booking::Model> {
    payload.validate()?;
    let booking = state.services.bookings.update_details(id, payload).await?;
    Ok(Json(ApiResponse::success(booking)))
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/:id/status",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = ChangeBookingStatusInput,
    responses(
        (status = 200, description = "Booking status changed together with its slot", body = ApiResponse<booking::Model>),
        (status = 404, description = "Booking not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Transition not allowed", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn change_booking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeBookingStatusInput>,
) -> ApiResult<booking::Model> {
    let booking = state
        .services
        .bookings
        .change_status(id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(booking)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/:id/cancel",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled, slot available again", body = ApiResponse<booking::Model>),
        (status = 404, description = "Booking not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Booking already finished", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<booking::Model> {
    let booking = state.services.bookings.cancel(id).await?;
    Ok(Json(ApiResponse::success(booking)))
}
