use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookings API",
        version = "0.3.0",
        description = r#"
# Service point booking API

Partners register service points with working hours, service posts and
offered services. Schedule slots are generated from working hours and
booked by clients.

## Slots and bookings

- A slot is `available`, `booked`, `completed` or `cancelled`.
- Creating a booking claims an available slot atomically; a slot that is
  no longer available answers `422`.
- Booking status drives the slot: pending/confirmed keep it `booked`,
  completed marks it `completed`, cancelled makes it `available` again.

## Legacy status values

Service point statuses accept legacy spellings (`работает`, `1`, `true`,
`временно закрыта`...). They are normalized to `active`, `suspended` or
`closed`. `POST /api/v1/statuses/normalize` shows the mapping.

## Error Handling

Errors share one body format:

```json
{
  "error": "Conflict",
  "message": "Post number 1 is already used at service point ...",
  "request_id": "9f1c...",
  "timestamp": "2024-06-03T09:00:00Z"
}
```

## Pagination

List endpoints take `page` (default 1) and `limit` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "partners", description = "Partners operating service points"),
        (name = "service-points", description = "Service points, working hours, posts, offered services and photos"),
        (name = "services", description = "Service catalog"),
        (name = "schedules", description = "Schedule generation, preview and slot transitions"),
        (name = "bookings", description = "Booking lifecycle"),
        (name = "statuses", description = "Legacy status normalization")
    ),
    paths(
        // Partners
        crate::handlers::partners::list_partners,
        crate::handlers::partners::get_partner,
        crate::handlers::partners::create_partner,
        crate::handlers::partners::update_partner,
        crate::handlers::partners::delete_partner,
        crate::handlers::partners::list_partner_service_points,

        // Service points
        crate::handlers::service_points::list_service_points,
        crate::handlers::service_points::get_service_point,
        crate::handlers::service_points::create_service_point,
        crate::handlers::service_points::update_service_point,
        crate::handlers::service_points::change_service_point_status,
        crate::handlers::service_points::delete_service_point,
        crate::handlers::service_points::restore_service_point,
        crate::handlers::service_points::get_working_hours,
        crate::handlers::service_points::replace_working_hours,
        crate::handlers::service_points::list_posts,
        crate::handlers::service_points::create_post,
        crate::handlers::service_points::update_post,
        crate::handlers::service_points::delete_post,
        crate::handlers::service_points::list_offered_services,
        crate::handlers::service_points::attach_service,
        crate::handlers::service_points::replace_services,
        crate::handlers::service_points::detach_service,
        crate::handlers::service_points::list_photos,
        crate::handlers::service_points::add_photo,
        crate::handlers::service_points::delete_photo,
        crate::handlers::service_points::set_main_photo,

        // Catalog
        crate::handlers::services::list_services,
        crate::handlers::services::get_service,
        crate::handlers::services::create_service,
        crate::handlers::services::update_service,
        crate::handlers::services::delete_service,

        // Schedules
        crate::handlers::schedules::generate_schedule,
        crate::handlers::schedules::preview_schedule,
        crate::handlers::schedules::list_slots,
        crate::handlers::schedules::available_slots,
        crate::handlers::schedules::get_slot,
        crate::handlers::schedules::transition_slot,

        // Bookings
        crate::handlers::bookings::list_bookings,
        crate::handlers::bookings::get_booking,
        crate::handlers::bookings::create_booking,
        crate::handlers::bookings::update_booking,
        crate::handlers::bookings::change_booking_status,
        crate::handlers::bookings::cancel_booking,

        // Statuses
        crate::handlers::statuses::normalize_status,
    ),
    components(
        schemas(
            crate::entities::partner::Model,
            crate::entities::service_point::Model,
            crate::entities::service_post::Model,
            crate::entities::service::Model,
            crate::entities::service_point_photo::Model,
            crate::entities::schedule::Model,
            crate::entities::booking::Model,
            crate::models::ServicePointStatus,
            crate::models::ScheduleStatus,
            crate::models::BookingStatus,
            crate::models::SlotAction,
            crate::models::SlotWindow,
            crate::models::DayPlan,
            crate::models::PlannedSlot,
            crate::models::WorkingHours,
            crate::models::DayHours,
            crate::services::service_points::OfferedService,
            crate::services::service_points::ServicePointDetail,
            crate::services::schedules::GenerationReport,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_booking_routes() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Bookings API"));
        assert!(json.contains("/api/v1/bookings"));
        assert!(json.contains("/api/v1/service-points/:id/schedule/generate"));
        assert!(json.contains("ServicePoint"));
    }
}
