pub mod bookings;
pub mod common;
pub mod partners;
pub mod schedules;
pub mod service_points;
pub mod services;
pub mod statuses;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        bookings::BookingService, catalog::CatalogService, partners::PartnerService,
        schedules::ScheduleService, service_points::ServicePointService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub partners: Arc<PartnerService>,
    pub service_points: Arc<ServicePointService>,
    pub catalog: Arc<CatalogService>,
    pub schedules: Arc<ScheduleService>,
    pub bookings: Arc<BookingService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        Self {
            partners: Arc::new(PartnerService::new(db_pool.clone(), event_sender.clone())),
            service_points: Arc::new(ServicePointService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.default_slot_duration_minutes,
            )),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            schedules: Arc::new(ScheduleService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.max_schedule_days,
            )),
            bookings: Arc::new(BookingService::new(db_pool, event_sender)),
        }
    }
}
