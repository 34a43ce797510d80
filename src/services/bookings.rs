use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{booking, schedule, service_point_service},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{BookingStatus, ScheduleStatus},
};

use super::{db_error, schedules::find_slot, service_points::lock_live};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingFilter {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub service_point_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub status: Option<BookingStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Matches client name, phone or licence plate
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "schedule_id": "6b0d7f0e-3c55-4a43-8f86-2f3f7c8e9a10",
    "client_name": "Anna Smirnova",
    "client_phone": "+7 912 000-11-22",
    "car_brand": "Toyota",
    "car_model": "Camry",
    "license_plate": "A123BC116"
}))]
pub struct CreateBookingInput {
    pub schedule_id: Uuid,
    pub service_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub client_name: String,
    #[validate(length(min = 5, max = 32))]
    pub client_phone: String,
    #[validate(email)]
    pub client_email: Option<String>,
    #[validate(length(max = 64))]
    pub car_brand: Option<String>,
    #[validate(length(max = 64))]
    pub car_model: Option<String>,
    #[validate(length(max = 16))]
    pub license_plate: Option<String>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingInput {
    #[validate(length(min = 1, max = 255))]
    pub client_name: Option<String>,
    #[validate(length(min = 5, max = 32))]
    pub client_phone: Option<String>,
    #[validate(email)]
    pub client_email: Option<String>,
    #[validate(length(max = 64))]
    pub car_brand: Option<String>,
    #[validate(length(max = 64))]
    pub car_model: Option<String>,
    #[validate(length(max = 16))]
    pub license_plate: Option<String>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangeBookingStatusInput {
    pub status: BookingStatus,
}

/// Creates bookings and keeps their slots in step with the booking status.
#[derive(Clone)]
pub struct BookingService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl BookingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &BookingFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<booking::Model>, u64), ServiceError> {
        let mut query = booking::Entity::find();

        if let Some(point_id) = filter.service_point_id {
            query = query.filter(booking::Column::ServicePointId.eq(point_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(booking::Column::Status.eq(status));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(booking::Column::BookingDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(booking::Column::BookingDate.lte(to));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(booking::Column::ClientName.contains(search))
                    .add(booking::Column::ClientPhone.contains(search))
                    .add(booking::Column::LicensePlate.contains(search)),
            );
        }

        let paginator = query
            .order_by_desc(booking::Column::BookingDate)
            .order_by_desc(booking::Column::StartTime)
            .paginate(&*self.db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("count bookings"))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("list bookings"))?;

        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<booking::Model, ServiceError> {
        find_booking(&*self.db, id).await
    }

    /// Books a slot.
    ///
    /// The slot is claimed with a conditional update guarded on
    /// `status = available` in the same transaction as the insert, so of two
    /// concurrent requests for one slot exactly one succeeds. The point row is
    /// locked first so a soft delete cannot hide it mid-booking.
    #[instrument(skip(self, input), fields(schedule_id = %input.schedule_id))]
    pub async fn create(&self, input: CreateBookingInput) -> Result<booking::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;

        let slot = find_slot(&txn, input.schedule_id).await?;
        let point = lock_live(&txn, slot.service_point_id).await?;
        if !point.status.accepts_bookings() {
            return Err(ServiceError::InvalidTransition(format!(
                "Service point {} is {} and does not accept bookings",
                point.id, point.status
            )));
        }

        if let Some(service_id) = input.service_id {
            let offered = service_point_service::Entity::find_by_id((point.id, service_id))
                .one(&txn)
                .await
                .map_err(db_error("check offered service"))?;
            if offered.is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "Service {} is not offered by service point {}",
                    service_id, point.id
                )));
            }
        }

        let claimed = schedule::Entity::update_many()
            .col_expr(schedule::Column::Status, Expr::value(ScheduleStatus::Booked))
            .col_expr(schedule::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(schedule::Column::Id.eq(slot.id))
            .filter(schedule::Column::Status.eq(ScheduleStatus::Available))
            .exec(&txn)
            .await
            .map_err(db_error("claim slot"))?;
        if claimed.rows_affected != 1 {
            counter!("bookings.bookings.claim_rejected", 1);
            warn!(schedule_id = %slot.id, status = %slot.status, "Slot is not available");
            return Err(ServiceError::InvalidTransition(format!(
                "Slot {} is not available",
                slot.id
            )));
        }

        let model = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            schedule_id: Set(slot.id),
            service_point_id: Set(slot.service_point_id),
            service_id: Set(input.service_id),
            booking_date: Set(slot.date),
            start_time: Set(slot.start_time),
            end_time: Set(slot.end_time),
            client_name: Set(input.client_name.trim().to_string()),
            client_phone: Set(input.client_phone),
            client_email: Set(input.client_email),
            car_brand: Set(input.car_brand),
            car_model: Set(input.car_model),
            license_plate: Set(input.license_plate.map(|p| p.trim().to_uppercase())),
            comment: Set(input.comment),
            status: Set(BookingStatus::Pending),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_error("create booking"))?;

        txn.commit().await.map_err(db_error("commit transaction"))?;

        counter!("bookings.bookings.created", 1);
        info!(booking_id = %model.id, schedule_id = %slot.id, "Booking created");
        self.event_sender
            .send_or_log(Event::BookingCreated {
                booking_id: model.id,
                schedule_id: slot.id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::SlotStatusChanged {
                schedule_id: slot.id,
                old_status: ScheduleStatus::Available,
                new_status: ScheduleStatus::Booked,
            })
            .await;

        Ok(model)
    }

    /// Edits contact and vehicle details of a booking that is still active.
    #[instrument(skip(self, input))]
    pub async fn update_details(
        &self,
        id: Uuid,
        input: UpdateBookingInput,
    ) -> Result<booking::Model, ServiceError> {
        let existing = self.get(id).await?;
        if !existing.status.is_active() {
            return Err(ServiceError::InvalidTransition(format!(
                "Booking {} is {} and can no longer be edited",
                id, existing.status
            )));
        }

        let mut active: booking::ActiveModel = existing.into();
        if let Some(name) = input.client_name {
            active.client_name = Set(name.trim().to_string());
        }
        if let Some(phone) = input.client_phone {
            active.client_phone = Set(phone);
        }
        if input.client_email.is_some() {
            active.client_email = Set(input.client_email);
        }
        if input.car_brand.is_some() {
            active.car_brand = Set(input.car_brand);
        }
        if input.car_model.is_some() {
            active.car_model = Set(input.car_model);
        }
        if let Some(plate) = input.license_plate {
            active.license_plate = Set(Some(plate.trim().to_uppercase()));
        }
        if input.comment.is_some() {
            active.comment = Set(input.comment);
        }

        active
            .update(&*self.db)
            .await
            .map_err(db_error("update booking"))
    }

    /// Moves a booking to `status` and writes the matching slot status in the
    /// same transaction.
    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<booking::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;
        let existing = find_booking(&txn, id).await?;

        let old_status = existing.status;
        let new_status = old_status.transition_to(status)?;
        let now = Utc::now();

        let moved = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(new_status))
            .col_expr(booking::Column::UpdatedAt, Expr::value(now))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(old_status))
            .exec(&txn)
            .await
            .map_err(db_error("update booking status"))?;
        if moved.rows_affected != 1 {
            return Err(ServiceError::Conflict(format!(
                "Booking {} changed concurrently",
                id
            )));
        }

        let slot = find_slot(&txn, existing.schedule_id).await?;
        let slot_status = new_status.slot_status();
        schedule::Entity::update_many()
            .col_expr(schedule::Column::Status, Expr::value(slot_status))
            .col_expr(schedule::Column::UpdatedAt, Expr::value(now))
            .filter(schedule::Column::Id.eq(slot.id))
            .exec(&txn)
            .await
            .map_err(db_error("update slot status"))?;

        let updated = find_booking(&txn, id).await?;
        txn.commit().await.map_err(db_error("commit transaction"))?;

        counter!("bookings.bookings.status_changed", 1, "status" => new_status.to_string());
        info!(booking_id = %id, %old_status, %new_status, %slot_status, "Booking status changed");

        self.event_sender
            .send_or_log(Event::BookingStatusChanged {
                booking_id: id,
                old_status,
                new_status,
            })
            .await;
        if slot.status != slot_status {
            self.event_sender
                .send_or_log(Event::SlotStatusChanged {
                    schedule_id: slot.id,
                    old_status: slot.status,
                    new_status: slot_status,
                })
                .await;
        }

        Ok(updated)
    }

    /// Cancels the booking and frees its slot.
    pub async fn cancel(&self, id: Uuid) -> Result<booking::Model, ServiceError> {
        self.change_status(id, BookingStatus::Cancelled).await
    }
}

async fn find_booking<C>(db: &C, id: Uuid) -> Result<booking::Model, ServiceError>
where
    C: ConnectionTrait,
{
    booking::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(db_error("load booking"))?
        .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", id)))
}
