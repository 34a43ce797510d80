use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        booking, partner, schedule, service, service_point, service_point_photo,
        service_point_service, service_post,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{BookingStatus, ServicePointStatus, WorkingHours, MAX_SLOT_DURATION_MINUTES},
};

use super::db_error;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServicePointFilter {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub partner_id: Option<Uuid>,
    pub city: Option<String>,
    /// Accepts canonical and legacy spellings
    #[param(value_type = Option<String>)]
    pub status: Option<ServicePointStatus>,
    /// Matches name or address
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "partner_id": "3f1c2b9a-6a1e-4d8e-9a63-1d2f9b0c7e11",
    "name": "Tyre centre on Lenina",
    "address": "Lenina st. 12",
    "city": "Kazan",
    "status": "работает",
    "working_hours": {
        "monday": {"start": "09:00", "end": "18:00", "is_working_day": true},
        "sunday": {"is_working_day": false}
    }
}))]
pub struct CreateServicePointInput {
    pub partner_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(length(min = 1, max = 120))]
    pub city: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,
    /// Canonical or legacy status; defaults to active
    #[schema(value_type = Option<String>, example = "active")]
    pub status: Option<ServicePointStatus>,
    #[serde(default)]
    pub working_hours: WorkingHours,
    #[validate(url)]
    pub price_list_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateServicePointInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub city: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,
    #[schema(value_type = Option<String>, example = "suspended")]
    pub status: Option<ServicePointStatus>,
    pub working_hours: Option<WorkingHours>,
    #[validate(url)]
    pub price_list_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Next free number when omitted
    #[validate(range(min = 1))]
    pub post_number: Option<i32>,
    #[validate(range(min = 1, max = 1440))]
    pub slot_duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub post_number: Option<i32>,
    #[validate(range(min = 1, max = 1440))]
    pub slot_duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AttachServiceInput {
    pub service_id: Uuid,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddPhotoInput {
    #[validate(url)]
    pub url: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub is_main: bool,
}

/// A catalog service as offered by one point.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OfferedService {
    #[schema(inline)]
    pub service: service::Model,
    pub comment: Option<String>,
}

/// A service point with its posts, services and photos.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServicePointDetail {
    #[serde(flatten)]
    #[schema(inline)]
    pub point: service_point::Model,
    pub posts: Vec<service_post::Model>,
    pub services: Vec<OfferedService>,
    pub photos: Vec<service_point_photo::Model>,
}

#[derive(Clone)]
pub struct ServicePointService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_slot_duration_minutes: u32,
}

impl ServicePointService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_slot_duration_minutes: u32,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_slot_duration_minutes: default_slot_duration_minutes
                .clamp(1, MAX_SLOT_DURATION_MINUTES),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ServicePointFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<service_point::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut query =
            service_point::Entity::find().filter(service_point::Column::DeletedAt.is_null());

        if let Some(partner_id) = filter.partner_id {
            query = query.filter(service_point::Column::PartnerId.eq(partner_id));
        }
        if let Some(city) = filter.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            query = query.filter(service_point::Column::City.eq(city));
        }
        if let Some(status) = filter.status {
            query = query.filter(service_point::Column::Status.eq(status));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(service_point::Column::Name.contains(search))
                    .add(service_point::Column::Address.contains(search)),
            );
        }

        let paginator = query
            .order_by_asc(service_point::Column::City)
            .order_by_asc(service_point::Column::Name)
            .paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("count service points"))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("list service points"))?;

        Ok((items, total))
    }

    /// Loads a live (not soft-deleted) service point.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<service_point::Model, ServiceError> {
        find_live(&*self.db, id).await
    }

    #[instrument(skip(self))]
    pub async fn get_detail(&self, id: Uuid) -> Result<ServicePointDetail, ServiceError> {
        let point = self.get(id).await?;
        let posts = self.list_posts(id).await?;
        let services = self.list_services(id).await?;
        let photos = self.list_photos(id).await?;

        Ok(ServicePointDetail {
            point,
            posts,
            services,
            photos,
        })
    }

    #[instrument(skip(self, input), fields(partner_id = %input.partner_id))]
    pub async fn create(
        &self,
        input: CreateServicePointInput,
    ) -> Result<service_point::Model, ServiceError> {
        input
            .working_hours
            .check()
            .map_err(ServiceError::ValidationError)?;

        let db = &*self.db;
        partner::Entity::find_by_id(input.partner_id)
            .one(db)
            .await
            .map_err(db_error("load partner"))?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Partner {} does not exist", input.partner_id))
            })?;

        let model = service_point::ActiveModel {
            id: Set(Uuid::new_v4()),
            partner_id: Set(input.partner_id),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            address: Set(input.address),
            city: Set(input.city.trim().to_string()),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            contact_phone: Set(input.contact_phone),
            status: Set(input.status.unwrap_or_default()),
            working_hours: Set(input.working_hours),
            price_list_url: Set(input.price_list_url),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(db_error("create service point"))?;

        counter!("bookings.service_points.created", 1);
        info!(service_point_id = %model.id, "Service point created");
        self.event_sender
            .send_or_log(Event::ServicePointCreated {
                service_point_id: model.id,
                partner_id: model.partner_id,
            })
            .await;

        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateServicePointInput,
    ) -> Result<service_point::Model, ServiceError> {
        if let Some(hours) = &input.working_hours {
            hours.check().map_err(ServiceError::ValidationError)?;
        }

        let existing = self.get(id).await?;
        let old_status = existing.status;
        let mut active: service_point::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if input.description.is_some() {
            active.description = Set(input.description);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }
        if let Some(city) = input.city {
            active.city = Set(city.trim().to_string());
        }
        if input.latitude.is_some() {
            active.latitude = Set(input.latitude);
        }
        if input.longitude.is_some() {
            active.longitude = Set(input.longitude);
        }
        if input.contact_phone.is_some() {
            active.contact_phone = Set(input.contact_phone);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(hours) = input.working_hours {
            active.working_hours = Set(hours);
        }
        if input.price_list_url.is_some() {
            active.price_list_url = Set(input.price_list_url);
        }

        let updated = active
            .update(&*self.db)
            .await
            .map_err(db_error("update service point"))?;

        if updated.status != old_status {
            self.publish_status_change(id, old_status, updated.status)
                .await;
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: Uuid,
        status: ServicePointStatus,
    ) -> Result<service_point::Model, ServiceError> {
        let existing = self.get(id).await?;
        let old_status = existing.status;
        if old_status == status {
            return Ok(existing);
        }

        let mut active: service_point::ActiveModel = existing.into();
        active.status = Set(status);
        let updated = active
            .update(&*self.db)
            .await
            .map_err(db_error("change service point status"))?;

        info!(service_point_id = %id, %old_status, new_status = %status, "Service point status changed");
        self.publish_status_change(id, old_status, status).await;
        Ok(updated)
    }

    async fn publish_status_change(
        &self,
        id: Uuid,
        old_status: ServicePointStatus,
        new_status: ServicePointStatus,
    ) {
        self.event_sender
            .send_or_log(Event::ServicePointStatusChanged {
                service_point_id: id,
                old_status,
                new_status,
            })
            .await;
    }

    /// Soft-deletes a point. Refused while it holds pending or confirmed bookings.
    ///
    /// The `deleted_at` write comes first so the point row stays locked while
    /// bookings are counted; a booking racing in through [`lock_live`] either
    /// commits before the count or finds the point gone.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;

        let hidden = service_point::Entity::update_many()
            .col_expr(service_point::Column::DeletedAt, Expr::value(Some(Utc::now())))
            .col_expr(service_point::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(service_point::Column::Id.eq(id))
            .filter(service_point::Column::DeletedAt.is_null())
            .exec(&txn)
            .await
            .map_err(db_error("soft delete service point"))?;
        if hidden.rows_affected != 1 {
            return Err(ServiceError::NotFound(format!(
                "Service point {} not found",
                id
            )));
        }

        let active_bookings = booking::Entity::find()
            .filter(booking::Column::ServicePointId.eq(id))
            .filter(
                booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]),
            )
            .count(&txn)
            .await
            .map_err(db_error("count active bookings"))?;
        if active_bookings > 0 {
            return Err(ServiceError::Conflict(format!(
                "Service point {} has {} active booking(s)",
                id, active_bookings
            )));
        }

        txn.commit().await.map_err(db_error("commit transaction"))?;

        info!(service_point_id = %id, "Service point soft-deleted");
        self.event_sender
            .send_or_log(Event::ServicePointDeleted(id))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, id: Uuid) -> Result<service_point::Model, ServiceError> {
        let existing = service_point::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(db_error("load service point"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Service point {} not found", id)))?;
        if !existing.is_deleted() {
            return Err(ServiceError::InvalidTransition(format!(
                "Service point {} is not deleted",
                id
            )));
        }

        let mut active: service_point::ActiveModel = existing.into();
        active.deleted_at = Set(None);
        let restored = active
            .update(&*self.db)
            .await
            .map_err(db_error("restore service point"))?;

        info!(service_point_id = %id, "Service point restored");
        self.event_sender
            .send_or_log(Event::ServicePointRestored(id))
            .await;
        Ok(restored)
    }

    pub async fn working_hours(&self, id: Uuid) -> Result<WorkingHours, ServiceError> {
        Ok(self.get(id).await?.working_hours)
    }

    #[instrument(skip(self, hours))]
    pub async fn replace_working_hours(
        &self,
        id: Uuid,
        hours: WorkingHours,
    ) -> Result<WorkingHours, ServiceError> {
        hours.check().map_err(ServiceError::ValidationError)?;
        let existing = self.get(id).await?;

        let mut active: service_point::ActiveModel = existing.into();
        active.working_hours = Set(hours);
        let updated = active
            .update(&*self.db)
            .await
            .map_err(db_error("update working hours"))?;
        Ok(updated.working_hours)
    }

    // ----- posts -----

    pub async fn list_posts(&self, point_id: Uuid) -> Result<Vec<service_post::Model>, ServiceError> {
        service_post::Entity::find()
            .filter(service_post::Column::ServicePointId.eq(point_id))
            .order_by_asc(service_post::Column::PostNumber)
            .all(&*self.db)
            .await
            .map_err(db_error("list service posts"))
    }

    #[instrument(skip(self, input))]
    pub async fn create_post(
        &self,
        point_id: Uuid,
        input: CreatePostInput,
    ) -> Result<service_post::Model, ServiceError> {
        self.get(point_id).await?;
        let db = &*self.db;

        let post_number = match input.post_number {
            Some(number) => {
                ensure_post_number_free(db, point_id, number, None).await?;
                number
            }
            None => {
                let max: Option<Option<i32>> = service_post::Entity::find()
                    .select_only()
                    .column_as(service_post::Column::PostNumber.max(), "max_number")
                    .filter(service_post::Column::ServicePointId.eq(point_id))
                    .into_tuple()
                    .one(db)
                    .await
                    .map_err(db_error("find next post number"))?;
                max.flatten().unwrap_or(0) + 1
            }
        };

        let duration = input
            .slot_duration_minutes
            .unwrap_or(self.default_slot_duration_minutes as i32);

        service_post::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_point_id: Set(point_id),
            name: Set(input.name.trim().to_string()),
            post_number: Set(post_number),
            slot_duration_minutes: Set(duration),
            is_active: Set(input.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(db_error("create service post"))
    }

    #[instrument(skip(self, input))]
    pub async fn update_post(
        &self,
        point_id: Uuid,
        post_id: Uuid,
        input: UpdatePostInput,
    ) -> Result<service_post::Model, ServiceError> {
        let db = &*self.db;
        let post = find_post(db, point_id, post_id).await?;

        if let Some(number) = input.post_number {
            if number != post.post_number {
                ensure_post_number_free(db, point_id, number, Some(post_id)).await?;
            }
        }

        let mut active: service_post::ActiveModel = post.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(number) = input.post_number {
            active.post_number = Set(number);
        }
        if let Some(duration) = input.slot_duration_minutes {
            active.slot_duration_minutes = Set(duration);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        active
            .update(db)
            .await
            .map_err(db_error("update service post"))
    }

    /// Removes a post and its never-booked slots.
    ///
    /// A booking that lands between the check and the delete trips the
    /// bookings foreign key, which `db_error` reports as a conflict.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, point_id: Uuid, post_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;
        let post = find_post(&txn, point_id, post_id).await?;

        let booked = booking::Entity::find()
            .inner_join(schedule::Entity)
            .filter(schedule::Column::ServicePostId.eq(post.id))
            .count(&txn)
            .await
            .map_err(db_error("count post bookings"))?;
        if booked > 0 {
            return Err(ServiceError::Conflict(format!(
                "Post {} has {} booking(s); deactivate it instead",
                post_id, booked
            )));
        }

        schedule::Entity::delete_many()
            .filter(schedule::Column::ServicePostId.eq(post.id))
            .exec(&txn)
            .await
            .map_err(db_error("delete post slots"))?;
        service_post::Entity::delete_by_id(post.id)
            .exec(&txn)
            .await
            .map_err(db_error("delete service post"))?;
        txn.commit().await.map_err(db_error("commit transaction"))?;

        info!(service_post_id = %post_id, "Service post deleted");
        Ok(())
    }

    // ----- offered services -----

    pub async fn list_services(&self, point_id: Uuid) -> Result<Vec<OfferedService>, ServiceError> {
        let links = service_point_service::Entity::find()
            .filter(service_point_service::Column::ServicePointId.eq(point_id))
            .find_also_related(service::Entity)
            .all(&*self.db)
            .await
            .map_err(db_error("list offered services"))?;

        let mut offered: Vec<OfferedService> = links
            .into_iter()
            .filter_map(|(link, service)| {
                service.map(|service| OfferedService {
                    service,
                    comment: link.comment,
                })
            })
            .collect();
        offered.sort_by(|a, b| a.service.name.cmp(&b.service.name));
        Ok(offered)
    }

    /// Attaches a service or replaces the comment of an existing link.
    #[instrument(skip(self, input), fields(service_id = %input.service_id))]
    pub async fn attach_service(
        &self,
        point_id: Uuid,
        input: AttachServiceInput,
    ) -> Result<Vec<OfferedService>, ServiceError> {
        self.get(point_id).await?;
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;
        upsert_link(&txn, point_id, input).await?;
        txn.commit().await.map_err(db_error("commit transaction"))?;

        self.list_services(point_id).await
    }

    /// Replaces the whole set of offered services in one transaction.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn replace_services(
        &self,
        point_id: Uuid,
        inputs: Vec<AttachServiceInput>,
    ) -> Result<Vec<OfferedService>, ServiceError> {
        self.get(point_id).await?;
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;

        service_point_service::Entity::delete_many()
            .filter(service_point_service::Column::ServicePointId.eq(point_id))
            .exec(&txn)
            .await
            .map_err(db_error("clear offered services"))?;
        for input in inputs {
            upsert_link(&txn, point_id, input).await?;
        }

        txn.commit().await.map_err(db_error("commit transaction"))?;
        self.list_services(point_id).await
    }

    #[instrument(skip(self))]
    pub async fn detach_service(&self, point_id: Uuid, service_id: Uuid) -> Result<(), ServiceError> {
        self.get(point_id).await?;
        let result = service_point_service::Entity::delete_by_id((point_id, service_id))
            .exec(&*self.db)
            .await
            .map_err(db_error("detach service"))?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Service {} is not offered by service point {}",
                service_id, point_id
            )));
        }
        Ok(())
    }

    // ----- photos -----

    pub async fn list_photos(
        &self,
        point_id: Uuid,
    ) -> Result<Vec<service_point_photo::Model>, ServiceError> {
        service_point_photo::Entity::find()
            .filter(service_point_photo::Column::ServicePointId.eq(point_id))
            .order_by_desc(service_point_photo::Column::IsMain)
            .order_by_asc(service_point_photo::Column::SortOrder)
            .order_by_asc(service_point_photo::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(db_error("list photos"))
    }

    /// Adds a photo. The first photo of a point becomes its main photo.
    #[instrument(skip(self, input))]
    pub async fn add_photo(
        &self,
        point_id: Uuid,
        input: AddPhotoInput,
    ) -> Result<service_point_photo::Model, ServiceError> {
        self.get(point_id).await?;
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;

        let existing = service_point_photo::Entity::find()
            .filter(service_point_photo::Column::ServicePointId.eq(point_id))
            .count(&txn)
            .await
            .map_err(db_error("count photos"))?;
        let is_main = input.is_main || existing == 0;
        if is_main {
            clear_main_photo(&txn, point_id).await?;
        }

        let photo = service_point_photo::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_point_id: Set(point_id),
            url: Set(input.url),
            description: Set(input.description),
            sort_order: Set(input.sort_order.unwrap_or(existing as i32)),
            is_main: Set(is_main),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(db_error("add photo"))?;

        txn.commit().await.map_err(db_error("commit transaction"))?;
        Ok(photo)
    }

    /// Deletes a photo; if it was the main one the next photo takes over.
    #[instrument(skip(self))]
    pub async fn delete_photo(&self, point_id: Uuid, photo_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;
        let photo = find_photo(&txn, point_id, photo_id).await?;

        service_point_photo::Entity::delete_by_id(photo.id)
            .exec(&txn)
            .await
            .map_err(db_error("delete photo"))?;

        if photo.is_main {
            let next = service_point_photo::Entity::find()
                .filter(service_point_photo::Column::ServicePointId.eq(point_id))
                .order_by_asc(service_point_photo::Column::SortOrder)
                .order_by_asc(service_point_photo::Column::CreatedAt)
                .one(&txn)
                .await
                .map_err(db_error("find next main photo"))?;
            if let Some(next) = next {
                let mut active: service_point_photo::ActiveModel = next.into();
                active.is_main = Set(true);
                active
                    .update(&txn)
                    .await
                    .map_err(db_error("promote main photo"))?;
            }
        }

        txn.commit().await.map_err(db_error("commit transaction"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_main_photo(
        &self,
        point_id: Uuid,
        photo_id: Uuid,
    ) -> Result<service_point_photo::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;
        let photo = find_photo(&txn, point_id, photo_id).await?;

        clear_main_photo(&txn, point_id).await?;
        let mut active: service_point_photo::ActiveModel = photo.into();
        active.is_main = Set(true);
        let updated = active
            .update(&txn)
            .await
            .map_err(db_error("set main photo"))?;

        txn.commit().await.map_err(db_error("commit transaction"))?;
        Ok(updated)
    }
}

/// Loads a service point that has not been soft-deleted.
pub(crate) async fn find_live<C>(db: &C, id: Uuid) -> Result<service_point::Model, ServiceError>
where
    C: sea_orm::ConnectionTrait,
{
    service_point::Entity::find_by_id(id)
        .filter(service_point::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(db_error("load service point"))?
        .ok_or_else(|| ServiceError::NotFound(format!("Service point {} not found", id)))
}

/// Re-reads a live point after taking its row lock for the rest of the
/// transaction, so a concurrent soft delete cannot slip past the caller.
pub(crate) async fn lock_live<C>(db: &C, id: Uuid) -> Result<service_point::Model, ServiceError>
where
    C: sea_orm::ConnectionTrait,
{
    let touched = service_point::Entity::update_many()
        .col_expr(service_point::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(service_point::Column::Id.eq(id))
        .filter(service_point::Column::DeletedAt.is_null())
        .exec(db)
        .await
        .map_err(db_error("lock service point"))?;
    if touched.rows_affected != 1 {
        return Err(ServiceError::NotFound(format!(
            "Service point {} not found",
            id
        )));
    }
    find_live(db, id).await
}

async fn find_post<C>(
    db: &C,
    point_id: Uuid,
    post_id: Uuid,
) -> Result<service_post::Model, ServiceError>
where
    C: sea_orm::ConnectionTrait,
{
    service_post::Entity::find_by_id(post_id)
        .filter(service_post::Column::ServicePointId.eq(point_id))
        .one(db)
        .await
        .map_err(db_error("load service post"))?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Post {} not found at service point {}",
                post_id, point_id
            ))
        })
}

async fn ensure_post_number_free(
    db: &DatabaseConnection,
    point_id: Uuid,
    number: i32,
    except: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = service_post::Entity::find()
        .filter(service_post::Column::ServicePointId.eq(point_id))
        .filter(service_post::Column::PostNumber.eq(number));
    if let Some(except) = except {
        query = query.filter(service_post::Column::Id.ne(except));
    }
    let taken = query
        .count(db)
        .await
        .map_err(db_error("check post number"))?;
    if taken > 0 {
        warn!(service_point_id = %point_id, post_number = number, "Post number already taken");
        return Err(ServiceError::Conflict(format!(
            "Post number {} is already used at service point {}",
            number, point_id
        )));
    }
    Ok(())
}

async fn upsert_link(
    txn: &DatabaseTransaction,
    point_id: Uuid,
    input: AttachServiceInput,
) -> Result<(), ServiceError> {
    service::Entity::find_by_id(input.service_id)
        .one(txn)
        .await
        .map_err(db_error("load service"))?
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("Service {} does not exist", input.service_id))
        })?;

    let existing = service_point_service::Entity::find_by_id((point_id, input.service_id))
        .one(txn)
        .await
        .map_err(db_error("load service link"))?;

    match existing {
        Some(link) => {
            let mut active: service_point_service::ActiveModel = link.into();
            active.comment = Set(input.comment);
            active
                .update(txn)
                .await
                .map_err(db_error("update service link"))?;
        }
        None => {
            service_point_service::ActiveModel {
                service_point_id: Set(point_id),
                service_id: Set(input.service_id),
                comment: Set(input.comment),
                created_at: Set(Utc::now()),
            }
            .insert(txn)
            .await
            .map_err(db_error("attach service"))?;
        }
    }
    Ok(())
}

async fn find_photo(
    txn: &DatabaseTransaction,
    point_id: Uuid,
    photo_id: Uuid,
) -> Result<service_point_photo::Model, ServiceError> {
    service_point_photo::Entity::find_by_id(photo_id)
        .filter(service_point_photo::Column::ServicePointId.eq(point_id))
        .one(txn)
        .await
        .map_err(db_error("load photo"))?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Photo {} not found at service point {}",
                photo_id, point_id
            ))
        })
}

async fn clear_main_photo(txn: &DatabaseTransaction, point_id: Uuid) -> Result<(), ServiceError> {
    service_point_photo::Entity::update_many()
        .col_expr(service_point_photo::Column::IsMain, Expr::value(false))
        .filter(service_point_photo::Column::ServicePointId.eq(point_id))
        .filter(service_point_photo::Column::IsMain.eq(true))
        .exec(txn)
        .await
        .map_err(db_error("clear main photo"))?;
    Ok(())
}
