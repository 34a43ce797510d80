use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use metrics::{counter, histogram};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{booking, schedule, service_point, service_post},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{plan_day, BookingStatus, DayPlan, PostSpec, ScheduleStatus, SlotAction},
};

use super::{db_error, service_points::find_live};

const INSERT_CHUNK: usize = 100;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "start_date": "2024-06-03",
    "end_date": "2024-06-09",
    "slot_duration_minutes": 30
}))]
pub struct GenerateScheduleInput {
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    /// Overrides every post's own slot length
    #[validate(range(min = 1, max = 1440))]
    pub slot_duration_minutes: Option<u32>,
    /// Restricts generation to these posts
    pub post_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerationReport {
    pub service_point_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created: u64,
    pub skipped: u64,
    pub days: u32,
    pub working_days: u32,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleFilter {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    #[param(value_type = Option<String>)]
    pub status: Option<ScheduleStatus>,
    pub post_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewQuery {
    pub date: NaiveDate,
    pub slot_duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailableQuery {
    pub date: NaiveDate,
}

/// Generates, lists and transitions schedule slots.
#[derive(Clone)]
pub struct ScheduleService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    max_schedule_days: u32,
}

impl ScheduleService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        max_schedule_days: u32,
    ) -> Self {
        Self {
            db,
            event_sender,
            max_schedule_days,
        }
    }

    /// Materializes slots for every active post over `[start_date, end_date]`.
    ///
    /// Runs in one transaction. Slots that already exist are counted as
    /// skipped; the unique `(post, date, start)` index rejects a concurrent
    /// duplicate, which surfaces as a conflict.
    #[instrument(skip(self, input), fields(start = %input.start_date, end = %input.end_date))]
    pub async fn generate(
        &self,
        point_id: Uuid,
        input: GenerateScheduleInput,
    ) -> Result<GenerationReport, ServiceError> {
        let days = check_range(input.start_date, input.end_date, self.max_schedule_days)?;
        let started = std::time::Instant::now();

        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;

        let point = find_live(&txn, point_id).await?;
        ensure_accepts_bookings(&point)?;
        let posts = load_posts(&txn, point_id, input.post_ids.as_deref()).await?;
        if posts.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Service point {} has no active posts",
                point_id
            )));
        }
        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let existing: HashSet<(Uuid, NaiveDate, NaiveTime)> = schedule::Entity::find()
            .select_only()
            .column(schedule::Column::ServicePostId)
            .column(schedule::Column::Date)
            .column(schedule::Column::StartTime)
            .filter(schedule::Column::ServicePostId.is_in(post_ids))
            .filter(schedule::Column::Date.between(input.start_date, input.end_date))
            .into_tuple::<(Uuid, NaiveDate, NaiveTime)>()
            .all(&txn)
            .await
            .map_err(db_error("load existing slots"))?
            .into_iter()
            .collect();

        let now = Utc::now();
        let mut pending = Vec::new();
        let mut skipped = 0u64;
        let mut working_days = 0u32;

        for date in input
            .start_date
            .iter_days()
            .take_while(|d| *d <= input.end_date)
        {
            let plan = plan_day(&point.working_hours, date, &posts, input.slot_duration_minutes)?;
            if plan.is_working_day {
                working_days += 1;
            }
            for post in plan.posts {
                for window in post.slots {
                    if existing.contains(&(post.post_id, date, window.start)) {
                        skipped += 1;
                        continue;
                    }
                    pending.push(schedule::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        service_point_id: Set(point_id),
                        service_post_id: Set(post.post_id),
                        date: Set(date),
                        start_time: Set(window.start),
                        end_time: Set(window.end),
                        status: Set(ScheduleStatus::Available),
                        created_at: Set(now),
                        updated_at: Set(now),
                    });
                }
            }
        }

        let created = pending.len() as u64;
        while !pending.is_empty() {
            let rest = pending.split_off(pending.len().min(INSERT_CHUNK));
            schedule::Entity::insert_many(std::mem::replace(&mut pending, rest))
                .exec_without_returning(&txn)
                .await
                .map_err(db_error("insert slots"))?;
        }

        txn.commit().await.map_err(db_error("commit transaction"))?;

        counter!("bookings.schedules.slots_created", created);
        histogram!(
            "bookings.schedules.generate_seconds",
            started.elapsed().as_secs_f64()
        );
        info!(service_point_id = %point_id, created, skipped, days, "Schedule generated");

        self.event_sender
            .send_or_log(Event::ScheduleGenerated {
                service_point_id: point_id,
                start_date: input.start_date,
                end_date: input.end_date,
                created,
                skipped,
            })
            .await;

        Ok(GenerationReport {
            service_point_id: point_id,
            start_date: input.start_date,
            end_date: input.end_date,
            created,
            skipped,
            days,
            working_days,
        })
    }

    /// The slot grid generation would produce for `date`, without writing it.
    #[instrument(skip(self))]
    pub async fn preview(
        &self,
        point_id: Uuid,
        date: NaiveDate,
        duration_override: Option<u32>,
    ) -> Result<DayPlan, ServiceError> {
        let db = &*self.db;
        let point = find_live(db, point_id).await?;
        let posts = load_posts(db, point_id, None).await?;
        Ok(plan_day(&point.working_hours, date, &posts, duration_override)?)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        point_id: Uuid,
        filter: &ScheduleFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<schedule::Model>, u64), ServiceError> {
        let db = &*self.db;
        find_live(db, point_id).await?;

        let mut query =
            schedule::Entity::find().filter(schedule::Column::ServicePointId.eq(point_id));
        if let Some(from) = filter.date_from {
            query = query.filter(schedule::Column::Date.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(schedule::Column::Date.lte(to));
        }
        if let Some(status) = filter.status {
            query = query.filter(schedule::Column::Status.eq(status));
        }
        if let Some(post_id) = filter.post_id {
            query = query.filter(schedule::Column::ServicePostId.eq(post_id));
        }

        let paginator = query
            .order_by_asc(schedule::Column::Date)
            .order_by_asc(schedule::Column::StartTime)
            .order_by_asc(schedule::Column::ServicePostId)
            .paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("count slots"))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("list slots"))?;

        Ok((items, total))
    }

    /// Bookable slots of a point on one date, earliest first.
    #[instrument(skip(self))]
    pub async fn available_for_date(
        &self,
        point_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<schedule::Model>, ServiceError> {
        let db = &*self.db;
        find_live(db, point_id).await?;

        schedule::Entity::find()
            .filter(schedule::Column::ServicePointId.eq(point_id))
            .filter(schedule::Column::Date.eq(date))
            .filter(schedule::Column::Status.eq(ScheduleStatus::Available))
            .order_by_asc(schedule::Column::StartTime)
            .order_by_asc(schedule::Column::ServicePostId)
            .all(db)
            .await
            .map_err(db_error("list available slots"))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<schedule::Model, ServiceError> {
        find_live_slot(&*self.db, id).await
    }

    /// Applies a manual action to a slot that no active booking holds.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        id: Uuid,
        action: SlotAction,
    ) -> Result<schedule::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(db_error("begin transaction"))?;
        let slot = find_live_slot(&txn, id).await?;

        let held = booking::Entity::find()
            .filter(booking::Column::ScheduleId.eq(id))
            .filter(
                booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]),
            )
            .count(&txn)
            .await
            .map_err(db_error("check slot bookings"))?;
        if held > 0 {
            return Err(ServiceError::InvalidTransition(format!(
                "Slot {} is held by an active booking; change the booking instead",
                id
            )));
        }

        let old_status = slot.status;
        let new_status = old_status.apply(action)?;

        let result = schedule::Entity::update_many()
            .col_expr(schedule::Column::Status, Expr::value(new_status))
            .col_expr(schedule::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(schedule::Column::Id.eq(id))
            .filter(schedule::Column::Status.eq(old_status))
            .exec(&txn)
            .await
            .map_err(db_error("update slot status"))?;
        if result.rows_affected != 1 {
            return Err(ServiceError::Conflict(format!(
                "Slot {} changed concurrently",
                id
            )));
        }

        let updated = find_slot(&txn, id).await?;
        txn.commit().await.map_err(db_error("commit transaction"))?;

        debug!(schedule_id = %id, %old_status, %new_status, "Slot transitioned");
        self.event_sender
            .send_or_log(Event::SlotStatusChanged {
                schedule_id: id,
                old_status,
                new_status,
            })
            .await;

        Ok(updated)
    }
}

/// Number of days in the inclusive range, bounded by `max_days`.
fn check_range(start: NaiveDate, end: NaiveDate, max_days: u32) -> Result<u32, ServiceError> {
    if end < start {
        return Err(ServiceError::ValidationError(
            "end_date must not be before start_date".to_string(),
        ));
    }
    let days = (end - start).num_days() + 1;
    if days > i64::from(max_days) {
        return Err(ServiceError::ValidationError(format!(
            "Schedule range of {} days exceeds the limit of {} days",
            days, max_days
        )));
    }
    Ok(days as u32)
}

fn ensure_accepts_bookings(point: &service_point::Model) -> Result<(), ServiceError> {
    if point.status.accepts_bookings() {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition(format!(
            "Service point {} is {}",
            point.id, point.status
        )))
    }
}

pub(crate) async fn find_slot<C>(db: &C, id: Uuid) -> Result<schedule::Model, ServiceError>
where
    C: ConnectionTrait,
{
    schedule::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(db_error("load slot"))?
        .ok_or_else(|| ServiceError::NotFound(format!("Slot {} not found", id)))
}

/// Like [`find_slot`] but hides slots of soft-deleted points.
async fn find_live_slot<C>(db: &C, id: Uuid) -> Result<schedule::Model, ServiceError>
where
    C: ConnectionTrait,
{
    schedule::Entity::find_by_id(id)
        .inner_join(service_point::Entity)
        .filter(service_point::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(db_error("load slot"))?
        .ok_or_else(|| ServiceError::NotFound(format!("Slot {} not found", id)))
}

/// Active posts of a point, optionally restricted to `only`.
async fn load_posts<C>(
    db: &C,
    point_id: Uuid,
    only: Option<&[Uuid]>,
) -> Result<Vec<PostSpec>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut query = service_post::Entity::find()
        .filter(service_post::Column::ServicePointId.eq(point_id))
        .filter(service_post::Column::IsActive.eq(true));
    if let Some(ids) = only {
        query = query.filter(service_post::Column::Id.is_in(ids.to_vec()));
    }

    let posts = query
        .order_by_asc(service_post::Column::PostNumber)
        .all(db)
        .await
        .map_err(db_error("load service posts"))?;

    if let Some(ids) = only {
        if let Some(missing) = ids.iter().find(|id| !posts.iter().any(|p| p.id == **id)) {
            return Err(ServiceError::ValidationError(format!(
                "Post {} is not an active post of service point {}",
                missing, point_id
            )));
        }
    }

    Ok(posts.iter().map(PostSpec::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkingHours;
    use assert_matches::assert_matches;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn range_is_inclusive() {
        assert_eq!(check_range(date(3), date(9), 7).unwrap(), 7);
        assert_eq!(check_range(date(3), date(3), 7).unwrap(), 1);
    }

    #[test]
    fn range_longer_than_limit_is_rejected() {
        assert_matches!(
            check_range(date(3), date(10), 7),
            Err(ServiceError::ValidationError(msg)) if msg.contains("limit of 7")
        );
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_matches!(
            check_range(date(9), date(3), 7),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn only_active_points_generate() {
        let now = Utc::now();
        let mut point = service_point::Model {
            id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            name: "Bay".into(),
            description: None,
            address: "Main st. 1".into(),
            city: "Kazan".into(),
            latitude: None,
            longitude: None,
            contact_phone: None,
            status: crate::models::ServicePointStatus::Suspended,
            working_hours: WorkingHours::default(),
            price_list_url: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert_matches!(
            ensure_accepts_bookings(&point),
            Err(ServiceError::InvalidTransition(_))
        );
        point.status = crate::models::ServicePointStatus::Active;
        assert!(ensure_accepts_bookings(&point).is_ok());
    }
}
