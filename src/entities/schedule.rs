use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ScheduleStatus;

/// One bookable slot at a post. `(service_post_id, date, start_time)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "schedules")]
#[schema(as = ScheduleSlot)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_point_id: Uuid,
    pub service_post_id: Uuid,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "09:30:00")]
    pub end_time: NaiveTime,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_point::Entity",
        from = "Column::ServicePointId",
        to = "super::service_point::Column::Id",
        on_delete = "Cascade"
    )]
    ServicePoint,
    #[sea_orm(
        belongs_to = "super::service_post::Entity",
        from = "Column::ServicePostId",
        to = "super::service_post::Column::Id",
        on_delete = "Cascade"
    )]
    ServicePost,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::service_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePoint.def()
    }
}

impl Related<super::service_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePost.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert && matches!(active_model.created_at, ActiveValue::NotSet) {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}
