use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::BookingStatus;

/// A client's reservation of one schedule slot.
///
/// Date and times are copied from the slot at creation so listings do not
/// need a join.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "bookings")]
#[schema(as = Booking)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub service_point_id: Uuid,
    pub service_id: Option<Uuid>,
    pub booking_date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "09:30:00")]
    pub end_time: NaiveTime,
    #[schema(example = "Anna Smirnova")]
    pub client_name: String,
    #[schema(example = "+7 912 000-11-22")]
    pub client_phone: String,
    pub client_email: Option<String>,
    #[schema(example = "Toyota")]
    pub car_brand: Option<String>,
    #[schema(example = "Camry")]
    pub car_model: Option<String>,
    #[schema(example = "A123BC116")]
    pub license_plate: Option<String>,
    pub comment: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::schedule::Column::Id",
        on_delete = "Restrict"
    )]
    Schedule,
    #[sea_orm(
        belongs_to = "super::service_point::Entity",
        from = "Column::ServicePointId",
        to = "super::service_point::Column::Id",
        on_delete = "Restrict"
    )]
    ServicePoint,
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl Related<super::service_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePoint.def()
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
