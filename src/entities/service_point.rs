use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ServicePointStatus, WorkingHours};

/// A physical location where services are booked.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "service_points")]
#[schema(as = ServicePoint)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub partner_id: Uuid,
    #[schema(example = "Tyre centre on Lenina")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "Lenina st. 12")]
    pub address: String,
    #[schema(example = "Kazan")]
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contact_phone: Option<String>,
    pub status: ServicePointStatus,
    #[sea_orm(column_type = "Json")]
    pub working_hours: WorkingHours,
    pub price_list_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the point is soft-deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::partner::Entity",
        from = "Column::PartnerId",
        to = "super::partner::Column::Id",
        on_delete = "Restrict"
    )]
    Partner,
    #[sea_orm(has_many = "super::service_post::Entity")]
    ServicePosts,
    #[sea_orm(has_many = "super::service_point_photo::Entity")]
    Photos,
    #[sea_orm(has_many = "super::service_point_service::Entity")]
    ServiceLinks,
    #[sea_orm(has_many = "super::schedule::Entity")]
    Schedules,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partner.def()
    }
}

impl Related<super::service_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePosts.def()
    }
}

impl Related<super::service_point_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedules.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        super::service_point_service::Relation::Service.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::service_point_service::Relation::ServicePoint.def().rev())
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
