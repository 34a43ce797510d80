use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Photo reference of a service point. Only the URL is stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "service_point_photos")]
#[schema(as = ServicePointPhoto)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_point_id: Uuid,
    #[schema(example = "https://cdn.example.com/points/front.jpg")]
    pub url: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
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
}

impl Related<super::service_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePoint.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
