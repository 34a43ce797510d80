use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pivot between service points and the services they offer.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "service_point_services")]
#[schema(as = ServicePointServiceLink)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub service_point_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub service_id: Uuid,
    /// Point-specific note, e.g. "R13-R17 only"
    pub comment: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id",
        on_delete = "Restrict"
    )]
    Service,
}

impl Related<super::service_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePoint.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
