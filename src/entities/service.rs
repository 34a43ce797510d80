use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An offering from the catalog, e.g. "Tyre change".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "services")]
#[schema(as = Service)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    #[schema(example = "Tyre change")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 40)]
    pub default_duration_minutes: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::service_point_service::Entity")]
    ServicePointLinks,
}

impl Related<super::service_point_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePointLinks.def()
    }
}

impl Related<super::service_point::Entity> for Entity {
    fn to() -> RelationDef {
        super::service_point_service::Relation::ServicePoint.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::service_point_service::Relation::Service.def().rev())
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
