use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PostSpec;

/// A bay at a service point with its own slot length.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "service_posts")]
#[schema(as = ServicePost)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_point_id: Uuid,
    #[schema(example = "Bay 1")]
    pub name: String,
    /// Unique within the service point
    #[schema(example = 1)]
    pub post_number: i32,
    #[schema(example = 30)]
    pub slot_duration_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Model> for PostSpec {
    fn from(post: &Model) -> Self {
        PostSpec {
            id: post.id,
            name: post.name.clone(),
            post_number: post.post_number,
            slot_duration_minutes: post.slot_duration_minutes.max(0) as u32,
        }
    }
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
    #[sea_orm(has_many = "super::schedule::Entity")]
    Schedules,
}

impl Related<super::service_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePoint.def()
    }
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedules.def()
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
