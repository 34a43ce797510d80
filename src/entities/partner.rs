use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A company that operates one or more service points.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "partners")]
#[schema(as = Partner)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[schema(example = "Shinomontazh Plus LLC")]
    pub company_name: String,
    #[schema(example = "Ivan Petrov")]
    pub contact_person: String,
    #[schema(example = "+7 900 123-45-67")]
    pub phone: String,
    #[schema(example = "office@shinplus.example")]
    pub email: String,
    pub legal_address: Option<String>,
    pub tax_number: Option<String>,
    pub website: Option<String>,
    /// Opaque reference to an identity managed outside this service
    pub user_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::service_point::Entity")]
    ServicePoints,
}

impl Related<super::service_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServicePoints.def()
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
