use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{service, service_point_service},
    errors::ServiceError,
};

use super::db_error;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServiceFilter {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Tyre change",
    "description": "Seasonal change, balancing included",
    "default_duration_minutes": 40
}))]
pub struct CreateServiceInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub default_duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateServiceInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub default_duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

/// The catalog of services points can offer.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ServiceFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<service::Model>, u64), ServiceError> {
        let mut query = service::Entity::find();
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(service::Column::Name.contains(search));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(service::Column::IsActive.eq(is_active));
        }

        let paginator = query
            .order_by_asc(service::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("count services"))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("list services"))?;

        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<service::Model, ServiceError> {
        service::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(db_error("load service"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Service {} not found", id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateServiceInput) -> Result<service::Model, ServiceError> {
        let name = input.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let model = service::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(input.description),
            default_duration_minutes: Set(input.default_duration_minutes),
            is_active: Set(input.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(db_error("create service"))?;

        info!(service_id = %model.id, "Catalog service created");
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateServiceInput,
    ) -> Result<service::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active: service::ActiveModel = existing.into();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            self.ensure_name_free(&name, Some(id)).await?;
            active.name = Set(name);
        }
        if input.description.is_some() {
            active.description = Set(input.description);
        }
        if input.default_duration_minutes.is_some() {
            active.default_duration_minutes = Set(input.default_duration_minutes);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        active
            .update(&*self.db)
            .await
            .map_err(db_error("update service"))
    }

    /// Deletes a catalog entry no service point offers any more.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;

        let attached = service_point_service::Entity::find()
            .filter(service_point_service::Column::ServiceId.eq(id))
            .count(&*self.db)
            .await
            .map_err(db_error("count service links"))?;
        if attached > 0 {
            return Err(ServiceError::Conflict(format!(
                "Service {} is offered by {} service point(s)",
                id, attached
            )));
        }

        service::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await
            .map_err(db_error("delete service"))?;
        info!(service_id = %id, "Catalog service deleted");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = service::Entity::find().filter(service::Column::Name.eq(name));
        if let Some(except) = except {
            query = query.filter(service::Column::Id.ne(except));
        }
        let taken = query
            .count(&*self.db)
            .await
            .map_err(db_error("check service name"))?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "Service named '{}' already exists",
                name
            )));
        }
        Ok(())
    }
}
