use std::sync::Arc;

use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{partner, service_point},
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::db_error;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PartnerFilter {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches company name, contact person or email
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "company_name": "Shinomontazh Plus LLC",
    "contact_person": "Ivan Petrov",
    "phone": "+7 900 123-45-67",
    "email": "office@shinplus.example",
    "tax_number": "1655000000"
}))]
pub struct CreatePartnerInput {
    #[validate(length(min = 1, max = 255))]
    pub company_name: String,
    #[validate(length(min = 1, max = 255))]
    pub contact_person: String,
    #[validate(length(min = 5, max = 32))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 500))]
    pub legal_address: Option<String>,
    #[validate(length(max = 32))]
    pub tax_number: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub user_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePartnerInput {
    #[validate(length(min = 1, max = 255))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub contact_person: Option<String>,
    #[validate(length(min = 5, max = 32))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub legal_address: Option<String>,
    #[validate(length(max = 32))]
    pub tax_number: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub user_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct PartnerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl PartnerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &PartnerFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<partner::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut query = partner::Entity::find();

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(partner::Column::CompanyName.contains(search))
                    .add(partner::Column::ContactPerson.contains(search))
                    .add(partner::Column::Email.contains(search)),
            );
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(partner::Column::IsActive.eq(is_active));
        }

        let paginator = query
            .order_by_asc(partner::Column::CompanyName)
            .paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("count partners"))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("list partners"))?;

        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<partner::Model, ServiceError> {
        partner::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(db_error("load partner"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Partner {} not found", id)))
    }

    #[instrument(skip(self, input), fields(company_name = %input.company_name))]
    pub async fn create(&self, input: CreatePartnerInput) -> Result<partner::Model, ServiceError> {
        let model = partner::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_name: Set(input.company_name.trim().to_string()),
            contact_person: Set(input.contact_person),
            phone: Set(input.phone),
            email: Set(input.email),
            legal_address: Set(input.legal_address),
            tax_number: Set(input.tax_number),
            website: Set(input.website),
            user_id: Set(input.user_id),
            is_active: Set(input.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(db_error("create partner"))?;

        counter!("bookings.partners.created", 1);
        info!(partner_id = %model.id, "Partner created");
        self.event_sender
            .send_or_log(Event::PartnerCreated(model.id))
            .await;

        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdatePartnerInput,
    ) -> Result<partner::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active: partner::ActiveModel = existing.into();

        if let Some(company_name) = input.company_name {
            active.company_name = Set(company_name.trim().to_string());
        }
        if let Some(contact_person) = input.contact_person {
            active.contact_person = Set(contact_person);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if input.legal_address.is_some() {
            active.legal_address = Set(input.legal_address);
        }
        if input.tax_number.is_some() {
            active.tax_number = Set(input.tax_number);
        }
        if input.website.is_some() {
            active.website = Set(input.website);
        }
        if input.user_id.is_some() {
            active.user_id = Set(input.user_id);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        active
            .update(&*self.db)
            .await
            .map_err(db_error("update partner"))
    }

    /// Deletes a partner that no longer owns any service point rows.
    ///
    /// Soft-deleted points still carry booking history, so they block deletion too.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let partner = self.get(id).await?;
        let db = &*self.db;

        let live = service_point::Entity::find()
            .filter(service_point::Column::PartnerId.eq(id))
            .filter(service_point::Column::DeletedAt.is_null())
            .count(db)
            .await
            .map_err(db_error("count partner service points"))?;
        if live > 0 {
            return Err(ServiceError::Conflict(format!(
                "Partner {} still owns {} service point(s)",
                id, live
            )));
        }

        let archived = service_point::Entity::find()
            .filter(service_point::Column::PartnerId.eq(id))
            .count(db)
            .await
            .map_err(db_error("count partner service points"))?;
        if archived > 0 {
            return Err(ServiceError::Conflict(format!(
                "Partner {} has {} deleted service point(s) with history; deactivate the partner instead",
                id, archived
            )));
        }

        partner::Entity::delete_by_id(partner.id)
            .exec(db)
            .await
            .map_err(db_error("delete partner"))?;

        info!(partner_id = %id, "Partner deleted");
        self.event_sender.send_or_log(Event::PartnerDeleted(id)).await;
        Ok(())
    }
}
