use crate::{
    entities::{
        address, customer, Address, AddressModel, Customer, CustomerModel, Membership,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerInput {
    pub account_id: Uuid,
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Option<Membership>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 32))]
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub membership: Option<Membership>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpsertAddressInput {
    #[validate(length(min = 1, max = 255))]
    pub street: String,
    #[validate(length(min = 1, max = 255))]
    pub city: String,
}

/// Customer profile service. Profiles map one-to-one onto accounts in the
/// external identity provider.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        input.validate()?;

        let existing = Customer::find()
            .filter(customer::Column::AccountId.eq(input.account_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "A customer profile already exists for this account".to_string(),
            ));
        }

        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(input.account_id),
            phone: Set(input.phone),
            birth_date: Set(input.birth_date),
            membership: Set(input.membership.unwrap_or_default()),
        };
        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CustomerCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: Uuid) -> Result<CustomerModel, ServiceError> {
        Customer::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CustomerModel>, u64), ServiceError> {
        let paginator = Customer::find()
            .order_by_asc(customer::Column::Phone)
            .paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        input.validate()?;

        let existing = self.get_customer(id).await?;
        let mut active: customer::ActiveModel = existing.into();

        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(birth_date) = input.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(membership) = input.membership {
            active.membership = Set(membership);
        }

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::CustomerUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Looks up the profile belonging to an account
    #[instrument(skip(self))]
    pub async fn get_by_account(&self, account_id: Uuid) -> Result<CustomerModel, ServiceError> {
        Customer::find()
            .filter(customer::Column::AccountId.eq(account_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("No customer profile exists for this account".to_string())
            })
    }

    /// Self-service profile write: updates the account's profile, creating
    /// it first when the account has none.
    #[instrument(skip(self, input))]
    pub async fn upsert_by_account(
        &self,
        account_id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        input.validate()?;

        match self.get_by_account(account_id).await {
            Ok(existing) => self.update_customer(existing.id, input).await,
            Err(ServiceError::NotFound(_)) => {
                self.create_customer(CreateCustomerInput {
                    account_id,
                    phone: input.phone.unwrap_or_default(),
                    birth_date: input.birth_date,
                    membership: input.membership,
                })
                .await
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_address(&self, customer_id: Uuid) -> Result<AddressModel, ServiceError> {
        Address::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} has no address", customer_id))
            })
    }

    /// Creates or replaces the customer's single address.
    #[instrument(skip(self, input))]
    pub async fn upsert_address(
        &self,
        customer_id: Uuid,
        input: UpsertAddressInput,
    ) -> Result<AddressModel, ServiceError> {
        input.validate()?;
        self.get_customer(customer_id).await?;

        match Address::find_by_id(customer_id).one(&*self.db).await? {
            Some(existing) => {
                let mut active: address::ActiveModel = existing.into();
                active.street = Set(input.street);
                active.city = Set(input.city);
                Ok(active.update(&*self.db).await?)
            }
            None => {
                let model = address::ActiveModel {
                    customer_id: Set(customer_id),
                    street: Set(input.street),
                    city: Set(input.city),
                };
                Ok(model.insert(&*self.db).await?)
            }
        }
    }
}
