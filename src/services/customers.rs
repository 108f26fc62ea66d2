use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::entities::{address, customer, order, AddressType};
use crate::errors::ServiceError;
use crate::forms::{FieldErrors, FormFields, ValidatedForm, REQUIRED};
use crate::media::{DefaultImage, MediaStore, CUSTOMER_PICTURE_FOLDER};
use crate::services::{cascade, name_taken, Page, PageRequest};

const EMAIL_TAKEN: &str = "A customer with this email already exists.";
const MIN_PASSWORD_LEN: usize = 8;

/// Customers who have spent at least this much are flagged premium.
pub const PREMIUM_THRESHOLD: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| ServiceError::InternalError(format!("password hashing failed: {}", err)))?;
    Ok(hash.to_string())
}

pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Required on create; on update `None` keeps the current password
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
}

impl ValidatedForm for CustomerInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let first_name = form.required_text("first_name");
        let last_name = form.required_text("last_name");
        let email = form.required_email("email");
        let password = form.optional_text("password");
        if matches!(&password, Some(p) if p.chars().count() < MIN_PASSWORD_LEN) {
            form.error(
                "password",
                format!("Password must be at least {} characters.", MIN_PASSWORD_LEN),
            );
        }
        let input = CustomerInput {
            first_name,
            last_name,
            email,
            password,
            phone_number: form.optional_text("phone_number"),
            notes: form.optional_text("notes"),
        };
        form.finish(input)
    }
}

#[derive(Debug, Clone)]
pub struct AddressInput {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state_province: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub address_type: AddressType,
    pub is_default: bool,
}

impl ValidatedForm for AddressInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let input = AddressInput {
            address_line1: form.required_text("address_line1"),
            address_line2: form.optional_text("address_line2"),
            city: form.required_text("city"),
            state_province: form.optional_text("state_province"),
            postal_code: form.required_text("postal_code"),
            country: form.required_text("country"),
            address_type: form.required_choice("address_type"),
            is_default: form.checkbox("is_default"),
        };
        form.finish(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerStats {
    pub total_orders: u64,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
    pub is_premium: bool,
}

impl CustomerStats {
    /// Aggregates over a customer's orders.
    pub fn from_orders(orders: &[order::Model]) -> Self {
        let total_orders = orders.len() as u64;
        let total_spent: Decimal = orders.iter().map(|o| o.total_amount).sum();
        let average_order_value = if total_orders == 0 {
            Decimal::ZERO
        } else {
            (total_spent / Decimal::from(total_orders)).round_dp(2)
        };
        CustomerStats {
            total_orders,
            total_spent,
            average_order_value,
            last_order_date: orders.iter().map(|o| o.order_date).max(),
            is_premium: total_spent >= PREMIUM_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    pub customer: customer::Model,
    pub profile_picture_url: String,
    pub addresses: Vec<address::Model>,
    pub orders: Vec<order::Model>,
    pub stats: CustomerStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRow {
    #[serde(flatten)]
    pub customer: customer::Model,
    pub full_name: String,
    pub profile_picture_url: String,
}

#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    media: Arc<MediaStore>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<MediaStore>) -> Self {
        Self { db, media }
    }

    /// Customers, most recently registered first.
    #[instrument(skip(self))]
    pub async fn list(&self, page: PageRequest) -> Result<Page<CustomerRow>, ServiceError> {
        let paginator = customer::Entity::find()
            .order_by_desc(customer::Column::RegistrationDate)
            .order_by_desc(customer::Column::Id)
            .paginate(&*self.db, page.size());
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.index()).await?;
        let rows = customers.into_iter().map(|customer| self.row(customer)).collect();
        Ok(Page::new(rows, total, page))
    }

    /// Every customer by name, for dropdowns.
    pub async fn all(&self) -> Result<Vec<customer::Model>, ServiceError> {
        Ok(customer::Entity::find()
            .order_by_asc(customer::Column::LastName)
            .order_by_asc(customer::Column::FirstName)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: i32) -> Result<CustomerDetail, ServiceError> {
        let customer = self.get(id).await?;
        let addresses = self.addresses(id).await?;
        let orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(id))
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::Id)
            .all(&*self.db)
            .await?;
        let stats = CustomerStats::from_orders(&orders);
        Ok(CustomerDetail {
            profile_picture_url: self
                .media
                .url_for(customer.profile_picture.as_deref(), DefaultImage::CustomerProfile),
            customer,
            addresses,
            orders,
            stats,
        })
    }

    pub async fn addresses(&self, customer_id: i32) -> Result<Vec<address::Model>, ServiceError> {
        Ok(address::Entity::find()
            .filter(address::Column::CustomerId.eq(customer_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_asc(address::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Every address with its owner, for the order form.
    pub async fn all_addresses(&self) -> Result<Vec<address::Model>, ServiceError> {
        Ok(address::Entity::find()
            .order_by_asc(address::Column::CustomerId)
            .order_by_asc(address::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: CustomerInput) -> Result<customer::Model, ServiceError> {
        let Some(password) = input.password.as_deref() else {
            return Err(ServiceError::field("password", REQUIRED));
        };
        self.check_email(&input.email, None).await?;
        let password_hash = hash_password(password)?;

        let created = customer::ActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            password_hash: Set(password_hash),
            phone_number: Set(input.phone_number),
            registration_date: Set(Utc::now()),
            last_login: Set(None),
            profile_picture: Set(None),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|err| ServiceError::from_integrity(err, &[("email", "email", EMAIL_TAKEN)]))?;

        counter!("customers.created", 1);
        info!(customer_id = created.id, "created customer");
        Ok(created)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn update(&self, id: i32, input: CustomerInput) -> Result<customer::Model, ServiceError> {
        let existing = self.get(id).await?;
        self.check_email(&input.email, Some(id)).await?;

        let mut active: customer::ActiveModel = existing.into();
        active.first_name = Set(input.first_name);
        active.last_name = Set(input.last_name);
        active.email = Set(input.email);
        active.phone_number = Set(input.phone_number);
        active.notes = Set(input.notes);
        if let Some(password) = input.password.as_deref() {
            active.password_hash = Set(hash_password(password)?);
        }
        let updated = active
            .update(&*self.db)
            .await
            .map_err(|err| ServiceError::from_integrity(err, &[("email", "email", EMAIL_TAKEN)]))?;

        info!(customer_id = id, "updated customer");
        Ok(updated)
    }

    /// Deletes the customer with their orders, addresses, cart, reviews and
    /// wishlist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<customer::Model, ServiceError> {
        let existing = self.get(id).await?;
        let txn = self.db.begin().await?;
        cascade::delete_customer(&txn, id).await?;
        txn.commit().await?;

        if let Some(path) = existing.profile_picture.as_deref() {
            self.media.discard(path).await;
        }
        counter!("customers.deleted", 1);
        info!(customer_id = id, "deleted customer");
        Ok(existing)
    }

    /// Adds an address. A new default address replaces the previous default
    /// of the same type.
    #[instrument(skip(self))]
    pub async fn add_address(
        &self,
        customer_id: i32,
        input: AddressInput,
    ) -> Result<address::Model, ServiceError> {
        self.get(customer_id).await?;
        let txn = self.db.begin().await?;
        if input.is_default {
            address::Entity::update_many()
                .col_expr(address::Column::IsDefault, Expr::value(false))
                .filter(address::Column::CustomerId.eq(customer_id))
                .filter(address::Column::AddressType.eq(input.address_type))
                .exec(&txn)
                .await?;
        }
        let created = address::ActiveModel {
            customer_id: Set(customer_id),
            address_line1: Set(input.address_line1),
            address_line2: Set(input.address_line2),
            city: Set(input.city),
            state_province: Set(input.state_province),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            address_type: Set(input.address_type),
            is_default: Set(input.is_default),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(customer_id, address_id = created.id, "added address");
        Ok(created)
    }

    /// Deletes an address together with orders that reference it; returns
    /// the owning customer id.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, address_id: i32) -> Result<i32, ServiceError> {
        let existing = address::Entity::find_by_id(address_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Address", address_id))?;
        let txn = self.db.begin().await?;
        cascade::delete_addresses(&txn, &[address_id]).await?;
        txn.commit().await?;
        info!(customer_id = existing.customer_id, address_id, "deleted address");
        Ok(existing.customer_id)
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_picture(
        &self,
        id: i32,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<customer::Model, ServiceError> {
        let existing = self.get(id).await?;
        let stored = self.media.save(CUSTOMER_PICTURE_FOLDER, file_name, bytes).await?;
        let previous = existing.profile_picture.clone();

        let mut active: customer::ActiveModel = existing.into();
        active.profile_picture = Set(Some(stored));
        let updated = active.update(&*self.db).await?;
        if let Some(path) = previous.as_deref() {
            self.media.discard(path).await;
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn clear_picture(&self, id: i32) -> Result<customer::Model, ServiceError> {
        let existing = self.get(id).await?;
        let previous = existing.profile_picture.clone();
        let mut active: customer::ActiveModel = existing.into();
        active.profile_picture = Set(None);
        let updated = active.update(&*self.db).await?;
        if let Some(path) = previous.as_deref() {
            self.media.discard(path).await;
        }
        Ok(updated)
    }

    fn row(&self, customer: customer::Model) -> CustomerRow {
        CustomerRow {
            full_name: customer.full_name(),
            profile_picture_url: self
                .media
                .url_for(customer.profile_picture.as_deref(), DefaultImage::CustomerProfile),
            customer,
        }
    }

    async fn check_email(&self, email: &str, id: Option<i32>) -> Result<(), ServiceError> {
        let exclude = id.map(|id| (customer::Column::Id, id));
        if name_taken::<customer::Entity, _, _>(&*self.db, customer::Column::Email, email, exclude)
            .await?
        {
            return Err(ServiceError::conflict("email", EMAIL_TAKEN));
        }
        Ok(())
    }
}
