use std::sync::Arc;

use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::entities::{brand, product};
use crate::errors::ServiceError;
use crate::forms::{FieldErrors, FormFields, ValidatedForm};
use crate::services::{cascade, name_taken, Page, PageRequest};

const NAME_TAKEN: &str = "A brand with this name already exists.";

#[derive(Debug, Clone)]
pub struct BrandInput {
    pub brand_name: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
}

impl ValidatedForm for BrandInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let input = BrandInput {
            brand_name: form.required_text("brand_name"),
            description: form.optional_text("description"),
            website_url: form.optional_url("website_url"),
        };
        form.finish(input)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandDetail {
    pub brand: brand::Model,
    pub product_count: u64,
}

#[derive(Clone)]
pub struct BrandService {
    db: Arc<DatabaseConnection>,
}

impl BrandService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: PageRequest) -> Result<Page<brand::Model>, ServiceError> {
        let paginator = brand::Entity::find()
            .order_by_asc(brand::Column::BrandName)
            .paginate(&*self.db, page.size());
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;
        Ok(Page::new(items, total, page))
    }

    /// Every brand by name, for dropdowns.
    pub async fn all(&self) -> Result<Vec<brand::Model>, ServiceError> {
        Ok(brand::Entity::find()
            .order_by_asc(brand::Column::BrandName)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<brand::Model, ServiceError> {
        brand::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Brand", id))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: i32) -> Result<BrandDetail, ServiceError> {
        let brand = self.get(id).await?;
        let product_count = product::Entity::find()
            .filter(product::Column::BrandId.eq(id))
            .count(&*self.db)
            .await?;
        Ok(BrandDetail {
            brand,
            product_count,
        })
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: BrandInput) -> Result<brand::Model, ServiceError> {
        if name_taken::<brand::Entity, _, _>(&*self.db, brand::Column::BrandName, &input.brand_name, None)
            .await?
        {
            return Err(ServiceError::conflict("brand_name", NAME_TAKEN));
        }
        let created = brand::ActiveModel {
            brand_name: Set(input.brand_name),
            description: Set(input.description),
            website_url: Set(input.website_url),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|err| ServiceError::from_integrity(err, &[("brand_name", "brand_name", NAME_TAKEN)]))?;

        counter!("catalog.brands.created", 1);
        info!(brand_id = created.id, name = %created.brand_name, "created brand");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: BrandInput) -> Result<brand::Model, ServiceError> {
        let existing = self.get(id).await?;
        if name_taken::<brand::Entity, _, _>(
            &*self.db,
            brand::Column::BrandName,
            &input.brand_name,
            Some((brand::Column::Id, id)),
        )
        .await?
        {
            return Err(ServiceError::conflict("brand_name", NAME_TAKEN));
        }
        let mut active: brand::ActiveModel = existing.into();
        active.brand_name = Set(input.brand_name);
        active.description = Set(input.description);
        active.website_url = Set(input.website_url);
        let updated = active
            .update(&*self.db)
            .await
            .map_err(|err| ServiceError::from_integrity(err, &[("brand_name", "brand_name", NAME_TAKEN)]))?;

        info!(brand_id = id, "updated brand");
        Ok(updated)
    }

    /// Deletes the brand and every product of the brand.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<brand::Model, ServiceError> {
        let existing = self.get(id).await?;
        let txn = self.db.begin().await?;
        cascade::delete_brand(&txn, id).await?;
        txn.commit().await?;

        counter!("catalog.brands.deleted", 1);
        info!(brand_id = id, "deleted brand");
        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{INVALID_URL, REQUIRED};

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn brand_form_collects_every_error() {
        let errors = BrandInput::from_form(form(&[("website_url", "brand.example")])).unwrap_err();
        assert_eq!(errors.get("brand_name"), Some(REQUIRED));
        assert_eq!(errors.get("website_url"), Some(INVALID_URL));
    }

    #[test]
    fn brand_form_trims_values() {
        let input = BrandInput::from_form(form(&[
            ("brand_name", "  Acme  "),
            ("description", ""),
            ("website_url", "https://acme.example"),
        ]))
        .unwrap();
        assert_eq!(input.brand_name, "Acme");
        assert_eq!(input.description, None);
        assert_eq!(input.website_url.as_deref(), Some("https://acme.example"));
    }
}
