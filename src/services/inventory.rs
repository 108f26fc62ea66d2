use std::sync::Arc;

use metrics::{counter, gauge};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::entities::{product, product_variant};
use crate::errors::ServiceError;
use crate::forms::{alphanumeric, FieldErrors, FormFields, ValidatedForm, INVALID_CHOICE};
use crate::services::{cascade, Page, PageRequest};

const STOCK_MESSAGE: &str = "Quantity in stock must be zero or more.";

/// `PROD<zero padded product id>-<color>-<size>` with punctuation and spaces
/// dropped from color and size.
pub fn generate_sku(product_id: i32, color: &str, size: &str) -> String {
    format!(
        "PROD{:03}-{}-{}",
        product_id,
        alphanumeric(color),
        alphanumeric(size)
    )
}

fn sku_taken_message(sku: &str) -> String {
    format!("A variant with SKU {} already exists.", sku)
}

/// One color of a product in several sizes.
#[derive(Debug, Clone)]
pub struct VariantBatchInput {
    pub product_id: i32,
    pub color: String,
    pub sizes: Vec<String>,
    pub quantity_in_stock: i32,
}

impl ValidatedForm for VariantBatchInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let product_id = form.required_reference("product");
        let color = form.required_text("color");
        let mut sizes: Vec<String> = Vec::new();
        for size in form.all("sizes") {
            if !sizes.contains(&size) {
                sizes.push(size);
            }
        }
        if sizes.is_empty() {
            form.error("sizes", "Select at least one size.");
        }
        let quantity_in_stock = form
            .optional_non_negative("quantity_in_stock", STOCK_MESSAGE)
            .unwrap_or(0);
        form.finish(VariantBatchInput {
            product_id,
            color,
            sizes,
            quantity_in_stock,
        })
    }
}

/// Edit of a single variant. `product_id: None` keeps the current product.
#[derive(Debug, Clone)]
pub struct VariantInput {
    pub product_id: Option<i32>,
    pub color: String,
    pub size: String,
    pub quantity_in_stock: i32,
}

impl ValidatedForm for VariantInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let product_id = form.optional_reference("product");
        let color = form.required_text("color");
        let size = form.required_text("size");
        let quantity_in_stock = form
            .optional_non_negative("quantity_in_stock", STOCK_MESSAGE)
            .unwrap_or(0);
        form.finish(VariantInput {
            product_id,
            color,
            size,
            quantity_in_stock,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantRow {
    #[serde(flatten)]
    pub variant: product_variant::Model,
    pub product_name: String,
    pub low_stock: bool,
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    low_stock_threshold: i32,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, low_stock_threshold: i32) -> Self {
        Self {
            db,
            low_stock_threshold,
        }
    }

    pub fn low_stock_threshold(&self) -> i32 {
        self.low_stock_threshold
    }

    /// Variants grouped by product, optionally only those at or below the
    /// low-stock threshold.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: PageRequest,
        low_stock_only: bool,
    ) -> Result<Page<VariantRow>, ServiceError> {
        let mut query = product_variant::Entity::find().find_also_related(product::Entity);
        if low_stock_only {
            query = query
                .filter(product_variant::Column::QuantityInStock.lte(self.low_stock_threshold));
        }
        let paginator = query
            .order_by_asc(product_variant::Column::ProductId)
            .order_by_asc(product_variant::Column::Sku)
            .paginate(&*self.db, page.size());
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.index()).await?;
        let threshold = self.low_stock_threshold;
        let items = rows
            .into_iter()
            .map(|(variant, product)| VariantRow {
                low_stock: variant.is_low_stock(threshold),
                product_name: product.map(|p| p.product_name).unwrap_or_default(),
                variant,
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<product_variant::Model, ServiceError> {
        product_variant::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Variant", id))
    }

    /// Every variant with its product name, ordered by SKU, for order item dropdowns.
    pub async fn all(&self) -> Result<Vec<VariantRow>, ServiceError> {
        let rows = product_variant::Entity::find()
            .find_also_related(product::Entity)
            .order_by_asc(product_variant::Column::Sku)
            .all(&*self.db)
            .await?;
        let threshold = self.low_stock_threshold;
        Ok(rows
            .into_iter()
            .map(|(variant, product)| VariantRow {
                low_stock: variant.is_low_stock(threshold),
                product_name: product.map(|p| p.product_name).unwrap_or_default(),
                variant,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn for_product(&self, product_id: i32) -> Result<Vec<product_variant::Model>, ServiceError> {
        Ok(product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Creates one variant per size. Any SKU collision aborts the whole batch.
    #[instrument(skip(self))]
    pub async fn create_batch(
        &self,
        input: VariantBatchInput,
    ) -> Result<Vec<product_variant::Model>, ServiceError> {
        let txn = self.db.begin().await?;
        product::Entity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::field("product", INVALID_CHOICE))?;

        let mut created = Vec::with_capacity(input.sizes.len());
        for size in &input.sizes {
            let sku = generate_sku(input.product_id, &input.color, size);
            if sku_exists(&txn, &sku, None).await? {
                return Err(ServiceError::conflict("sizes", sku_taken_message(&sku)));
            }
            let variant = product_variant::ActiveModel {
                product_id: Set(input.product_id),
                color: Set(input.color.clone()),
                size: Set(size.clone()),
                sku: Set(sku.clone()),
                quantity_in_stock: Set(input.quantity_in_stock),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|err| {
                ServiceError::from_integrity(
                    err,
                    &[
                        ("sku", "sizes", "A variant with this SKU already exists."),
                        ("size", "sizes", "This color and size already exist for the product."),
                    ],
                )
            })?;
            created.push(variant);
        }
        txn.commit().await?;

        counter!("inventory.variants.created", created.len() as u64);
        info!(
            product_id = input.product_id,
            count = created.len(),
            "created variants"
        );
        Ok(created)
    }

    /// Updates product, color, size and stock, regenerating the SKU from the
    /// resulting product id.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: VariantInput,
    ) -> Result<product_variant::Model, ServiceError> {
        let existing = self.get(id).await?;
        let product_id = match input.product_id {
            Some(product_id) if product_id != existing.product_id => {
                product::Entity::find_by_id(product_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| ServiceError::field("product", INVALID_CHOICE))?
                    .id
            }
            _ => existing.product_id,
        };
        let sku = generate_sku(product_id, &input.color, &input.size);
        if sku_exists(&*self.db, &sku, Some(id)).await? {
            return Err(ServiceError::conflict("sku", sku_taken_message(&sku)));
        }

        let mut active: product_variant::ActiveModel = existing.into();
        active.product_id = Set(product_id);
        active.color = Set(input.color);
        active.size = Set(input.size);
        active.sku = Set(sku);
        active.quantity_in_stock = Set(input.quantity_in_stock);
        let updated = active.update(&*self.db).await.map_err(|err| {
            ServiceError::from_integrity(
                err,
                &[
                    ("sku", "sku", "A variant with this SKU already exists."),
                    ("size", "size", "This color and size already exist for the product."),
                ],
            )
        })?;

        info!(variant_id = id, sku = %updated.sku, "updated variant");
        Ok(updated)
    }

    /// Deletes a variant with its dependents and returns its product id.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<i32, ServiceError> {
        let variant = self.get(id).await?;
        let txn = self.db.begin().await?;
        let orders = cascade::delete_variants(&txn, &[id]).await?;
        txn.commit().await?;

        counter!("inventory.variants.deleted", 1);
        info!(variant_id = id, orders_recomputed = orders.len(), "deleted variant");
        Ok(variant.product_id)
    }

    /// Number of variants at or below the low-stock threshold.
    #[instrument(skip(self))]
    pub async fn low_stock_count(&self) -> Result<u64, ServiceError> {
        let count = product_variant::Entity::find()
            .filter(product_variant::Column::QuantityInStock.lte(self.low_stock_threshold))
            .count(&*self.db)
            .await?;
        gauge!("inventory.low_stock_variants", count as f64);
        Ok(count)
    }
}

async fn sku_exists<C: ConnectionTrait>(
    conn: &C,
    sku: &str,
    exclude: Option<i32>,
) -> Result<bool, ServiceError> {
    let mut query = product_variant::Entity::find().filter(product_variant::Column::Sku.eq(sku));
    if let Some(id) = exclude {
        query = query.filter(product_variant::Column::Id.ne(id));
    }
    Ok(query.count(conn).await? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(7, "Red", "M", "PROD007-Red-M" ; "simple")]
    #[test_case(12, "Navy Blue", "X-L", "PROD012-NavyBlue-XL" ; "strips punctuation")]
    #[test_case(1234, "Black", "S", "PROD1234-Black-S" ; "wide ids are not truncated")]
    fn sku_format(product_id: i32, color: &str, size: &str, expected: &str) {
        assert_eq!(generate_sku(product_id, color, size), expected);
    }

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn batch_form_dedupes_sizes() {
        let input = VariantBatchInput::from_form(form(&[
            ("product", "7"),
            ("color", "Red"),
            ("sizes", "S"),
            ("sizes", "M"),
            ("sizes", "S"),
        ]))
        .unwrap();
        assert_eq!(input.sizes, vec!["S".to_string(), "M".to_string()]);
        assert_eq!(input.quantity_in_stock, 0);
    }

    #[test]
    fn batch_form_requires_a_size_and_non_negative_stock() {
        let errors = VariantBatchInput::from_form(form(&[
            ("product", "7"),
            ("color", "Red"),
            ("quantity_in_stock", "-3"),
        ]))
        .unwrap_err();
        assert!(errors.contains("sizes"));
        assert_eq!(errors.get("quantity_in_stock"), Some(STOCK_MESSAGE));
    }
}
