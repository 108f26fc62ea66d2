use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::entities::{brand, category, customer, product, product_image, product_variant, review, Gender};
use crate::errors::ServiceError;
use crate::forms::{FieldErrors, FormFields, ValidatedForm};
use crate::media::{DefaultImage, MediaStore, PRODUCT_IMAGE_FOLDER};
use crate::services::{cascade, check_reference, Page, PageRequest};

pub const PRICE_MESSAGE: &str = "Price must be greater than zero.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProductStatusFilter {
    Active,
    Inactive,
}

/// Product list filters as submitted by the list page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Matched against name, description and variant SKU
    pub q: Option<String>,
    pub category: Option<i32>,
    pub brand: Option<i32>,
    pub status: Option<ProductStatusFilter>,
}

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub product_name: String,
    pub description: Option<String>,
    pub brand_id: Option<i32>,
    pub category_id: Option<i32>,
    pub gender: Option<Gender>,
    pub price: Decimal,
    pub material: Option<String>,
    pub care_instructions: Option<String>,
    pub is_active: bool,
}

impl ValidatedForm for ProductInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let input = ProductInput {
            product_name: form.required_text("product_name"),
            description: form.optional_text("description"),
            brand_id: form.optional_reference("brand"),
            category_id: form.optional_reference("category"),
            gender: form.optional_choice("gender"),
            price: form.positive_decimal("price", PRICE_MESSAGE),
            material: form.optional_text("material"),
            care_instructions: form.optional_text("care_instructions"),
            is_active: form.checkbox("is_active"),
        };
        form.finish(input)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    #[serde(flatten)]
    pub product: product::Model,
    pub brand_name: Option<String>,
    pub category_name: Option<String>,
    pub total_stock: i64,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    #[serde(flatten)]
    pub image: product_image::Model,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: review::Model,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    #[serde(flatten)]
    pub variant: product_variant::Model,
    pub low_stock: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: product::Model,
    pub brand: Option<brand::Model>,
    pub category: Option<category::Model>,
    pub variants: Vec<VariantView>,
    pub images: Vec<ImageView>,
    pub reviews: Vec<ReviewView>,
    pub total_stock: i64,
    pub average_rating: Option<Decimal>,
    pub thumbnail_url: String,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    media: Arc<MediaStore>,
    low_stock_threshold: i32,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<MediaStore>, low_stock_threshold: i32) -> Self {
        Self {
            db,
            media,
            low_stock_threshold,
        }
    }

    /// Filtered product list, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<ProductRow>, ServiceError> {
        let db = &*self.db;
        let mut query = product::Entity::find();

        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let by_sku = product_variant::Entity::find()
                .select_only()
                .column(product_variant::Column::ProductId)
                .filter(product_variant::Column::Sku.contains(q))
                .into_query();
            query = query.filter(
                Condition::any()
                    .add(product::Column::ProductName.contains(q))
                    .add(product::Column::Description.contains(q))
                    .add(product::Column::Id.in_subquery(by_sku)),
            );
        }
        if let Some(category_id) = filter.category {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(brand_id) = filter.brand {
            query = query.filter(product::Column::BrandId.eq(brand_id));
        }
        match filter.status {
            Some(ProductStatusFilter::Active) => {
                query = query.filter(product::Column::IsActive.eq(true))
            }
            Some(ProductStatusFilter::Inactive) => {
                query = query.filter(product::Column::IsActive.eq(false))
            }
            None => {}
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .paginate(db, page.size());
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.index()).await?;
        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();

        let brands: HashMap<i32, String> = brand::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b.brand_name))
            .collect();
        let categories: HashMap<i32, String> = category::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.category_name))
            .collect();

        let mut stock: HashMap<i32, i64> = HashMap::new();
        for variant in product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.is_in(ids.clone()))
            .all(db)
            .await?
        {
            *stock.entry(variant.product_id).or_default() += i64::from(variant.quantity_in_stock);
        }

        let mut thumbnails: HashMap<i32, String> = HashMap::new();
        for image in product_image::Entity::find()
            .filter(product_image::Column::ProductId.is_in(ids))
            .order_by_desc(product_image::Column::IsThumbnail)
            .order_by_asc(product_image::Column::DisplayOrder)
            .order_by_asc(product_image::Column::Id)
            .all(db)
            .await?
        {
            thumbnails.entry(image.product_id).or_insert(image.image);
        }

        let items = products
            .into_iter()
            .map(|product| ProductRow {
                brand_name: product.brand_id.and_then(|id| brands.get(&id).cloned()),
                category_name: product.category_id.and_then(|id| categories.get(&id).cloned()),
                total_stock: stock.get(&product.id).copied().unwrap_or(0),
                thumbnail_url: self
                    .media
                    .url_for(thumbnails.get(&product.id).map(String::as_str), DefaultImage::Product),
                product,
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    /// Every product by name, for dropdowns.
    pub async fn all(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .order_by_asc(product::Column::ProductName)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: i32) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db;
        let product = self.get(id).await?;
        let brand = product.find_related(brand::Entity).one(db).await?;
        let category = product.find_related(category::Entity).one(db).await?;

        let variants: Vec<VariantView> = product
            .find_related(product_variant::Entity)
            .order_by_asc(product_variant::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|variant| VariantView {
                low_stock: variant.is_low_stock(self.low_stock_threshold),
                variant,
            })
            .collect();
        let total_stock = variants
            .iter()
            .map(|v| i64::from(v.variant.quantity_in_stock))
            .sum();

        let images: Vec<ImageView> = product
            .find_related(product_image::Entity)
            .order_by_asc(product_image::Column::DisplayOrder)
            .order_by_asc(product_image::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|image| ImageView {
                url: self.media.url_for(Some(&image.image), DefaultImage::Product),
                image,
            })
            .collect();
        let thumbnail = images
            .iter()
            .find(|view| view.image.is_thumbnail)
            .or_else(|| images.first())
            .map(|view| view.image.image.as_str());
        let thumbnail_url = self.media.url_for(thumbnail, DefaultImage::Product);

        let reviews: Vec<ReviewView> = review::Entity::find()
            .filter(review::Column::ProductId.eq(id))
            .find_also_related(customer::Entity)
            .order_by_desc(review::Column::ReviewDate)
            .all(db)
            .await?
            .into_iter()
            .map(|(review, customer)| ReviewView {
                review,
                customer_name: customer.map(|c| c.full_name()),
            })
            .collect();
        let average_rating = if reviews.is_empty() {
            None
        } else {
            let sum: i64 = reviews.iter().map(|r| i64::from(r.review.rating)).sum();
            Some((Decimal::from(sum) / Decimal::from(reviews.len() as i64)).round_dp(1))
        };

        Ok(ProductDetail {
            product,
            brand,
            category,
            variants,
            images,
            reviews,
            total_stock,
            average_rating,
            thumbnail_url,
        })
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        self.check_references(&input).await?;
        let now = Utc::now();
        let created = product::ActiveModel {
            product_name: Set(input.product_name),
            description: Set(input.description),
            brand_id: Set(input.brand_id),
            category_id: Set(input.category_id),
            gender: Set(input.gender),
            price: Set(input.price),
            material: Set(input.material),
            care_instructions: Set(input.care_instructions),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("catalog.products.created", 1);
        info!(product_id = created.id, name = %created.product_name, "created product");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: ProductInput) -> Result<product::Model, ServiceError> {
        let existing = self.get(id).await?;
        self.check_references(&input).await?;
        let mut active: product::ActiveModel = existing.into();
        active.product_name = Set(input.product_name);
        active.description = Set(input.description);
        active.brand_id = Set(input.brand_id);
        active.category_id = Set(input.category_id);
        active.gender = Set(input.gender);
        active.price = Set(input.price);
        active.material = Set(input.material);
        active.care_instructions = Set(input.care_instructions);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        info!(product_id = id, "updated product");
        Ok(updated)
    }

    /// Deletes the product with its variants, images, reviews and every order
    /// line referencing its variants.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<product::Model, ServiceError> {
        let existing = self.get(id).await?;
        let stored: Vec<String> = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|image| image.image)
            .collect();

        let txn = self.db.begin().await?;
        cascade::delete_products(&txn, &[id]).await?;
        txn.commit().await?;

        for path in stored {
            self.media.discard(&path).await;
        }
        counter!("catalog.products.deleted", 1);
        info!(product_id = id, "deleted product");
        Ok(existing)
    }

    /// Stores an uploaded image and makes it the product thumbnail.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        product_id: i32,
        file_name: &str,
        bytes: &[u8],
        alt_text: Option<String>,
    ) -> Result<product_image::Model, ServiceError> {
        self.get(product_id).await?;
        let stored = self.media.save(PRODUCT_IMAGE_FOLDER, file_name, bytes).await?;

        let txn = self.db.begin().await?;
        let next_order = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .count(&txn)
            .await? as i32;
        product_image::Entity::update_many()
            .col_expr(product_image::Column::IsThumbnail, Expr::value(false))
            .filter(product_image::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        let image = product_image::ActiveModel {
            product_id: Set(product_id),
            variant_id: Set(None),
            image: Set(stored),
            alt_text: Set(alt_text),
            is_thumbnail: Set(true),
            display_order: Set(next_order),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(product_id, image_id = image.id, "uploaded product image");
        Ok(image)
    }

    /// Removes an image row and its file; returns the product id.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, image_id: i32) -> Result<i32, ServiceError> {
        let image = product_image::Entity::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product image", image_id))?;
        let product_id = image.product_id;
        let path = image.image.clone();
        image.delete(&*self.db).await?;
        self.media.discard(&path).await;
        Ok(product_id)
    }

    async fn check_references(&self, input: &ProductInput) -> Result<(), ServiceError> {
        let db = &*self.db;
        let mut errors = FieldErrors::new();
        check_reference::<brand::Entity, _>(db, &mut errors, "brand", input.brand_id).await?;
        check_reference::<category::Entity, _>(db, &mut errors, "category", input.category_id)
            .await?;
        errors.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn product_form_parses_choices_and_price() {
        let input = ProductInput::from_form(form(&[
            ("product_name", "Linen Shirt"),
            ("gender", "W"),
            ("price", "49.90"),
            ("is_active", "on"),
        ]))
        .unwrap();
        assert_eq!(input.gender, Some(Gender::Women));
        assert_eq!(input.price, dec!(49.90));
        assert!(input.is_active);
    }

    #[test]
    fn product_form_rejects_non_positive_price() {
        let errors = ProductInput::from_form(form(&[
            ("product_name", "Linen Shirt"),
            ("price", "-1"),
            ("gender", "X"),
        ]))
        .unwrap_err();
        assert_eq!(errors.get("price"), Some(PRICE_MESSAGE));
        assert!(errors.contains("gender"));
    }

    #[test]
    fn status_filter_parses_case_insensitively() {
        assert_eq!(
            ProductStatusFilter::from_str("Active").unwrap(),
            ProductStatusFilter::Active
        );
        assert_eq!(ProductStatusFilter::Inactive.to_string(), "inactive");
    }
}
