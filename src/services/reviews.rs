use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::entities::{
    customer, product,
    review::{self, MAX_RATING, MIN_RATING},
};
use crate::errors::ServiceError;
use crate::forms::{FieldErrors, FormFields, ValidatedForm};
use crate::services::{check_reference, Page, PageRequest};

pub const DUPLICATE_REVIEW: &str = "This customer has already reviewed this product.";

#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub product_id: i32,
    pub customer_id: Option<i32>,
    pub rating: i32,
    pub review_text: Option<String>,
    pub is_approved: bool,
}

impl ValidatedForm for ReviewInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let product_id = form.required_reference("product");
        let customer_id = form.optional_reference("customer");
        let rating = form.required_int("rating");
        if !form.has_error("rating") && !(MIN_RATING as i64..=MAX_RATING as i64).contains(&rating)
        {
            form.error(
                "rating",
                format!("Rating must be between {} and {}.", MIN_RATING, MAX_RATING),
            );
        }
        let input = ReviewInput {
            product_id,
            customer_id,
            rating: rating.clamp(MIN_RATING as i64, MAX_RATING as i64) as i32,
            review_text: form.optional_text("review_text"),
            is_approved: form.checkbox("is_approved"),
        };
        form.finish(input)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRow {
    #[serde(flatten)]
    pub review: review::Model,
    pub product_name: String,
    /// `None` for anonymous reviews
    pub customer_name: Option<String>,
}

#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Reviews, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, page: PageRequest) -> Result<Page<ReviewRow>, ServiceError> {
        let paginator = review::Entity::find()
            .order_by_desc(review::Column::ReviewDate)
            .order_by_desc(review::Column::Id)
            .paginate(&*self.db, page.size());
        let total = paginator.num_items().await?;
        let reviews = paginator.fetch_page(page.index()).await?;

        let mut rows = Vec::with_capacity(reviews.len());
        for review in reviews {
            rows.push(self.row(review).await?);
        }
        Ok(Page::new(rows, total, page))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<review::Model, ServiceError> {
        review::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review", id))
    }

    pub async fn detail(&self, id: i32) -> Result<ReviewRow, ServiceError> {
        let review = self.get(id).await?;
        self.row(review).await
    }

    #[instrument(skip(self, input), fields(product_id = input.product_id))]
    pub async fn create(&self, input: ReviewInput) -> Result<review::Model, ServiceError> {
        self.check(&input, None).await?;
        let created = review::ActiveModel {
            product_id: Set(input.product_id),
            customer_id: Set(input.customer_id),
            rating: Set(input.rating),
            review_text: Set(input.review_text),
            review_date: Set(Utc::now()),
            is_approved: Set(input.is_approved),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|err| {
            ServiceError::from_integrity(err, &[("customer_id", "customer", DUPLICATE_REVIEW)])
        })?;

        counter!("reviews.created", 1);
        info!(review_id = created.id, rating = created.rating, "created review");
        Ok(created)
    }

    /// Updates the review; the original review date is kept.
    #[instrument(skip(self, input), fields(product_id = input.product_id))]
    pub async fn update(&self, id: i32, input: ReviewInput) -> Result<review::Model, ServiceError> {
        let existing = self.get(id).await?;
        self.check(&input, Some(id)).await?;

        let mut active: review::ActiveModel = existing.into();
        active.product_id = Set(input.product_id);
        active.customer_id = Set(input.customer_id);
        active.rating = Set(input.rating);
        active.review_text = Set(input.review_text);
        active.is_approved = Set(input.is_approved);
        let updated = active.update(&*self.db).await.map_err(|err| {
            ServiceError::from_integrity(err, &[("customer_id", "customer", DUPLICATE_REVIEW)])
        })?;

        info!(review_id = id, "updated review");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<review::Model, ServiceError> {
        let existing = self.get(id).await?;
        existing.clone().delete(&*self.db).await?;
        counter!("reviews.deleted", 1);
        info!(review_id = id, "deleted review");
        Ok(existing)
    }

    async fn row(&self, review: review::Model) -> Result<ReviewRow, ServiceError> {
        let product_name = product::Entity::find_by_id(review.product_id)
            .one(&*self.db)
            .await?
            .map(|p| p.product_name)
            .unwrap_or_default();
        let customer_name = match review.customer_id {
            Some(customer_id) => customer::Entity::find_by_id(customer_id)
                .one(&*self.db)
                .await?
                .map(|c| c.full_name()),
            None => None,
        };
        Ok(ReviewRow {
            review,
            product_name,
            customer_name,
        })
    }

    async fn check(&self, input: &ReviewInput, id: Option<i32>) -> Result<(), ServiceError> {
        let mut errors = FieldErrors::new();
        check_reference::<product::Entity, _>(&*self.db, &mut errors, "product", Some(input.product_id))
            .await?;
        check_reference::<customer::Entity, _>(&*self.db, &mut errors, "customer", input.customer_id)
            .await?;
        errors.check()?;

        // Anonymous reviews are never duplicates of each other.
        let Some(customer_id) = input.customer_id else {
            return Ok(());
        };
        let mut query = review::Entity::find()
            .filter(review::Column::ProductId.eq(input.product_id))
            .filter(review::Column::CustomerId.eq(customer_id));
        if let Some(id) = id {
            query = query.filter(review::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            warn!(customer_id, product_id = input.product_id, "duplicate review rejected");
            return Err(ServiceError::conflict("customer", DUPLICATE_REVIEW));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test_case("1", true ; "lowest")]
    #[test_case("5", true ; "highest")]
    #[test_case("0", false ; "below range")]
    #[test_case("6", false ; "above range")]
    #[test_case("four", false ; "not a number")]
    fn rating_bounds(rating: &str, ok: bool) {
        let result = ReviewInput::from_form(form(&[("product", "3"), ("rating", rating)]));
        assert_eq!(result.is_ok(), ok);
    }

    #[test]
    fn anonymous_review_has_no_customer() {
        let input = ReviewInput::from_form(form(&[
            ("product", "3"),
            ("rating", "4"),
            ("review_text", "Runs small"),
        ]))
        .unwrap();
        assert!(input.customer_id.is_none());
        assert!(!input.is_approved);
        assert_eq!(input.review_text.as_deref(), Some("Runs small"));
    }
}
