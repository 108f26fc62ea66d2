use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use strum::{Display, EnumString};
use tracing::{info, instrument};

use crate::entities::{applied_promotion, promotion, DiscountType};
use crate::errors::ServiceError;
use crate::forms::{FieldErrors, FormFields, ValidatedForm};
use crate::services::{cascade, name_taken, Page, PageRequest};

const CODE_TAKEN: &str = "A promotion with this code already exists.";
const LIMIT_MESSAGE: &str = "Limits must be zero or more.";

#[derive(Debug, Clone)]
pub struct PromotionInput {
    pub promo_code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub min_order_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_customer_limit: Option<i32>,
    pub is_active: bool,
}

impl ValidatedForm for PromotionInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let promo_code = form.required_text("promo_code");
        let discount_type: DiscountType = form.required_choice("discount_type");
        let discount_value =
            form.positive_decimal("discount_value", "Discount value must be greater than zero.");
        if discount_type == DiscountType::Percentage
            && discount_value > Decimal::ONE_HUNDRED
            && !form.has_error("discount_value")
        {
            form.error("discount_value", "A percentage discount cannot exceed 100.");
        }

        let start_date = form.required_datetime("start_date");
        let end_date = form.required_datetime("end_date");
        if !form.has_error("start_date") && !form.has_error("end_date") && end_date <= start_date {
            form.error("end_date", "End date must be after start date.");
        }

        let min_order_amount = form.optional_decimal("min_order_amount");
        if matches!(min_order_amount, Some(amount) if amount < Decimal::ZERO) {
            form.error("min_order_amount", "Minimum order amount must be zero or more.");
        }

        let input = PromotionInput {
            promo_code,
            description: form.optional_text("description"),
            discount_type,
            discount_value,
            start_date,
            end_date,
            min_order_amount,
            usage_limit: form.optional_non_negative("usage_limit", LIMIT_MESSAGE),
            per_customer_limit: form.optional_non_negative("per_customer_limit", LIMIT_MESSAGE),
            is_active: form.checkbox("is_active"),
        };
        form.finish(input)
    }
}

/// Where a promotion stands relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PromotionState {
    Disabled,
    Scheduled,
    Running,
    Expired,
}

impl PromotionState {
    pub fn of(promotion: &promotion::Model, at: DateTime<Utc>) -> Self {
        if !promotion.is_active {
            PromotionState::Disabled
        } else if at < promotion.start_date {
            PromotionState::Scheduled
        } else if at > promotion.end_date {
            PromotionState::Expired
        } else {
            PromotionState::Running
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromotionRow {
    #[serde(flatten)]
    pub promotion: promotion::Model,
    pub state: PromotionState,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromotionDetail {
    pub promotion: promotion::Model,
    pub state: PromotionState,
    pub times_used: u64,
    pub total_discount: Decimal,
    pub applications: Vec<applied_promotion::Model>,
}

#[derive(Clone)]
pub struct PromotionService {
    db: Arc<DatabaseConnection>,
}

impl PromotionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Promotions by start date, latest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Page<PromotionRow>, ServiceError> {
        let paginator = promotion::Entity::find()
            .order_by_desc(promotion::Column::StartDate)
            .order_by_desc(promotion::Column::Id)
            .paginate(&*self.db, page.size());
        let total = paginator.num_items().await?;
        let promotions = paginator.fetch_page(page.index()).await?;
        Ok(Page::new(promotions, total, page).map(|promotion| PromotionRow {
            state: PromotionState::of(&promotion, now),
            promotion,
        }))
    }

    /// Every promotion by code, for the apply-promotion dropdown.
    pub async fn all(&self) -> Result<Vec<promotion::Model>, ServiceError> {
        Ok(promotion::Entity::find()
            .order_by_asc(promotion::Column::PromoCode)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<promotion::Model, ServiceError> {
        promotion::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Promotion", id))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: i32, now: DateTime<Utc>) -> Result<PromotionDetail, ServiceError> {
        let promotion = self.get(id).await?;
        let applications = applied_promotion::Entity::find()
            .filter(applied_promotion::Column::PromotionId.eq(id))
            .order_by_desc(applied_promotion::Column::AppliedAt)
            .all(&*self.db)
            .await?;
        let total_discount = applications.iter().map(|a| a.discount_applied).sum();
        Ok(PromotionDetail {
            state: PromotionState::of(&promotion, now),
            times_used: applications.len() as u64,
            total_discount,
            applications,
            promotion,
        })
    }

    #[instrument(skip(self, input), fields(promo_code = %input.promo_code))]
    pub async fn create(&self, input: PromotionInput) -> Result<promotion::Model, ServiceError> {
        self.check_code(&input.promo_code, None).await?;
        let created = promotion::ActiveModel {
            promo_code: Set(input.promo_code),
            description: Set(input.description),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            min_order_amount: Set(input.min_order_amount),
            usage_limit: Set(input.usage_limit),
            per_customer_limit: Set(input.per_customer_limit),
            is_active: Set(input.is_active),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|err| {
            ServiceError::from_integrity(err, &[("promo_code", "promo_code", CODE_TAKEN)])
        })?;

        counter!("promotions.created", 1);
        info!(promotion_id = created.id, "created promotion");
        Ok(created)
    }

    #[instrument(skip(self, input), fields(promo_code = %input.promo_code))]
    pub async fn update(
        &self,
        id: i32,
        input: PromotionInput,
    ) -> Result<promotion::Model, ServiceError> {
        let existing = self.get(id).await?;
        self.check_code(&input.promo_code, Some(id)).await?;

        let mut active: promotion::ActiveModel = existing.into();
        active.promo_code = Set(input.promo_code);
        active.description = Set(input.description);
        active.discount_type = Set(input.discount_type);
        active.discount_value = Set(input.discount_value);
        active.start_date = Set(input.start_date);
        active.end_date = Set(input.end_date);
        active.min_order_amount = Set(input.min_order_amount);
        active.usage_limit = Set(input.usage_limit);
        active.per_customer_limit = Set(input.per_customer_limit);
        active.is_active = Set(input.is_active);
        let updated = active.update(&*self.db).await.map_err(|err| {
            ServiceError::from_integrity(err, &[("promo_code", "promo_code", CODE_TAKEN)])
        })?;

        info!(promotion_id = id, "updated promotion");
        Ok(updated)
    }

    /// Deletes the promotion and its application records.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<promotion::Model, ServiceError> {
        let existing = self.get(id).await?;
        let txn = self.db.begin().await?;
        cascade::delete_promotion(&txn, id).await?;
        txn.commit().await?;
        counter!("promotions.deleted", 1);
        info!(promotion_id = id, "deleted promotion");
        Ok(existing)
    }

    async fn check_code(&self, code: &str, id: Option<i32>) -> Result<(), ServiceError> {
        let exclude = id.map(|id| (promotion::Column::Id, id));
        if name_taken::<promotion::Entity, _, _>(
            &*self.db,
            promotion::Column::PromoCode,
            code,
            exclude,
        )
        .await?
        {
            return Err(ServiceError::conflict("promo_code", CODE_TAKEN));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn end_date_must_follow_start_date() {
        let errors = PromotionInput::from_form(form(&[
            ("promo_code", "SPRING"),
            ("discount_type", "PERCENTAGE"),
            ("discount_value", "15"),
            ("start_date", "2024-05-10T00:00"),
            ("end_date", "2024-05-01T00:00"),
        ]))
        .unwrap_err();
        assert_eq!(errors.get("end_date"), Some("End date must be after start date."));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn percentage_is_capped_and_limits_are_non_negative() {
        let errors = PromotionInput::from_form(form(&[
            ("promo_code", "HUGE"),
            ("discount_type", "PERCENTAGE"),
            ("discount_value", "120"),
            ("start_date", "2024-05-01T00:00"),
            ("end_date", "2024-06-01T00:00"),
            ("usage_limit", "-1"),
        ]))
        .unwrap_err();
        assert!(errors.contains("discount_value"));
        assert_eq!(errors.get("usage_limit"), Some(LIMIT_MESSAGE));
    }

    #[test]
    fn fixed_amount_form_parses() {
        let input = PromotionInput::from_form(form(&[
            ("promo_code", "TENOFF"),
            ("discount_type", "FIXED_AMOUNT"),
            ("discount_value", "10.00"),
            ("start_date", "2024-05-01T00:00"),
            ("end_date", "2024-06-01T00:00"),
            ("min_order_amount", "50"),
            ("is_active", "on"),
        ]))
        .unwrap();
        assert_eq!(input.discount_type, DiscountType::FixedAmount);
        assert_eq!(input.min_order_amount, Some(dec!(50)));
        assert!(input.usage_limit.is_none());
        assert!(input.is_active);
    }

    #[test]
    fn state_follows_dates_and_flag() {
        let mut promotion = promotion::Model {
            id: 1,
            promo_code: "SPRING".into(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            start_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            min_order_amount: None,
            usage_limit: None,
            per_customer_limit: None,
            is_active: true,
        };
        let before = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(PromotionState::of(&promotion, before), PromotionState::Scheduled);
        assert_eq!(PromotionState::of(&promotion, during), PromotionState::Running);
        assert_eq!(PromotionState::of(&promotion, after), PromotionState::Expired);
        assert_eq!(PromotionState::Running.to_string(), "running");

        promotion.is_active = false;
        assert_eq!(PromotionState::of(&promotion, during), PromotionState::Disabled);
    }
}
