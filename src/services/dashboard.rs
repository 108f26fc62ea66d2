//! Dashboard aggregation: sales comparison over two trailing 30-day windows,
//! order counts, low-stock alerts and a short feed of recent activity.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::gauge;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use strum::{Display, EnumString};
use tracing::instrument;

use crate::entities::{category, customer, order, product, product_variant, review, OrderStatus, PaymentStatus};
use crate::errors::ServiceError;

const WINDOW_DAYS: i64 = 30;
/// Entries kept in the activity feed, also the number fetched per source.
pub const ACTIVITY_LIMIT: usize = 5;

/// Relative change from `previous` to `current` in percent, unrounded.
/// With no previous revenue any current revenue counts as a 100% rise.
pub fn percentage_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        (current - previous) / previous * Decimal::ONE_HUNDRED
    } else if current > Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActivityKind {
    Order,
    Review,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Newest first, at most `limit` entries. Ties keep their input order.
pub fn merge_activity(mut entries: Vec<Activity>, limit: usize) -> Vec<Activity> {
    entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    entries.truncate(limit);
    entries
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub generated_at: DateTime<Utc>,
    pub sales_last_30_days: Decimal,
    pub sales_previous_30_days: Decimal,
    pub sales_percentage_change: Decimal,
    pub new_orders_today: u64,
    pub pending_orders: u64,
    pub shipped_orders: u64,
    pub low_stock_threshold: i32,
    pub low_stock_variants: u64,
    pub total_products: u64,
    pub total_categories: u64,
    pub recent_activity: Vec<Activity>,
}

#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
    low_stock_threshold: i32,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>, low_stock_threshold: i32) -> Self {
        Self {
            db,
            low_stock_threshold,
        }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<DashboardSummary, ServiceError> {
        let window = Duration::days(WINDOW_DAYS);
        let current_start = now - window;
        let previous_start = current_start - window;

        let sales_last_30_days = self.paid_revenue(current_start, now).await?;
        let sales_previous_30_days = self.paid_revenue(previous_start, current_start).await?;

        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(now);
        let new_orders_today = order::Entity::find()
            .filter(order::Column::OrderDate.gte(day_start))
            .filter(order::Column::OrderDate.lt(day_start + Duration::days(1)))
            .count(&*self.db)
            .await?;
        let pending_orders = self.count_with_status(OrderStatus::Pending).await?;
        let shipped_orders = self.count_with_status(OrderStatus::Shipped).await?;

        let low_stock_variants = product_variant::Entity::find()
            .filter(product_variant::Column::QuantityInStock.lte(self.low_stock_threshold))
            .count(&*self.db)
            .await?;
        gauge!("inventory.low_stock_variants", low_stock_variants as f64);

        let total_products = product::Entity::find().count(&*self.db).await?;
        let total_categories = category::Entity::find().count(&*self.db).await?;

        let mut activity = self.recent_orders().await?;
        activity.extend(self.recent_reviews().await?);

        Ok(DashboardSummary {
            generated_at: now,
            sales_percentage_change: percentage_change(sales_last_30_days, sales_previous_30_days),
            sales_last_30_days,
            sales_previous_30_days,
            new_orders_today,
            pending_orders,
            shipped_orders,
            low_stock_threshold: self.low_stock_threshold,
            low_stock_variants,
            total_products,
            total_categories,
            recent_activity: merge_activity(activity, ACTIVITY_LIMIT),
        })
    }

    /// Sum of paid order totals with `from <= order_date < to`.
    async fn paid_revenue(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Decimal, ServiceError> {
        let totals: Vec<Decimal> = order::Entity::find()
            .select_only()
            .column(order::Column::TotalAmount)
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Paid))
            .filter(order::Column::OrderDate.gte(from))
            .filter(order::Column::OrderDate.lt(to))
            .into_tuple()
            .all(&*self.db)
            .await?;
        Ok(totals.into_iter().sum::<Decimal>().round_dp(2))
    }

    async fn count_with_status(&self, status: OrderStatus) -> Result<u64, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::OrderStatus.eq(status))
            .count(&*self.db)
            .await?)
    }

    async fn recent_orders(&self) -> Result<Vec<Activity>, ServiceError> {
        let orders = order::Entity::find()
            .find_also_related(customer::Entity)
            .order_by_desc(order::Column::OrderDate)
            .limit(ACTIVITY_LIMIT as u64)
            .all(&*self.db)
            .await?;
        Ok(orders
            .into_iter()
            .map(|(order, customer)| {
                let who = customer
                    .map(|c| c.full_name())
                    .unwrap_or_else(|| "Guest".to_string());
                Activity {
                    kind: ActivityKind::Order,
                    description: format!("Order #{} placed by {}", order.id, who),
                    occurred_at: order.order_date,
                }
            })
            .collect())
    }

    async fn recent_reviews(&self) -> Result<Vec<Activity>, ServiceError> {
        let reviews = review::Entity::find()
            .find_also_related(product::Entity)
            .order_by_desc(review::Column::ReviewDate)
            .limit(ACTIVITY_LIMIT as u64)
            .all(&*self.db)
            .await?;
        Ok(reviews
            .into_iter()
            .map(|(review, product)| {
                let product_name = product
                    .map(|p| p.product_name)
                    .unwrap_or_else(|| "a product".to_string());
                Activity {
                    kind: ActivityKind::Review,
                    description: format!(
                        "New {}-star review for \"{}\"",
                        review.rating, product_name
                    ),
                    occurred_at: review.review_date,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(dec!(150), dec!(100), dec!(50.0) ; "growth")]
    #[test_case(dec!(50), dec!(0), dec!(100) ; "no previous revenue")]
    #[test_case(dec!(0), dec!(0), dec!(0) ; "no revenue at all")]
    #[test_case(dec!(75), dec!(100), dec!(-25.0) ; "decline")]
    fn percentage_change_cases(current: Decimal, previous: Decimal, expected: Decimal) {
        assert_eq!(percentage_change(current, previous), expected);
    }

    #[test]
    fn percentage_change_keeps_full_precision() {
        let change = percentage_change(dec!(100), dec!(300));
        assert_ne!(change, dec!(-66.7));
        assert!(change.scale() > 4);
        assert_eq!(change.round_dp(4), dec!(-66.6667));
    }

    fn entry(kind: ActivityKind, minute: u32) -> Activity {
        Activity {
            kind,
            description: format!("{}@{}", kind, minute),
            occurred_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn activity_is_newest_first_and_truncated() {
        let mut entries: Vec<Activity> = (0..5).map(|m| entry(ActivityKind::Order, m * 2)).collect();
        entries.extend((0..5).map(|m| entry(ActivityKind::Review, m * 2 + 1)));

        let merged = merge_activity(entries, ACTIVITY_LIMIT);
        let minutes: Vec<u32> = merged
            .iter()
            .map(|a| chrono::Timelike::minute(&a.occurred_at))
            .collect();
        assert_eq!(minutes, vec![9, 8, 7, 6, 5]);
        assert_eq!(merged[0].kind, ActivityKind::Review);
        assert_eq!(merged[1].kind, ActivityKind::Order);
    }
}
