use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::entities::{
    address, applied_promotion, customer, order, order_item, product, product_variant, promotion,
    DiscountType, OrderStatus, PaymentStatus,
};
use crate::errors::ServiceError;
use crate::forms::{FieldErrors, FormFields, ValidatedForm, INVALID_CHOICE};
use crate::services::products::PRICE_MESSAGE;
use crate::services::{cascade, check_reference, Page, PageRequest};

const QUANTITY_MESSAGE: &str = "Quantity must be a positive number.";
const DUPLICATE_LINE: &str = "This product variant is already in the order.";

/// Recomputes `total_amount` as the sum of `quantity * price_at_purchase`
/// over the order's current items and stores it. An order without items
/// totals zero.
pub async fn recompute_order_total<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Decimal, ServiceError> {
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(conn)
        .await?;
    let total = items
        .iter()
        .map(order_item::Model::line_total)
        .sum::<Decimal>()
        .round_dp(2);

    order::Entity::update_many()
        .col_expr(order::Column::TotalAmount, Expr::value(total))
        .filter(order::Column::Id.eq(order_id))
        .exec(conn)
        .await?;
    Ok(total)
}

/// Discount offered by default when a promotion is applied without an
/// explicit amount.
pub fn suggested_discount(promotion: &promotion::Model, order_total: Decimal) -> Decimal {
    match promotion.discount_type {
        DiscountType::Percentage => {
            (order_total * promotion.discount_value / Decimal::ONE_HUNDRED).round_dp(2)
        }
        DiscountType::FixedAmount => promotion.discount_value.min(order_total),
        DiscountType::FreeShipping => Decimal::ZERO,
    }
}

/// Header fields of an order. The total is never part of the input.
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub customer_id: Option<i32>,
    pub shipping_address_id: Option<i32>,
    pub billing_address_id: Option<i32>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_method: Option<String>,
    pub tracking_number: Option<String>,
}

impl ValidatedForm for OrderInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let input = OrderInput {
            customer_id: form.optional_reference("customer"),
            shipping_address_id: form.optional_reference("shipping_address"),
            billing_address_id: form.optional_reference("billing_address"),
            order_status: form.optional_choice("order_status").unwrap_or_default(),
            payment_status: form.optional_choice("payment_status").unwrap_or_default(),
            shipping_method: form.optional_text("shipping_method"),
            tracking_number: form.optional_text("tracking_number"),
        };
        form.finish(input)
    }
}

#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub variant_id: i32,
    pub quantity: i32,
}

fn line_fields(form: &mut FormFields) -> (i32, i32) {
    let variant_id = form.required_reference("variant");
    let quantity = form.required_int("quantity");
    if !form.has_error("quantity") && quantity < 1 {
        form.error("quantity", QUANTITY_MESSAGE);
    }
    let quantity = i32::try_from(quantity).unwrap_or_else(|_| {
        form.error("quantity", QUANTITY_MESSAGE);
        0
    });
    (variant_id, quantity)
}

impl ValidatedForm for OrderItemInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let (variant_id, quantity) = line_fields(&mut form);
        form.finish(OrderItemInput {
            variant_id,
            quantity,
        })
    }
}

/// Edit of an existing line. A submitted price replaces the snapshot taken
/// when the line was added.
#[derive(Debug, Clone)]
pub struct OrderItemUpdate {
    pub variant_id: i32,
    pub quantity: i32,
    pub price_at_purchase: Option<Decimal>,
}

impl From<OrderItemInput> for OrderItemUpdate {
    fn from(input: OrderItemInput) -> Self {
        Self {
            variant_id: input.variant_id,
            quantity: input.quantity,
            price_at_purchase: None,
        }
    }
}

impl ValidatedForm for OrderItemUpdate {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let (variant_id, quantity) = line_fields(&mut form);
        let price_at_purchase = form.optional_decimal("price_at_purchase");
        if matches!(price_at_purchase, Some(price) if price <= Decimal::ZERO) {
            form.error("price_at_purchase", PRICE_MESSAGE);
        }
        form.finish(OrderItemUpdate {
            variant_id,
            quantity,
            price_at_purchase,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApplyPromotionInput {
    pub promotion_id: i32,
    /// `None` applies the promotion's suggested discount
    pub discount_applied: Option<Decimal>,
}

impl ValidatedForm for ApplyPromotionInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let promotion_id = form.required_reference("promotion");
        let discount_applied = form.optional_decimal("discount_applied");
        if matches!(discount_applied, Some(d) if d < Decimal::ZERO) {
            form.error("discount_applied", "Discount cannot be negative.");
        }
        form.finish(ApplyPromotionInput {
            promotion_id,
            discount_applied,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRow {
    #[serde(flatten)]
    pub order: order::Model,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub item: order_item::Model,
    pub sku: String,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedPromotionLine {
    #[serde(flatten)]
    pub applied: applied_promotion::Model,
    pub promo_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: order::Model,
    pub customer: Option<customer::Model>,
    pub shipping_address: Option<address::Model>,
    pub billing_address: Option<address::Model>,
    pub items: Vec<OrderLine>,
    pub applied_promotions: Vec<AppliedPromotionLine>,
    /// Sum of recorded discounts; informational, not subtracted from the total
    pub total_discount: Decimal,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Orders newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, page: PageRequest) -> Result<Page<OrderRow>, ServiceError> {
        let paginator = order::Entity::find()
            .find_also_related(customer::Entity)
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::Id)
            .paginate(&*self.db, page.size());
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.index()).await?;
        let items = rows
            .into_iter()
            .map(|(order, customer)| OrderRow {
                order,
                customer_name: customer.map(|c| c.full_name()),
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: i32) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db;
        let order = self.get(id).await?;

        let customer = match order.customer_id {
            Some(customer_id) => customer::Entity::find_by_id(customer_id).one(db).await?,
            None => None,
        };
        let shipping_address = match order.shipping_address_id {
            Some(address_id) => address::Entity::find_by_id(address_id).one(db).await?,
            None => None,
        };
        let billing_address = match order.billing_address_id {
            Some(address_id) => address::Entity::find_by_id(address_id).one(db).await?,
            None => None,
        };

        let mut items = Vec::new();
        let rows = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .find_also_related(product_variant::Entity)
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await?;
        for (item, variant) in rows {
            let Some(variant) = variant else {
                warn!(item_id = item.id, "order item without variant");
                continue;
            };
            let product_name = variant
                .find_related(product::Entity)
                .one(db)
                .await?
                .map(|p| p.product_name)
                .unwrap_or_default();
            let line_total = item.line_total();
            items.push(OrderLine {
                item,
                sku: variant.sku,
                product_name,
                color: variant.color,
                size: variant.size,
                line_total,
            });
        }

        let applied_promotions: Vec<AppliedPromotionLine> = applied_promotion::Entity::find()
            .filter(applied_promotion::Column::OrderId.eq(id))
            .find_also_related(promotion::Entity)
            .order_by_asc(applied_promotion::Column::AppliedAt)
            .all(db)
            .await?
            .into_iter()
            .map(|(applied, promotion)| AppliedPromotionLine {
                applied,
                promo_code: promotion.map(|p| p.promo_code).unwrap_or_default(),
            })
            .collect();
        let total_discount = applied_promotions
            .iter()
            .map(|line| line.applied.discount_applied)
            .sum();

        Ok(OrderDetail {
            order,
            customer,
            shipping_address,
            billing_address,
            items,
            applied_promotions,
            total_discount,
        })
    }

    /// Creates an order header with a zero total.
    #[instrument(skip(self))]
    pub async fn create(&self, input: OrderInput) -> Result<order::Model, ServiceError> {
        self.check_references(&input).await?;
        let now = Utc::now();
        let created = order::ActiveModel {
            customer_id: Set(input.customer_id),
            order_date: Set(now),
            total_amount: Set(Decimal::ZERO),
            shipping_address_id: Set(input.shipping_address_id),
            billing_address_id: Set(input.billing_address_id),
            order_status: Set(input.order_status),
            payment_status: Set(input.payment_status),
            shipping_method: Set(input.shipping_method),
            tracking_number: Set(input.tracking_number),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("orders.created", 1);
        info!(order_id = created.id, "created order");
        Ok(created)
    }

    /// Updates the header fields and recomputes the total in one transaction.
    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: OrderInput) -> Result<order::Model, ServiceError> {
        let existing = self.get(id).await?;
        self.check_references(&input).await?;

        let txn = self.db.begin().await?;
        let mut active: order::ActiveModel = existing.into();
        active.customer_id = Set(input.customer_id);
        active.shipping_address_id = Set(input.shipping_address_id);
        active.billing_address_id = Set(input.billing_address_id);
        active.order_status = Set(input.order_status);
        active.payment_status = Set(input.payment_status);
        active.shipping_method = Set(input.shipping_method);
        active.tracking_number = Set(input.tracking_number);
        active.update(&txn).await?;
        recompute_order_total(&txn, id).await?;
        let updated = order::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))?;
        txn.commit().await?;

        info!(order_id = id, "updated order");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.get(id).await?;
        let txn = self.db.begin().await?;
        cascade::delete_orders(&txn, &[id]).await?;
        txn.commit().await?;
        counter!("orders.deleted", 1);
        info!(order_id = id, "deleted order");
        Ok(())
    }

    /// Adds a line priced at the product's current price. A second add of the
    /// same variant increments the existing line instead.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        order_id: i32,
        input: OrderItemInput,
    ) -> Result<order_item::Model, ServiceError> {
        let txn = self.db.begin().await?;
        order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;

        let (variant, product) = load_variant_with_product(&txn, input.variant_id).await?;

        let existing = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .filter(order_item::Column::VariantId.eq(variant.id))
            .one(&txn)
            .await?;
        let already_ordered = existing.as_ref().map_or(0, |item| item.quantity);
        let available = (variant.quantity_in_stock - already_ordered).max(0);
        if input.quantity > available {
            return Err(ServiceError::field(
                "quantity",
                format!("Not enough stock. Only {} available.", available),
            ));
        }

        let saved = match existing {
            Some(item) => {
                let quantity = item.quantity + input.quantity;
                let mut active: order_item::ActiveModel = item.into();
                active.quantity = Set(quantity);
                active.update(&txn).await?
            }
            None => order_item::ActiveModel {
                order_id: Set(order_id),
                variant_id: Set(variant.id),
                quantity: Set(input.quantity),
                price_at_purchase: Set(product.price),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|err| {
                ServiceError::from_integrity(err, &[("variant_id", "variant", DUPLICATE_LINE)])
            })?,
        };
        let total = recompute_order_total(&txn, order_id).await?;
        txn.commit().await?;

        counter!("orders.items.added", 1);
        info!(order_id, variant_id = variant.id, quantity = input.quantity, %total, "added order item");
        Ok(saved)
    }

    /// Changes a line's variant, quantity or price.
    ///
    /// Stock is checked when the variant changes or the quantity grows. For the
    /// same variant the quantity already on the line counts as available. A
    /// variant switch without a submitted price takes the product's current price.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        item_id: i32,
        input: OrderItemUpdate,
    ) -> Result<order_item::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let item = order_item::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order item", item_id))?;
        let (variant, product) = load_variant_with_product(&txn, input.variant_id).await?;

        let same_variant = item.variant_id == variant.id;
        if !same_variant {
            let clash = order_item::Entity::find()
                .filter(order_item::Column::OrderId.eq(item.order_id))
                .filter(order_item::Column::VariantId.eq(variant.id))
                .filter(order_item::Column::Id.ne(item.id))
                .count(&txn)
                .await?;
            if clash > 0 {
                return Err(ServiceError::conflict("variant", DUPLICATE_LINE));
            }
        }

        if !same_variant || input.quantity > item.quantity {
            let available = if same_variant {
                variant.quantity_in_stock.saturating_add(item.quantity)
            } else {
                variant.quantity_in_stock
            };
            if input.quantity > available {
                return Err(ServiceError::field(
                    "quantity",
                    format!(
                        "Not enough stock. Only {} available for {}.",
                        available, variant.sku
                    ),
                ));
            }
        }

        let order_id = item.order_id;
        let mut active: order_item::ActiveModel = item.into();
        active.quantity = Set(input.quantity);
        if !same_variant {
            active.variant_id = Set(variant.id);
            active.price_at_purchase = Set(product.price);
        }
        if let Some(price) = input.price_at_purchase {
            active.price_at_purchase = Set(price);
        }
        let saved = active.update(&txn).await.map_err(|err| {
            ServiceError::from_integrity(err, &[("variant_id", "variant", DUPLICATE_LINE)])
        })?;
        recompute_order_total(&txn, order_id).await?;
        txn.commit().await?;

        info!(order_id, item_id, "updated order item");
        Ok(saved)
    }

    /// Removes a line and returns the id of the order it belonged to.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: i32) -> Result<i32, ServiceError> {
        let txn = self.db.begin().await?;
        let item = order_item::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order item", item_id))?;
        let order_id = item.order_id;
        item.delete(&txn).await?;
        recompute_order_total(&txn, order_id).await?;
        txn.commit().await?;

        counter!("orders.items.removed", 1);
        info!(order_id, item_id, "deleted order item");
        Ok(order_id)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: i32) -> Result<order_item::Model, ServiceError> {
        order_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order item", item_id))
    }

    /// Records a promotion against an order. The order total is left as is;
    /// the discount is stored alongside it.
    #[instrument(skip(self))]
    pub async fn apply_promotion(
        &self,
        order_id: i32,
        input: ApplyPromotionInput,
        now: DateTime<Utc>,
    ) -> Result<applied_promotion::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        let promotion = promotion::Entity::find_by_id(input.promotion_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::field("promotion", INVALID_CHOICE))?;

        let already = applied_promotion::Entity::find()
            .filter(applied_promotion::Column::OrderId.eq(order_id))
            .filter(applied_promotion::Column::PromotionId.eq(promotion.id))
            .count(&txn)
            .await?;
        if already > 0 {
            return Err(ServiceError::conflict(
                "promotion",
                "This promotion has already been applied to this order.",
            ));
        }
        if !promotion.is_running_at(now) {
            return Err(ServiceError::field(
                "promotion",
                "This promotion is not currently active.",
            ));
        }
        if let Some(minimum) = promotion.min_order_amount {
            if order.total_amount < minimum {
                return Err(ServiceError::field(
                    "promotion",
                    format!("Order total must be at least {} to use this promotion.", minimum),
                ));
            }
        }
        if let Some(limit) = promotion.usage_limit {
            let used = applied_promotion::Entity::find()
                .filter(applied_promotion::Column::PromotionId.eq(promotion.id))
                .count(&txn)
                .await?;
            if used >= limit as u64 {
                return Err(ServiceError::field(
                    "promotion",
                    "This promotion has reached its usage limit.",
                ));
            }
        }
        if let (Some(limit), Some(customer_id)) = (promotion.per_customer_limit, order.customer_id)
        {
            let customer_orders: Vec<i32> = order::Entity::find()
                .select_only()
                .column(order::Column::Id)
                .filter(order::Column::CustomerId.eq(customer_id))
                .into_tuple()
                .all(&txn)
                .await?;
            let used = applied_promotion::Entity::find()
                .filter(applied_promotion::Column::PromotionId.eq(promotion.id))
                .filter(applied_promotion::Column::OrderId.is_in(customer_orders))
                .count(&txn)
                .await?;
            if used >= limit as u64 {
                return Err(ServiceError::field(
                    "promotion",
                    "This customer has reached the usage limit for this promotion.",
                ));
            }
        }

        let discount = input
            .discount_applied
            .unwrap_or_else(|| suggested_discount(&promotion, order.total_amount));
        if discount > order.total_amount {
            return Err(ServiceError::field(
                "discount_applied",
                "Discount cannot exceed the order total.",
            ));
        }

        let applied = applied_promotion::ActiveModel {
            order_id: Set(order_id),
            promotion_id: Set(promotion.id),
            discount_applied: Set(discount.round_dp(2)),
            applied_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|err| {
            ServiceError::from_integrity(
                err,
                &[(
                    "promotion_id",
                    "promotion",
                    "This promotion has already been applied to this order.",
                )],
            )
        })?;
        txn.commit().await?;

        counter!("orders.promotions.applied", 1);
        info!(order_id, promo_code = %promotion.promo_code, %discount, "applied promotion");
        Ok(applied)
    }

    /// Removes a recorded promotion from an order.
    #[instrument(skip(self))]
    pub async fn remove_promotion(&self, applied_id: i32) -> Result<i32, ServiceError> {
        let applied = applied_promotion::Entity::find_by_id(applied_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Applied promotion", applied_id))?;
        let order_id = applied.order_id;
        applied.delete(&*self.db).await?;
        Ok(order_id)
    }

    async fn check_references(&self, input: &OrderInput) -> Result<(), ServiceError> {
        let db = &*self.db;
        let mut errors = FieldErrors::new();
        check_reference::<customer::Entity, _>(db, &mut errors, "customer", input.customer_id).await?;
        for (field, address_id) in [
            ("shipping_address", input.shipping_address_id),
            ("billing_address", input.billing_address_id),
        ] {
            let Some(address_id) = address_id else {
                continue;
            };
            match address::Entity::find_by_id(address_id).one(db).await? {
                None => errors.add(field, INVALID_CHOICE),
                Some(address) if input.customer_id.is_some_and(|c| c != address.customer_id) => {
                    errors.add(field, "This address does not belong to the selected customer.")
                }
                Some(_) => {}
            }
        }
        errors.check()
    }
}

async fn load_variant_with_product<C: ConnectionTrait>(
    conn: &C,
    variant_id: i32,
) -> Result<(product_variant::Model, product::Model), ServiceError> {
    let (variant, product) = product_variant::Entity::find_by_id(variant_id)
        .find_also_related(product::Entity)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::field("variant", INVALID_CHOICE))?;
    let product = product.ok_or_else(|| ServiceError::field("variant", INVALID_CHOICE))?;
    Ok((variant, product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn promo(discount_type: DiscountType, value: Decimal) -> promotion::Model {
        let now = Utc::now();
        promotion::Model {
            id: 1,
            promo_code: "SPRING".into(),
            description: None,
            discount_type,
            discount_value: value,
            start_date: now,
            end_date: now,
            min_order_amount: None,
            usage_limit: None,
            per_customer_limit: None,
            is_active: true,
        }
    }

    #[test]
    fn suggested_discount_per_type() {
        assert_eq!(
            suggested_discount(&promo(DiscountType::Percentage, dec!(15)), dec!(80.00)),
            dec!(12.00)
        );
        assert_eq!(
            suggested_discount(&promo(DiscountType::FixedAmount, dec!(25)), dec!(10.00)),
            dec!(10.00)
        );
        assert_eq!(
            suggested_discount(&promo(DiscountType::FreeShipping, dec!(5)), dec!(10.00)),
            Decimal::ZERO
        );
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
    fn item_quantity_must_be_positive() {
        let errors = OrderItemInput::from_form(form(&[("variant", "3"), ("quantity", "0")]))
            .unwrap_err();
        assert_eq!(errors.get("quantity"), Some(QUANTITY_MESSAGE));

        let errors = OrderItemInput::from_form(form(&[("quantity", "2")])).unwrap_err();
        assert!(errors.contains("variant"));
    }

    #[test]
    fn item_edit_price_is_optional_but_positive() {
        let edit = OrderItemUpdate::from_form(form(&[("variant", "3"), ("quantity", "2")])).unwrap();
        assert_eq!(edit.price_at_purchase, None);

        let edit = OrderItemUpdate::from_form(form(&[
            ("variant", "3"),
            ("quantity", "2"),
            ("price_at_purchase", "12.50"),
        ]))
        .unwrap();
        assert_eq!(edit.price_at_purchase, Some(dec!(12.50)));

        let errors = OrderItemUpdate::from_form(form(&[
            ("variant", "3"),
            ("quantity", "2"),
            ("price_at_purchase", "0"),
        ]))
        .unwrap_err();
        assert_eq!(errors.get("price_at_purchase"), Some(PRICE_MESSAGE));
    }

    #[test]
    fn order_form_defaults_statuses() {
        let input = OrderInput::from_form(form(&[("shipping_method", "Courier")])).unwrap();
        assert_eq!(input.order_status, OrderStatus::Pending);
        assert_eq!(input.payment_status, PaymentStatus::Pending);
        assert_eq!(input.customer_id, None);

        let errors = OrderInput::from_form(form(&[("order_status", "LOST")])).unwrap_err();
        assert_eq!(errors.get("order_status"), Some(INVALID_CHOICE));
    }
}
