//! Explicit cascading deletes.
//!
//! Children are removed before their parents, and every order that loses
//! items along the way gets its total recomputed on the same connection, so a
//! caller running these inside a transaction commits a consistent state or
//! nothing at all.

use std::collections::BTreeSet;

use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use tracing::debug;

use crate::entities::{
    address, applied_promotion, brand, cart, cart_item, category, customer, order, order_item,
    product, product_image, product_variant, promotion, review, wishlist,
};
use crate::errors::ServiceError;
use crate::services::orders::recompute_order_total;

/// Deletes variants with their images, order lines, cart lines and wishlist
/// entries. Returns the ids of orders whose totals were recomputed.
pub async fn delete_variants<C: ConnectionTrait>(
    conn: &C,
    variant_ids: &[i32],
) -> Result<Vec<i32>, ServiceError> {
    if variant_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = variant_ids.to_vec();

    let affected: BTreeSet<i32> = order_item::Entity::find()
        .select_only()
        .column(order_item::Column::OrderId)
        .filter(order_item::Column::VariantId.is_in(ids.clone()))
        .into_tuple::<i32>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    order_item::Entity::delete_many()
        .filter(order_item::Column::VariantId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    cart_item::Entity::delete_many()
        .filter(cart_item::Column::VariantId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    wishlist::Entity::delete_many()
        .filter(wishlist::Column::VariantId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    product_image::Entity::delete_many()
        .filter(product_image::Column::VariantId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    let removed = product_variant::Entity::delete_many()
        .filter(product_variant::Column::Id.is_in(ids))
        .exec(conn)
        .await?;

    for order_id in &affected {
        recompute_order_total(conn, *order_id).await?;
    }
    debug!(
        variants = removed.rows_affected,
        orders = affected.len(),
        "cascaded variant delete"
    );
    Ok(affected.into_iter().collect())
}

/// Deletes products with their variants (and everything hanging off them),
/// images and reviews.
pub async fn delete_products<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[i32],
) -> Result<(), ServiceError> {
    if product_ids.is_empty() {
        return Ok(());
    }
    let ids = product_ids.to_vec();

    let variant_ids: Vec<i32> = product_variant::Entity::find()
        .select_only()
        .column(product_variant::Column::Id)
        .filter(product_variant::Column::ProductId.is_in(ids.clone()))
        .into_tuple()
        .all(conn)
        .await?;
    delete_variants(conn, &variant_ids).await?;

    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    review::Entity::delete_many()
        .filter(review::Column::ProductId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    product::Entity::delete_many()
        .filter(product::Column::Id.is_in(ids))
        .exec(conn)
        .await?;
    Ok(())
}

/// Every category below `root`, not including `root` itself.
pub async fn descendant_categories<C: ConnectionTrait>(
    conn: &C,
    root: i32,
) -> Result<Vec<i32>, ServiceError> {
    let mut found = Vec::new();
    let mut frontier = vec![root];
    while !frontier.is_empty() {
        let children: Vec<i32> = category::Entity::find()
            .select_only()
            .column(category::Column::Id)
            .filter(category::Column::ParentCategoryId.is_in(frontier.clone()))
            .into_tuple()
            .all(conn)
            .await?;
        frontier = children
            .into_iter()
            .filter(|id| *id != root && !found.contains(id))
            .collect();
        found.extend(frontier.iter().copied());
    }
    Ok(found)
}

/// Deletes a category, its sub-categories and every product filed under them.
pub async fn delete_category<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), ServiceError> {
    // breadth-first order reversed puts the deepest categories first
    let mut ids = descendant_categories(conn, id).await?;
    ids.reverse();
    ids.push(id);

    let product_ids: Vec<i32> = product::Entity::find()
        .select_only()
        .column(product::Column::Id)
        .filter(product::Column::CategoryId.is_in(ids.clone()))
        .into_tuple()
        .all(conn)
        .await?;
    delete_products(conn, &product_ids).await?;

    for category_id in &ids {
        category::Entity::delete_by_id(*category_id).exec(conn).await?;
    }
    Ok(())
}

pub async fn delete_brand<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), ServiceError> {
    let product_ids: Vec<i32> = product::Entity::find()
        .select_only()
        .column(product::Column::Id)
        .filter(product::Column::BrandId.eq(id))
        .into_tuple()
        .all(conn)
        .await?;
    delete_products(conn, &product_ids).await?;
    brand::Entity::delete_by_id(id).exec(conn).await?;
    Ok(())
}

/// Deletes orders with their lines and applied promotions.
pub async fn delete_orders<C: ConnectionTrait>(
    conn: &C,
    order_ids: &[i32],
) -> Result<(), ServiceError> {
    if order_ids.is_empty() {
        return Ok(());
    }
    let ids = order_ids.to_vec();
    order_item::Entity::delete_many()
        .filter(order_item::Column::OrderId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    applied_promotion::Entity::delete_many()
        .filter(applied_promotion::Column::OrderId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    order::Entity::delete_many()
        .filter(order::Column::Id.is_in(ids))
        .exec(conn)
        .await?;
    Ok(())
}

/// Deletes addresses together with the orders shipped or billed to them.
pub async fn delete_addresses<C: ConnectionTrait>(
    conn: &C,
    address_ids: &[i32],
) -> Result<(), ServiceError> {
    if address_ids.is_empty() {
        return Ok(());
    }
    let ids = address_ids.to_vec();
    let order_ids: Vec<i32> = order::Entity::find()
        .select_only()
        .column(order::Column::Id)
        .filter(
            Condition::any()
                .add(order::Column::ShippingAddressId.is_in(ids.clone()))
                .add(order::Column::BillingAddressId.is_in(ids.clone())),
        )
        .into_tuple()
        .all(conn)
        .await?;
    delete_orders(conn, &order_ids).await?;
    address::Entity::delete_many()
        .filter(address::Column::Id.is_in(ids))
        .exec(conn)
        .await?;
    Ok(())
}

/// Deletes a customer and everything owned by them: orders, addresses,
/// cart, reviews and wishlist.
pub async fn delete_customer<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), ServiceError> {
    let order_ids: Vec<i32> = order::Entity::find()
        .select_only()
        .column(order::Column::Id)
        .filter(order::Column::CustomerId.eq(id))
        .into_tuple()
        .all(conn)
        .await?;
    delete_orders(conn, &order_ids).await?;

    let address_ids: Vec<i32> = address::Entity::find()
        .select_only()
        .column(address::Column::Id)
        .filter(address::Column::CustomerId.eq(id))
        .into_tuple()
        .all(conn)
        .await?;
    delete_addresses(conn, &address_ids).await?;

    let cart_ids: Vec<i32> = cart::Entity::find()
        .select_only()
        .column(cart::Column::Id)
        .filter(cart::Column::CustomerId.eq(id))
        .into_tuple()
        .all(conn)
        .await?;
    if !cart_ids.is_empty() {
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.is_in(cart_ids.clone()))
            .exec(conn)
            .await?;
        cart::Entity::delete_many()
            .filter(cart::Column::Id.is_in(cart_ids))
            .exec(conn)
            .await?;
    }

    review::Entity::delete_many()
        .filter(review::Column::CustomerId.eq(id))
        .exec(conn)
        .await?;
    wishlist::Entity::delete_many()
        .filter(wishlist::Column::CustomerId.eq(id))
        .exec(conn)
        .await?;
    customer::Entity::delete_by_id(id).exec(conn).await?;
    Ok(())
}

pub async fn delete_promotion<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), ServiceError> {
    applied_promotion::Entity::delete_many()
        .filter(applied_promotion::Column::PromotionId.eq(id))
        .exec(conn)
        .await?;
    promotion::Entity::delete_by_id(id).exec(conn).await?;
    Ok(())
}
