use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::common::{options, see_other, success_response, ListQuery};
use crate::entities::{choices, order_item, OrderStatus, PaymentStatus};
use crate::errors::ServiceError;
use crate::forms::{Choice, ValidForm};
use crate::services::{
    orders::{
        ApplyPromotionInput, OrderDetail, OrderInput, OrderItemInput, OrderItemUpdate, OrderRow,
    },
    Page,
};
use crate::{ApiResult, AppState};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/new", get(new_order_form))
        .route("/:id", get(get_order))
        .route("/:id/edit", get(edit_order_form).post(update_order))
        .route("/:id/delete", post(delete_order))
        .route("/:id/items", get(new_item_form).post(add_order_item))
        .route(
            "/:id/items/:item_id/edit",
            get(edit_item_form).post(update_order_item),
        )
        .route("/:id/items/:item_id/delete", post(delete_order_item))
        .route("/:id/promotions", post(apply_promotion))
        .route(
            "/:id/promotions/:applied_id/delete",
            post(remove_promotion),
        )
}

fn order_page(id: i32) -> String {
    format!("/admin/orders/{}", id)
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<OrderRow>> {
    let page = state.services.orders.list(query.page_request(&state)).await?;
    Ok(success_response(page))
}

async fn order_form_context(state: &AppState, order: Value) -> Result<Value, ServiceError> {
    let customers = state.services.customers.all().await?;
    let addresses: Vec<Value> = state
        .services
        .customers
        .all_addresses()
        .await?
        .into_iter()
        .map(|a| {
            json!({
                "value": a.id.to_string(),
                "label": a.one_line(),
                "customer_id": a.customer_id,
                "address_type": a.address_type,
            })
        })
        .collect();
    Ok(json!({
        "order": order,
        "customers": options(&customers, |c| c.id, |c| format!("{} ({})", c.full_name(), c.email)),
        "addresses": addresses,
        "order_statuses": choices::<OrderStatus>(),
        "payment_statuses": choices::<PaymentStatus>(),
    }))
}

pub async fn new_order_form(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(success_response(order_form_context(&state, Value::Null).await?))
}

pub async fn create_order(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<OrderInput>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.create(input).await?;
    Ok(see_other(order_page(order.id)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<OrderDetail> {
    Ok(success_response(state.services.orders.detail(id).await?))
}

pub async fn edit_order_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let order = state.services.orders.get(id).await?;
    Ok(success_response(order_form_context(&state, json!(order)).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<OrderInput>,
) -> Result<Response, ServiceError> {
    state.services.orders.update(id, input).await?;
    Ok(see_other(order_page(id)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.orders.delete(id).await?;
    Ok(see_other("/admin/orders"))
}

async fn variant_options(state: &AppState) -> Result<Vec<Choice>, ServiceError> {
    let variants = state.services.inventory.all().await?;
    Ok(options(
        &variants,
        |row| row.variant.id,
        |row| {
            format!(
                "{} / {} ({} in stock)",
                row.variant.sku, row.product_name, row.variant.quantity_in_stock
            )
        },
    ))
}

/// Resolves an item through its order so ids from another order are rejected.
async fn owned_item(
    state: &AppState,
    order_id: i32,
    item_id: i32,
) -> Result<order_item::Model, ServiceError> {
    let item = state.services.orders.get_item(item_id).await?;
    if item.order_id != order_id {
        return Err(ServiceError::not_found("Order item", item_id));
    }
    Ok(item)
}

pub async fn new_item_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let order = state.services.orders.get(id).await?;
    Ok(success_response(json!({
        "order": order,
        "item": Value::Null,
        "variants": variant_options(&state).await?,
    })))
}

pub async fn add_order_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<OrderItemInput>,
) -> Result<Response, ServiceError> {
    state.services.orders.add_item(id, input).await?;
    Ok(see_other(order_page(id)))
}

pub async fn edit_item_form(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(i32, i32)>,
) -> ApiResult<Value> {
    let item = owned_item(&state, id, item_id).await?;
    Ok(success_response(json!({
        "order_id": id,
        "item": item,
        "variants": variant_options(&state).await?,
    })))
}

pub async fn update_order_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(i32, i32)>,
    ValidForm(input): ValidForm<OrderItemUpdate>,
) -> Result<Response, ServiceError> {
    owned_item(&state, id, item_id).await?;
    state.services.orders.update_item(item_id, input).await?;
    Ok(see_other(order_page(id)))
}

pub async fn delete_order_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(i32, i32)>,
) -> Result<Response, ServiceError> {
    owned_item(&state, id, item_id).await?;
    state.services.orders.delete_item(item_id).await?;
    Ok(see_other(order_page(id)))
}

pub async fn apply_promotion(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<ApplyPromotionInput>,
) -> Result<Response, ServiceError> {
    state
        .services
        .orders
        .apply_promotion(id, input, Utc::now())
        .await?;
    Ok(see_other(order_page(id)))
}

pub async fn remove_promotion(
    State(state): State<AppState>,
    Path((id, applied_id)): Path<(i32, i32)>,
) -> Result<Response, ServiceError> {
    let detail = state.services.orders.detail(id).await?;
    if !detail
        .applied_promotions
        .iter()
        .any(|line| line.applied.id == applied_id)
    {
        return Err(ServiceError::not_found("Applied promotion", applied_id));
    }
    state.services.orders.remove_promotion(applied_id).await?;
    Ok(see_other(order_page(id)))
}
