use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::common::{options, see_other, success_response, ListQuery};
use crate::entities::product_variant::{COLOR_OPTIONS, SIZE_OPTIONS};
use crate::errors::ServiceError;
use crate::forms::ValidForm;
use crate::services::{
    inventory::{VariantBatchInput, VariantInput, VariantRow},
    Page,
};
use crate::{ApiResult, AppState};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory).post(create_variants))
        .route("/new", get(new_variant_form))
        .route("/:id/edit", get(edit_variant_form).post(update_variant))
        .route("/:id/delete", post(delete_variant))
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryFilters {
    pub low_stock: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl InventoryFilters {
    fn low_stock_only(&self) -> bool {
        matches!(
            self.low_stock.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "1" | "on" | "yes")
        )
    }
}

/// List variants with optional low-stock filtering
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filters): Query<InventoryFilters>,
) -> ApiResult<Page<VariantRow>> {
    let paging = ListQuery {
        page: filters.page,
        per_page: filters.per_page,
    };
    let page = state
        .services
        .inventory
        .list(paging.page_request(&state), filters.low_stock_only())
        .await?;
    Ok(success_response(page))
}

pub async fn new_variant_form(State(state): State<AppState>) -> ApiResult<Value> {
    let products = state.services.products.all().await?;
    Ok(success_response(json!({
        "products": options(&products, |p| p.id, |p| p.product_name.clone()),
        "sizes": SIZE_OPTIONS,
        "colors": COLOR_OPTIONS,
        "low_stock_threshold": state.services.inventory.low_stock_threshold(),
    })))
}

/// Creates one variant per selected size
pub async fn create_variants(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<VariantBatchInput>,
) -> Result<Response, ServiceError> {
    state.services.inventory.create_batch(input).await?;
    Ok(see_other("/admin/inventory"))
}

pub async fn edit_variant_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let variant = state.services.inventory.get(id).await?;
    let product = state.services.products.get(variant.product_id).await?;
    let products = state.services.products.all().await?;
    Ok(success_response(json!({
        "variant": variant,
        "product_name": product.product_name,
        "products": options(&products, |p| p.id, |p| p.product_name.clone()),
        "sizes": SIZE_OPTIONS,
        "colors": COLOR_OPTIONS,
    })))
}

pub async fn update_variant(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<VariantInput>,
) -> Result<Response, ServiceError> {
    state.services.inventory.update(id, input).await?;
    Ok(see_other("/admin/inventory"))
}

pub async fn delete_variant(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.inventory.delete(id).await?;
    Ok(see_other("/admin/inventory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_stock_flag_accepts_checkbox_values() {
        let on = |raw: &str| InventoryFilters {
            low_stock: Some(raw.to_string()),
            ..Default::default()
        };
        assert!(on("true").low_stock_only());
        assert!(on("ON").low_stock_only());
        assert!(!on("false").low_stock_only());
        assert!(!InventoryFilters::default().low_stock_only());
    }
}
