use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use super::common::{see_other, success_response, ListQuery};
use crate::entities::brand;
use crate::errors::ServiceError;
use crate::forms::ValidForm;
use crate::services::{
    brands::{BrandDetail, BrandInput},
    Page,
};
use crate::{ApiResult, AppState};

pub fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/new", get(new_brand_form))
        .route("/:id", get(get_brand))
        .route("/:id/edit", get(edit_brand_form).post(update_brand))
        .route("/:id/delete", post(delete_brand))
}

pub async fn list_brands(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<brand::Model>> {
    let page = state.services.brands.list(query.page_request(&state)).await?;
    Ok(success_response(page))
}

pub async fn new_brand_form() -> ApiResult<Value> {
    Ok(success_response(json!({ "brand": Value::Null })))
}

pub async fn create_brand(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<BrandInput>,
) -> Result<Response, ServiceError> {
    state.services.brands.create(input).await?;
    Ok(see_other("/admin/brands"))
}

pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<BrandDetail> {
    Ok(success_response(state.services.brands.detail(id).await?))
}

pub async fn edit_brand_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let brand = state.services.brands.get(id).await?;
    Ok(success_response(json!({ "brand": brand })))
}

pub async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<BrandInput>,
) -> Result<Response, ServiceError> {
    state.services.brands.update(id, input).await?;
    Ok(see_other("/admin/brands"))
}

pub async fn delete_brand(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.brands.delete(id).await?;
    Ok(see_other("/admin/brands"))
}
