use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::common::{see_other, success_response, ListQuery};
use crate::entities::{choices, DiscountType};
use crate::errors::ServiceError;
use crate::forms::ValidForm;
use crate::services::{
    promotions::{PromotionDetail, PromotionInput, PromotionRow},
    Page,
};
use crate::{ApiResult, AppState};

pub fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_promotions).post(create_promotion))
        .route("/new", get(new_promotion_form))
        .route("/:id", get(get_promotion))
        .route("/:id/edit", get(edit_promotion_form).post(update_promotion))
        .route("/:id/delete", post(delete_promotion))
}

pub async fn list_promotions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<PromotionRow>> {
    let page = state
        .services
        .promotions
        .list(query.page_request(&state), Utc::now())
        .await?;
    Ok(success_response(page))
}

pub async fn new_promotion_form() -> ApiResult<Value> {
    Ok(success_response(json!({
        "promotion": Value::Null,
        "discount_types": choices::<DiscountType>(),
    })))
}

pub async fn create_promotion(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<PromotionInput>,
) -> Result<Response, ServiceError> {
    let promotion = state.services.promotions.create(input).await?;
    Ok(see_other(format!("/admin/promotions/{}", promotion.id)))
}

pub async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<PromotionDetail> {
    let detail = state.services.promotions.detail(id, Utc::now()).await?;
    Ok(success_response(detail))
}

pub async fn edit_promotion_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let promotion = state.services.promotions.get(id).await?;
    Ok(success_response(json!({
        "promotion": promotion,
        "discount_types": choices::<DiscountType>(),
    })))
}

pub async fn update_promotion(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<PromotionInput>,
) -> Result<Response, ServiceError> {
    state.services.promotions.update(id, input).await?;
    Ok(see_other(format!("/admin/promotions/{}", id)))
}

pub async fn delete_promotion(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.promotions.delete(id).await?;
    Ok(see_other("/admin/promotions"))
}
