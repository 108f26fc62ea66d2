use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use super::common::{options, see_other, success_response, ListQuery};
use crate::entities::review::{MAX_RATING, MIN_RATING};
use crate::errors::ServiceError;
use crate::forms::ValidForm;
use crate::services::{
    reviews::{ReviewInput, ReviewRow},
    Page,
};
use crate::{ApiResult, AppState};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/new", get(new_review_form))
        .route("/:id", get(get_review))
        .route("/:id/edit", get(edit_review_form).post(update_review))
        .route("/:id/delete", post(delete_review))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<ReviewRow>> {
    let page = state.services.reviews.list(query.page_request(&state)).await?;
    Ok(success_response(page))
}

async fn form_context(state: &AppState, review: Value) -> Result<Value, ServiceError> {
    let products = state.services.products.all().await?;
    let customers = state.services.customers.all().await?;
    Ok(json!({
        "review": review,
        "products": options(&products, |p| p.id, |p| p.product_name.clone()),
        "customers": options(&customers, |c| c.id, |c| c.full_name()),
        "ratings": (MIN_RATING..=MAX_RATING).collect::<Vec<_>>(),
    }))
}

pub async fn new_review_form(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(success_response(form_context(&state, Value::Null).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<ReviewInput>,
) -> Result<Response, ServiceError> {
    let review = state.services.reviews.create(input).await?;
    Ok(see_other(format!("/admin/reviews/{}", review.id)))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ReviewRow> {
    Ok(success_response(state.services.reviews.detail(id).await?))
}

pub async fn edit_review_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let review = state.services.reviews.get(id).await?;
    Ok(success_response(form_context(&state, json!(review)).await?))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<ReviewInput>,
) -> Result<Response, ServiceError> {
    state.services.reviews.update(id, input).await?;
    Ok(see_other(format!("/admin/reviews/{}", id)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.reviews.delete(id).await?;
    Ok(see_other("/admin/reviews"))
}
