use axum::{
    extract::{Path, Query, State},
    http::Method,
    response::Response,
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use super::common::{options, see_other, success_response, ListQuery};
use crate::errors::ServiceError;
use crate::forms::{Choice, ValidForm};
use crate::services::{
    categories::{CategoryDetail, CategoryInput, CategoryRow},
    Page,
};
use crate::{ApiResult, AppState};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/new", get(new_category_form))
        .route("/:id", get(get_category).delete(delete_category))
        .route("/:id/edit", get(edit_category_form).post(update_category))
        .route(
            "/:id/delete",
            delete(delete_category).fallback(delete_method_not_allowed),
        )
}

pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<CategoryRow>> {
    let page = state
        .services
        .categories
        .list(query.page_request(&state))
        .await?;
    Ok(success_response(page))
}

/// Parent options, leaving out `exclude` when editing.
async fn parent_options(state: &AppState, exclude: Option<i32>) -> Result<Vec<Choice>, ServiceError> {
    let categories: Vec<_> = state
        .services
        .categories
        .all()
        .await?
        .into_iter()
        .filter(|c| Some(c.id) != exclude)
        .collect();
    Ok(options(&categories, |c| c.id, |c| c.category_name.clone()))
}

pub async fn new_category_form(State(state): State<AppState>) -> ApiResult<Value> {
    let parents = parent_options(&state, None).await?;
    Ok(success_response(json!({
        "category": Value::Null,
        "parent_categories": parents,
    })))
}

pub async fn create_category(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<CategoryInput>,
) -> Result<Response, ServiceError> {
    state.services.categories.create(input).await?;
    Ok(see_other("/admin/categories"))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<CategoryDetail> {
    Ok(success_response(state.services.categories.detail(id).await?))
}

pub async fn edit_category_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let category = state.services.categories.get(id).await?;
    let parents = parent_options(&state, Some(id)).await?;
    Ok(success_response(json!({
        "category": category,
        "parent_categories": parents,
    })))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<CategoryInput>,
) -> Result<Response, ServiceError> {
    state.services.categories.update(id, input).await?;
    Ok(see_other("/admin/categories"))
}

#[derive(Debug, Serialize)]
pub struct DeleteMessage {
    pub message: String,
}

/// JSON delete endpoint used by the category list page.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteMessage>, ServiceError> {
    let category = state.services.categories.delete(id).await?;
    Ok(Json(DeleteMessage {
        message: format!("Category '{}' deleted successfully!", category.category_name),
    }))
}

async fn delete_method_not_allowed(method: Method) -> ServiceError {
    warn!(%method, "category delete called with unsupported method");
    ServiceError::MethodNotAllowed(format!("{} is not supported here; use DELETE", method))
}
