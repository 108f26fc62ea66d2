use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::common::{options, parse_opt, read_upload, see_other, success_response, ListQuery};
use crate::entities::{choices, Gender};
use crate::errors::ServiceError;
use crate::forms::ValidForm;
use crate::services::{
    products::{ProductDetail, ProductFilter, ProductInput, ProductRow},
    Page,
};
use crate::{ApiResult, AppState};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/new", get(new_product_form))
        .route("/:id", get(get_product))
        .route("/:id/edit", get(edit_product_form).post(update_product))
        .route("/:id/delete", post(delete_product))
        .route("/:id/images", post(upload_product_image))
        .route("/images/:image_id/delete", post(delete_product_image))
}

/// Raw list filters; blank selects from the filter bar mean "any".
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ProductListQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            q: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            category: parse_opt(&self.category),
            brand: parse_opt(&self.brand),
            status: parse_opt(&self.status),
        }
    }

    fn paging(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<Page<ProductRow>> {
    let page = state
        .services
        .products
        .list(&query.filter(), query.paging().page_request(&state))
        .await?;
    Ok(success_response(page))
}

async fn form_context(state: &AppState, product: Value) -> Result<Value, ServiceError> {
    let brands = state.services.brands.all().await?;
    let categories = state.services.categories.all().await?;
    Ok(json!({
        "product": product,
        "brands": options(&brands, |b| b.id, |b| b.brand_name.clone()),
        "categories": options(&categories, |c| c.id, |c| c.category_name.clone()),
        "genders": choices::<Gender>(),
    }))
}

pub async fn new_product_form(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(success_response(form_context(&state, Value::Null).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<ProductInput>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.create(input).await?;
    Ok(see_other(format!("/admin/products/{}", product.id)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ProductDetail> {
    Ok(success_response(state.services.products.detail(id).await?))
}

pub async fn edit_product_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let product = state.services.products.get(id).await?;
    Ok(success_response(form_context(&state, json!(product)).await?))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<ProductInput>,
) -> Result<Response, ServiceError> {
    state.services.products.update(id, input).await?;
    Ok(see_other(format!("/admin/products/{}", id)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.products.delete(id).await?;
    Ok(see_other("/admin/products"))
}

/// Multipart upload: `image` file plus optional `alt_text`.
pub async fn upload_product_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let upload = read_upload(multipart).await?;
    state
        .services
        .products
        .upload_image(id, &upload.file_name, &upload.bytes, upload.field("alt_text"))
        .await?;
    Ok(see_other(format!("/admin/products/{}", id)))
}

pub async fn delete_product_image(
    State(state): State<AppState>,
    Path(image_id): Path<i32>,
) -> Result<Response, ServiceError> {
    let product_id = state.services.products.delete_image(image_id).await?;
    Ok(see_other(format!("/admin/products/{}", product_id)))
}
