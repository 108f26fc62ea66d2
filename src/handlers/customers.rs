use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use super::common::{read_upload, see_other, success_response, ListQuery};
use crate::entities::{choices, AddressType};
use crate::errors::ServiceError;
use crate::forms::ValidForm;
use crate::services::{
    customers::{AddressInput, CustomerDetail, CustomerInput, CustomerRow},
    Page,
};
use crate::{ApiResult, AppState};

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/new", get(new_customer_form))
        .route("/:id", get(get_customer))
        .route("/:id/edit", get(edit_customer_form).post(update_customer))
        .route("/:id/delete", post(delete_customer))
        .route("/:id/addresses", post(add_address))
        .route("/:id/addresses/:address_id/delete", post(delete_address))
        .route("/:id/picture", post(upload_picture))
        .route("/:id/picture/clear", post(clear_picture))
}

fn customer_page(id: i32) -> String {
    format!("/admin/customers/{}", id)
}

pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<CustomerRow>> {
    let page = state
        .services
        .customers
        .list(query.page_request(&state))
        .await?;
    Ok(success_response(page))
}

pub async fn new_customer_form() -> ApiResult<Value> {
    Ok(success_response(json!({
        "customer": Value::Null,
        "address_types": choices::<AddressType>(),
    })))
}

pub async fn create_customer(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<CustomerInput>,
) -> Result<Response, ServiceError> {
    let customer = state.services.customers.create(input).await?;
    Ok(see_other(customer_page(customer.id)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<CustomerDetail> {
    Ok(success_response(state.services.customers.detail(id).await?))
}

pub async fn edit_customer_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let customer = state.services.customers.get(id).await?;
    let addresses = state.services.customers.addresses(id).await?;
    Ok(success_response(json!({
        "customer": customer,
        "addresses": addresses,
        "address_types": choices::<AddressType>(),
    })))
}

/// A blank password keeps the current one.
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<CustomerInput>,
) -> Result<Response, ServiceError> {
    state.services.customers.update(id, input).await?;
    Ok(see_other(customer_page(id)))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.customers.delete(id).await?;
    Ok(see_other("/admin/customers"))
}

pub async fn add_address(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<AddressInput>,
) -> Result<Response, ServiceError> {
    state.services.customers.add_address(id, input).await?;
    Ok(see_other(customer_page(id)))
}

pub async fn delete_address(
    State(state): State<AppState>,
    Path((id, address_id)): Path<(i32, i32)>,
) -> Result<Response, ServiceError> {
    let owned = state
        .services
        .customers
        .addresses(id)
        .await?
        .iter()
        .any(|a| a.id == address_id);
    if !owned {
        return Err(ServiceError::not_found("Address", address_id));
    }
    state.services.customers.delete_address(address_id).await?;
    Ok(see_other(customer_page(id)))
}

pub async fn upload_picture(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let upload = read_upload(multipart).await?;
    state
        .services
        .customers
        .upload_picture(id, &upload.file_name, &upload.bytes)
        .await?;
    Ok(see_other(customer_page(id)))
}

pub async fn clear_picture(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.customers.clear_picture(id).await?;
    Ok(see_other(customer_page(id)))
}
