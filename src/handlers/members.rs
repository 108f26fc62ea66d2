use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use super::common::{read_upload, see_other, success_response, ListQuery};
use crate::errors::ServiceError;
use crate::forms::ValidForm;
use crate::services::{
    members::{MemberInput, MemberView},
    Page,
};
use crate::{ApiResult, AppState};

pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_members).post(create_member))
        .route("/new", get(new_member_form))
        .route("/:id", get(get_member))
        .route("/:id/edit", get(edit_member_form).post(update_member))
        .route("/:id/delete", post(delete_member))
        .route("/:id/picture", post(upload_picture))
        .route("/:id/picture/clear", post(clear_picture))
}

fn member_page(id: i32) -> String {
    format!("/admin/members/{}", id)
}

pub async fn list_members(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<MemberView>> {
    let page = state.services.members.list(query.page_request(&state)).await?;
    Ok(success_response(page))
}

pub async fn new_member_form() -> ApiResult<Value> {
    Ok(success_response(json!({ "member": Value::Null })))
}

pub async fn create_member(
    State(state): State<AppState>,
    ValidForm(input): ValidForm<MemberInput>,
) -> Result<Response, ServiceError> {
    let member = state.services.members.create(input).await?;
    Ok(see_other(member_page(member.id)))
}

pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<MemberView> {
    Ok(success_response(state.services.members.detail(id).await?))
}

pub async fn edit_member_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let member = state.services.members.detail(id).await?;
    Ok(success_response(json!({ "member": member })))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidForm(input): ValidForm<MemberInput>,
) -> Result<Response, ServiceError> {
    state.services.members.update(id, input).await?;
    Ok(see_other(member_page(id)))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.members.delete(id).await?;
    Ok(see_other("/admin/members"))
}

pub async fn upload_picture(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let upload = read_upload(multipart).await?;
    state
        .services
        .members
        .upload_picture(id, &upload.file_name, &upload.bytes)
        .await?;
    Ok(see_other(member_page(id)))
}

pub async fn clear_picture(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.members.clear_picture(id).await?;
    Ok(see_other(member_page(id)))
}
