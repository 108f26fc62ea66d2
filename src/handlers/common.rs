use axum::{
    body::Bytes,
    extract::Multipart,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::forms::Choice;
use crate::services::PageRequest;
use crate::{ApiResponse, AppState};

/// Successful form submissions answer with `303 See Other` to the next page.
pub fn see_other(location: impl AsRef<str>) -> Response {
    Redirect::to(location.as_ref()).into_response()
}

pub fn success_response<T: serde::Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Pagination parameters for list operations
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ListQuery {
    pub fn page_request(&self, state: &AppState) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(state.config.default_page_size),
        )
    }
}

/// Dropdown options for a list of rows.
pub fn options<T>(
    rows: &[T],
    id: impl Fn(&T) -> i32,
    label: impl Fn(&T) -> String,
) -> Vec<Choice> {
    rows.iter()
        .map(|row| Choice::new(id(row).to_string(), label(row)))
        .collect()
}

/// Lenient parse of an optional query value; blank or malformed means unset.
pub fn parse_opt<T: std::str::FromStr>(raw: &Option<String>) -> Option<T> {
    raw.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}

/// An uploaded file plus the plain fields posted alongside it.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
    pub fields: Vec<(String, String)>,
}

impl Upload {
    pub fn field(&self, name: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|(key, value)| key == name && !value.trim().is_empty())
            .map(|(_, value)| value.trim().to_string())
    }
}

pub const UPLOAD_FIELD: &str = "image";

/// Reads a multipart body holding one file under [`UPLOAD_FIELD`].
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, ServiceError> {
    let mut file = None;
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServiceError::BadRequest(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == UPLOAD_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ServiceError::BadRequest(err.body_text()))?;
            file = Some((file_name, bytes));
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| ServiceError::BadRequest(err.body_text()))?;
            fields.push((name, value));
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(ServiceError::field(UPLOAD_FIELD, "Select an image to upload."));
    };
    Ok(Upload {
        file_name,
        bytes,
        fields,
    })
}
