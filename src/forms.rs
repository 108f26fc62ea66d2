//! Form parsing and validation shared by every admin write operation.
//!
//! Handlers receive raw `application/x-www-form-urlencoded` pairs. Each entity
//! input implements [`ValidatedForm`], pulling typed values out of
//! [`FormFields`] and collecting every problem into one [`FieldErrors`] map
//! instead of stopping at the first failure.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Form,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_NUMBER: &str = "Enter a valid number.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";
pub const INVALID_DATE: &str = "Invalid date format. Please use YYYY-MM-DD.";
pub const INVALID_DATETIME: &str = "Invalid date format. Please use YYYY-MM-DDTHH:MM.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_URL: &str = "Website URL must start with http:// or https://.";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Ordered mapping from field name to the first error reported for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already has an error.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Same as [`FieldErrors::into_result`] but already lifted into a [`ServiceError`].
    pub fn check(self) -> Result<(), ServiceError> {
        self.into_result(()).map_err(ServiceError::ValidationFailed)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            if let Some(first) = errs.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", first.code));
                out.add(field, message);
            }
        }
        out
    }
}

/// An enumerated form choice rendered as `<option value=..>label</option>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Raw submitted form pairs plus the errors found while reading them.
#[derive(Debug, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
    errors: FieldErrors,
}

impl FormFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self {
            pairs,
            errors: FieldErrors::new(),
        }
    }

    /// First non-blank value submitted for `name`, trimmed.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    }

    /// Every non-blank value submitted for `name` (multi-select inputs).
    pub fn all(&self, name: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains(field)
    }

    pub fn required_text(&mut self, name: &str) -> String {
        match self.raw(name) {
            Some(value) => value.to_string(),
            None => {
                self.error(name, REQUIRED);
                String::new()
            }
        }
    }

    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.raw(name).map(str::to_string)
    }

    /// A checkbox is on when submitted with any value other than an explicit false.
    pub fn checkbox(&self, name: &str) -> bool {
        match self.raw(name) {
            Some(value) => !matches!(value.to_ascii_lowercase().as_str(), "false" | "off" | "0"),
            None => false,
        }
    }

    pub fn optional_decimal(&mut self, name: &str) -> Option<Decimal> {
        let raw = self.raw(name)?.to_string();
        match Decimal::from_str(&raw) {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(name, INVALID_NUMBER);
                None
            }
        }
    }

    pub fn required_decimal(&mut self, name: &str) -> Decimal {
        if self.raw(name).is_none() {
            self.error(name, REQUIRED);
            return Decimal::ZERO;
        }
        self.optional_decimal(name).unwrap_or_default()
    }

    /// Required decimal that must be strictly positive.
    pub fn positive_decimal(&mut self, name: &str, message: &str) -> Decimal {
        let value = self.required_decimal(name);
        if !self.has_error(name) && value <= Decimal::ZERO {
            self.error(name, message);
        }
        value
    }

    pub fn optional_int(&mut self, name: &str) -> Option<i64> {
        let raw = self.raw(name)?.to_string();
        match raw.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(name, INVALID_NUMBER);
                None
            }
        }
    }

    pub fn required_int(&mut self, name: &str) -> i64 {
        if self.raw(name).is_none() {
            self.error(name, REQUIRED);
            return 0;
        }
        self.optional_int(name).unwrap_or_default()
    }

    /// Optional integer that must be zero or more when present.
    pub fn optional_non_negative(&mut self, name: &str, message: &str) -> Option<i32> {
        let value = self.optional_int(name)?;
        match i32::try_from(value) {
            Ok(value) if value >= 0 => Some(value),
            _ => {
                self.error(name, message);
                None
            }
        }
    }

    /// Reference to another row by id, as posted by a `<select>`.
    pub fn optional_reference(&mut self, name: &str) -> Option<i32> {
        let value = self.optional_int(name)?;
        match i32::try_from(value) {
            Ok(id) if id > 0 => Some(id),
            _ => {
                self.error(name, INVALID_CHOICE);
                None
            }
        }
    }

    pub fn required_reference(&mut self, name: &str) -> i32 {
        if self.raw(name).is_none() {
            self.error(name, REQUIRED);
            return 0;
        }
        self.optional_reference(name).unwrap_or_default()
    }

    pub fn optional_choice<E: FromStr>(&mut self, name: &str) -> Option<E> {
        let raw = self.raw(name)?.to_string();
        match E::from_str(&raw) {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(name, INVALID_CHOICE);
                None
            }
        }
    }

    pub fn required_choice<E: FromStr + Default>(&mut self, name: &str) -> E {
        if self.raw(name).is_none() {
            self.error(name, REQUIRED);
            return E::default();
        }
        self.optional_choice(name).unwrap_or_default()
    }

    pub fn optional_date(&mut self, name: &str) -> Option<NaiveDate> {
        let raw = self.raw(name)?.to_string();
        match NaiveDate::parse_from_str(&raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                self.error(name, INVALID_DATE);
                None
            }
        }
    }

    /// `YYYY-MM-DDTHH:MM` as posted by a `datetime-local` input, read as UTC.
    pub fn required_datetime(&mut self, name: &str) -> DateTime<Utc> {
        let Some(raw) = self.raw(name).map(str::to_string) else {
            self.error(name, REQUIRED);
            return DateTime::<Utc>::default();
        };
        match NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT) {
            Ok(naive) => naive.and_utc(),
            Err(_) => {
                self.error(name, INVALID_DATETIME);
                DateTime::<Utc>::default()
            }
        }
    }

    pub fn required_email(&mut self, name: &str) -> String {
        let email = self.required_text(name);
        if !email.is_empty() && !validator::validate_email(email.as_str()) {
            self.error(name, INVALID_EMAIL);
        }
        email
    }

    /// Optional absolute http(s) URL.
    pub fn optional_url(&mut self, name: &str) -> Option<String> {
        let url = self.optional_text(name)?;
        let has_scheme = url.starts_with("http://") || url.starts_with("https://");
        if !has_scheme || !validator::validate_url(url.as_str()) {
            self.error(name, INVALID_URL);
        }
        Some(url)
    }

    /// Hands back the typed value when no field failed.
    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        self.errors.into_result(value)
    }
}

/// An entity input that can be built from submitted form fields.
pub trait ValidatedForm: Sized {
    fn from_form(form: FormFields) -> Result<Self, FieldErrors>;
}

/// Extractor that parses and validates a urlencoded body into `T`.
///
/// Malformed bodies are rejected with 400, invalid values with 422 and the
/// full field error map.
#[derive(Debug)]
pub struct ValidForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidForm<T>
where
    S: Send + Sync,
    T: ValidatedForm,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
        T::from_form(FormFields::new(pairs))
            .map(ValidForm)
            .map_err(ServiceError::ValidationFailed)
    }
}

/// Keeps only alphanumeric characters, as used in SKU segments.
pub fn alphanumeric(value: &str) -> String {
    value.chars().filter(|c| c.is_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn blank_required_text_is_reported() {
        let mut f = form(&[("name", "   ")]);
        assert_eq!(f.required_text("name"), "");
        let errors = f.finish(()).unwrap_err();
        assert_eq!(errors.get("name"), Some(REQUIRED));
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("price", "first");
        errors.add("price", "second");
        assert_eq!(errors.get("price"), Some("first"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn decimals_are_parsed_and_checked() {
        let mut f = form(&[("price", "19.99"), ("cost", "abc"), ("zero", "0")]);
        assert_eq!(f.required_decimal("price"), dec!(19.99));
        assert_eq!(f.optional_decimal("cost"), None);
        f.positive_decimal("zero", "Price must be greater than zero.");
        let errors = f.finish(()).unwrap_err();
        assert_eq!(errors.get("cost"), Some(INVALID_NUMBER));
        assert_eq!(errors.get("zero"), Some("Price must be greater than zero."));
        assert!(!errors.contains("price"));
    }

    #[test]
    fn multi_select_values_are_collected() {
        let f = form(&[("sizes", "S"), ("sizes", ""), ("sizes", "M")]);
        assert_eq!(f.all("sizes"), vec!["S".to_string(), "M".to_string()]);
    }

    #[test]
    fn dates_use_iso_formats() {
        let mut f = form(&[
            ("dob", "1990-04-01"),
            ("bad", "01/04/1990"),
            ("start", "2024-05-01T09:30"),
        ]);
        assert_eq!(
            f.optional_date("dob"),
            NaiveDate::from_ymd_opt(1990, 4, 1)
        );
        assert_eq!(f.optional_date("bad"), None);
        let start = f.required_datetime("start");
        assert_eq!(start.to_rfc3339(), "2024-05-01T09:30:00+00:00");
        let errors = f.finish(()).unwrap_err();
        assert_eq!(errors.get("bad"), Some(INVALID_DATE));
    }

    #[test]
    fn references_must_be_positive_ids() {
        let mut f = form(&[("brand", "0"), ("category", "4")]);
        assert_eq!(f.optional_reference("brand"), None);
        assert_eq!(f.optional_reference("category"), Some(4));
        assert_eq!(f.optional_reference("missing"), None);
        let errors = f.finish(()).unwrap_err();
        assert_eq!(errors.get("brand"), Some(INVALID_CHOICE));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn urls_require_http_scheme() {
        let mut f = form(&[("ok", "https://brand.example"), ("bad", "ftp://brand.example")]);
        assert!(f.optional_url("ok").is_some());
        f.optional_url("bad");
        let errors = f.finish(()).unwrap_err();
        assert_eq!(errors.get("bad"), Some(INVALID_URL));
        assert!(!errors.contains("ok"));
    }

    #[test]
    fn checkbox_reads_presence() {
        let f = form(&[("is_active", "on"), ("is_default", "false")]);
        assert!(f.checkbox("is_active"));
        assert!(!f.checkbox("is_default"));
        assert!(!f.checkbox("missing"));
    }

    #[test]
    fn alphanumeric_strips_punctuation() {
        assert_eq!(alphanumeric("Navy Blue!"), "NavyBlue");
        assert_eq!(alphanumeric("X-L"), "XL");
    }
}
