#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fashion_backoffice::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{brand, category, customer, product, product_variant},
    services::{
        brands::BrandInput, categories::CategoryInput, customers::CustomerInput,
        inventory::VariantBatchInput, products::ProductInput,
    },
    AppState,
};

/// Application state over a fresh in-memory SQLite database with the schema
/// applied, plus a router sharing that state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().expect("media dir");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.media_root = media.path().to_string_lossy().into_owned();
        cfg.max_upload_bytes = 64 * 1024;

        let pool = db::establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone());
        Self {
            router,
            state,
            _media: media,
        }
    }

    pub async fn request(&self, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build request");
        self.send(request).await
    }

    /// Posts `application/x-www-form-urlencoded` pairs the way a browser form does.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("failed to build request");
        self.send(request).await
    }

    /// Posts one file under `image` plus plain text fields as `multipart/form-data`.
    pub async fn post_image(
        &self,
        uri: &str,
        file_name: &str,
        bytes: &[u8],
        fields: &[(&str, &str)],
    ) -> Response {
        const BOUNDARY: &str = "backoffice-test-boundary";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn brand(&self, name: &str) -> brand::Model {
        self.state
            .services
            .brands
            .create(BrandInput {
                brand_name: name.to_string(),
                description: None,
                website_url: None,
            })
            .await
            .expect("create brand")
    }

    pub async fn category(&self, name: &str, parent: Option<i32>) -> category::Model {
        self.state
            .services
            .categories
            .create(CategoryInput {
                category_name: name.to_string(),
                parent_category_id: parent,
                description: None,
            })
            .await
            .expect("create category")
    }

    pub async fn product(&self, name: &str, price: Decimal) -> product::Model {
        self.state
            .services
            .products
            .create(ProductInput {
                product_name: name.to_string(),
                description: None,
                brand_id: None,
                category_id: None,
                gender: None,
                price,
                material: None,
                care_instructions: None,
                is_active: true,
            })
            .await
            .expect("create product")
    }

    /// One variant of `product` in a single size.
    pub async fn variant(
        &self,
        product_id: i32,
        color: &str,
        size: &str,
        stock: i32,
    ) -> product_variant::Model {
        self.state
            .services
            .inventory
            .create_batch(VariantBatchInput {
                product_id,
                color: color.to_string(),
                sizes: vec![size.to_string()],
                quantity_in_stock: stock,
            })
            .await
            .expect("create variant")
            .remove(0)
    }

    pub async fn customer(&self, first_name: &str, email: &str) -> customer::Model {
        self.state
            .services
            .customers
            .create(CustomerInput {
                first_name: first_name.to_string(),
                last_name: "Tester".to_string(),
                email: email.to_string(),
                password: Some("correct horse".to_string()),
                phone_number: None,
                notes: None,
            })
            .await
            .expect("create customer")
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
