mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};

use fashion_backoffice::entities::{brand, category, order, product_variant};

use common::{body_json, location, TestApp};

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"]["status"], "up");

    let response = app.request(Method::GET, "/health/live").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn brand_form_redirects_and_rejects_duplicates() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/admin/brands",
            &[
                ("brand_name", "Atelier Rose"),
                ("website_url", "https://atelier-rose.example.com"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/brands");

    let response = app
        .post_form("/admin/brands", &[("brand_name", "atelier rose")])
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(
        body["field_errors"]["brand_name"],
        "A brand with this name already exists."
    );

    let db = &*app.state.db;
    assert_eq!(brand::Entity::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn invalid_product_form_returns_every_field_error() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/admin/products",
            &[("product_name", "  "), ("price", "-3"), ("brand", "42")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let fields = &body["field_errors"];
    assert_eq!(fields["product_name"], "This field is required.");
    assert_eq!(fields["price"], "Price must be greater than zero.");
}

#[tokio::test]
async fn product_create_then_detail_in_envelope() {
    let app = TestApp::new().await;
    let northline = app.brand("Northline").await;
    let brand_id = northline.id.to_string();

    let response = app
        .post_form(
            "/admin/products",
            &[
                ("product_name", "Rain Jacket"),
                ("price", "129.90"),
                ("brand", brand_id.as_str()),
                ("gender", "U"),
                ("is_active", "on"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let detail_url = location(&response).to_string();
    assert!(detail_url.starts_with("/admin/products/"));

    let response = app.request(Method::GET, &detail_url).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["product"]["product_name"], "Rain Jacket");
    assert_eq!(body["data"]["brand"]["brand_name"], "Northline");
    assert_eq!(body["data"]["total_stock"], 0);

    let response = app
        .request(Method::GET, "/admin/products?status=active&page=1")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn product_image_upload_sets_thumbnail() {
    let app = TestApp::new().await;
    let tee = app.product("Tee", dec!(20.00)).await;
    let uri = format!("/admin/products/{}/images", tee.id);

    let response = app
        .post_image(&uri, "front.png", b"\x89PNG fake", &[("alt_text", "Front view")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/admin/products/{}", tee.id));

    let detail = app.state.services.products.detail(tee.id).await.unwrap();
    assert_eq!(detail.images.len(), 1);
    assert_eq!(detail.images[0].image.alt_text.as_deref(), Some("Front view"));
    assert!(detail.thumbnail_url.starts_with("/media/product_images/"));

    let response = app.post_image(&uri, "notes.txt", b"plain", &[]).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn category_delete_answers_with_json_and_405_for_other_verbs() {
    let app = TestApp::new().await;
    let outerwear = app.category("Outerwear", None).await;
    let uri = format!("/admin/categories/{}/delete", outerwear.id);

    let response = app.request(Method::POST, &uri).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let response = app.request(Method::GET, &uri).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app.request(Method::DELETE, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Category 'Outerwear' deleted successfully!");

    let db = &*app.state.db;
    assert_eq!(category::Entity::find().count(db).await.unwrap(), 0);

    let response = app.request(Method::DELETE, &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let knitwear = app.category("Knitwear", None).await;
    let response = app
        .request(Method::DELETE, &format!("/admin/categories/{}", knitwear.id))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Category 'Knitwear' deleted successfully!");
}

#[tokio::test]
async fn inventory_batch_form_creates_one_variant_per_size() {
    let app = TestApp::new().await;
    let tee = app.product("Tee", dec!(20.00)).await;
    let product_id = tee.id.to_string();

    let response = app
        .post_form(
            "/admin/inventory",
            &[
                ("product", product_id.as_str()),
                ("color", "Olive"),
                ("sizes", "S"),
                ("sizes", "M"),
                ("sizes", "L"),
                ("quantity_in_stock", "8"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/inventory");

    let db = &*app.state.db;
    assert_eq!(product_variant::Entity::find().count(db).await.unwrap(), 3);

    let response = app
        .post_form(
            "/admin/inventory",
            &[("product", product_id.as_str()), ("color", "Olive")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["field_errors"]["sizes"], "Select at least one size.");

    let response = app.request(Method::GET, "/admin/inventory?low_stock=on").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 3);
}

#[tokio::test]
async fn order_forms_keep_total_in_sync() {
    let app = TestApp::new().await;
    let boots = app.product("Chelsea Boots", dec!(149.00)).await;
    let boots_42 = app.variant(boots.id, "Black", "42", 2).await;

    let response = app
        .post_form(
            "/admin/orders",
            &[("order_status", "PENDING"), ("payment_status", "PAID")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let order_url = location(&response).to_string();

    let variant_id = boots_42.id.to_string();
    let response = app
        .post_form(
            &format!("{}/items", order_url),
            &[("variant", variant_id.as_str()), ("quantity", "3")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["field_errors"]["quantity"], "Not enough stock. Only 2 available.");

    let response = app
        .post_form(
            &format!("{}/items", order_url),
            &[("variant", variant_id.as_str()), ("quantity", "2")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), order_url);

    let response = app.request(Method::GET, &order_url).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));

    let order_id: i32 = order_url
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("order id in redirect");
    let detail = app.state.services.orders.detail(order_id).await.unwrap();
    assert_eq!(detail.order.total_amount, dec!(298.00));

    let response = app.post_form(&format!("{}/delete", order_url), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/orders");
    let db = &*app.state.db;
    assert_eq!(order::Entity::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn customer_picture_upload_is_served_from_media() {
    let app = TestApp::new().await;
    let alice = app.customer("Alice", "alice@example.com").await;

    let response = app
        .post_image(
            &format!("/admin/customers/{}/picture", alice.id),
            "me.gif",
            b"GIF89a",
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let detail = app.state.services.customers.detail(alice.id).await.unwrap();
    let url = detail.profile_picture_url;
    assert!(url.starts_with("/media/profile_pics/"));

    let response = app.request(Method::GET, &url).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let app = TestApp::new().await;
    for uri in [
        "/admin/brands/99",
        "/admin/products/99",
        "/admin/orders/99",
        "/admin/customers/99",
        "/admin/members/99",
        "/admin/promotions/99",
        "/admin/reviews/99",
    ] {
        let response = app.request(Method::GET, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn dashboard_is_served_at_admin_root() {
    let app = TestApp::new().await;
    app.category("Tops", None).await;

    let response = app.request(Method::GET, "/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_categories"], 1);
    assert_eq!(body["data"]["pending_orders"], 0);
}
