mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use fashion_backoffice::{
    entities::{category, product, product_variant, review},
    errors::ServiceError,
    services::{
        brands::BrandInput,
        categories::CategoryInput,
        inventory::{VariantBatchInput, VariantInput},
        products::{ProductFilter, ProductStatusFilter},
        reviews::{ReviewInput, DUPLICATE_REVIEW},
        PageRequest,
    },
};

use common::TestApp;

#[tokio::test]
async fn brand_names_are_unique_ignoring_case() {
    let app = TestApp::new().await;
    let brands = &app.state.services.brands;
    let northline = app.brand("Northline").await;

    let err = brands
        .create(BrandInput {
            brand_name: "NORTHLINE".to_string(),
            description: None,
            website_url: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::UniquenessConflict { ref field, .. } if field == "brand_name");

    // renaming a brand to its own name in another case is fine
    let renamed = brands
        .update(
            northline.id,
            BrandInput {
                brand_name: "NorthLine".to_string(),
                description: Some("Outdoor basics".to_string()),
                website_url: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.brand_name, "NorthLine");
}

#[tokio::test]
async fn category_cannot_move_under_itself_or_a_descendant() {
    let app = TestApp::new().await;
    let categories = &app.state.services.categories;
    let clothing = app.category("Clothing", None).await;
    let tops = app.category("Tops", Some(clothing.id)).await;
    let tees = app.category("Tees", Some(tops.id)).await;

    let move_to = |parent: i32| CategoryInput {
        category_name: "Clothing".to_string(),
        parent_category_id: Some(parent),
        description: None,
    };

    let err = categories.update(clothing.id, move_to(clothing.id)).await.unwrap_err();
    let fields = err.field_errors().expect("field errors");
    assert_eq!(fields.get("parent_category"), Some("A category cannot be its own parent."));

    let err = categories.update(clothing.id, move_to(tees.id)).await.unwrap_err();
    assert!(err.field_errors().expect("field errors").contains("parent_category"));

    let err = categories.create(CategoryInput {
        category_name: "Sale".to_string(),
        parent_category_id: Some(9_999),
        description: None,
    })
    .await
    .unwrap_err();
    assert_matches!(err, ServiceError::ValidationFailed(_));
}

#[tokio::test]
async fn deleting_a_category_removes_subcategories_and_their_products() {
    let app = TestApp::new().await;
    let clothing = app.category("Clothing", None).await;
    let tops = app.category("Tops", Some(clothing.id)).await;
    let shoes = app.category("Shoes", None).await;

    let mut tee = app.product("Tee", dec!(20.00)).await;
    let mut input = fashion_backoffice::services::products::ProductInput {
        product_name: tee.product_name.clone(),
        description: None,
        brand_id: None,
        category_id: Some(tops.id),
        gender: None,
        price: tee.price,
        material: None,
        care_instructions: None,
        is_active: true,
    };
    tee = app.state.services.products.update(tee.id, input.clone()).await.unwrap();
    app.variant(tee.id, "White", "M", 5).await;

    let sneaker = app.product("Sneaker", dec!(90.00)).await;
    input.product_name = "Sneaker".to_string();
    input.category_id = Some(shoes.id);
    app.state.services.products.update(sneaker.id, input).await.unwrap();

    let deleted = app.state.services.categories.delete(clothing.id).await.unwrap();
    assert_eq!(deleted.category_name, "Clothing");

    let db = &*app.state.db;
    let remaining: Vec<String> = category::Entity::find()
        .all(db)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.category_name)
        .collect();
    assert_eq!(remaining, vec!["Shoes".to_string()]);
    assert!(product::Entity::find_by_id(tee.id).one(db).await.unwrap().is_none());
    assert!(product::Entity::find_by_id(sneaker.id).one(db).await.unwrap().is_some());
    assert_eq!(product_variant::Entity::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn batch_creation_builds_skus_per_size() {
    let app = TestApp::new().await;
    let tee = app.product("Tee", dec!(20.00)).await;

    let created = app
        .state
        .services
        .inventory
        .create_batch(VariantBatchInput {
            product_id: tee.id,
            color: "Navy Blue".to_string(),
            sizes: vec!["S".to_string(), "M".to_string()],
            quantity_in_stock: 12,
        })
        .await
        .unwrap();

    let skus: Vec<&str> = created.iter().map(|v| v.sku.as_str()).collect();
    assert_eq!(
        skus,
        vec![
            format!("PROD{:03}-NavyBlue-S", tee.id),
            format!("PROD{:03}-NavyBlue-M", tee.id),
        ]
    );
    assert!(created.iter().all(|v| v.quantity_in_stock == 12));
}

#[tokio::test]
async fn batch_with_a_taken_sku_creates_nothing() {
    let app = TestApp::new().await;
    let inventory = &app.state.services.inventory;
    let tee = app.product("Tee", dec!(20.00)).await;
    let existing = app.variant(tee.id, "Red", "M", 7).await;

    let err = inventory
        .create_batch(VariantBatchInput {
            product_id: tee.id,
            color: "Red".to_string(),
            sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
            quantity_in_stock: 3,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::UniquenessConflict { ref field, .. } if field == "sizes");

    let db = &*app.state.db;
    let variants = product_variant::Entity::find()
        .filter(product_variant::Column::ProductId.eq(tee.id))
        .all(db)
        .await
        .unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].id, existing.id);
    assert_eq!(variants[0].quantity_in_stock, 7);
}

#[tokio::test]
async fn editing_a_variant_regenerates_its_sku() {
    let app = TestApp::new().await;
    let inventory = &app.state.services.inventory;
    let tee = app.product("Tee", dec!(20.00)).await;
    let medium = app.variant(tee.id, "Red", "M", 7).await;
    app.variant(tee.id, "Red", "L", 7).await;

    // keeping its own SKU is not a clash
    let same = inventory
        .update(
            medium.id,
            VariantInput {
                product_id: None,
                color: "Red".to_string(),
                size: "M".to_string(),
                quantity_in_stock: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(same.sku, medium.sku);
    assert_eq!(same.quantity_in_stock, 2);

    let err = inventory
        .update(
            medium.id,
            VariantInput {
                product_id: None,
                color: "Red".to_string(),
                size: "L".to_string(),
                quantity_in_stock: 2,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::UniquenessConflict { ref field, .. } if field == "sku");

    let moved = inventory
        .update(
            medium.id,
            VariantInput {
                product_id: None,
                color: "Black".to_string(),
                size: "XL".to_string(),
                quantity_in_stock: 0,
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.sku, format!("PROD{:03}-Black-XL", tee.id));
}

#[tokio::test]
async fn variant_moved_to_another_product_takes_its_sku_prefix() {
    let app = TestApp::new().await;
    let inventory = &app.state.services.inventory;
    let tee = app.product("Tee", dec!(20.00)).await;
    let polo = app.product("Polo", dec!(35.00)).await;
    let stray = app.variant(tee.id, "White", "S", 4).await;

    let moved = inventory
        .update(
            stray.id,
            VariantInput {
                product_id: Some(polo.id),
                color: "White".to_string(),
                size: "S".to_string(),
                quantity_in_stock: 4,
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.product_id, polo.id);
    assert_eq!(moved.sku, format!("PROD{:03}-White-S", polo.id));
    assert!(inventory.for_product(tee.id).await.unwrap().is_empty());

    let err = inventory
        .update(
            stray.id,
            VariantInput {
                product_id: Some(9_999),
                color: "White".to_string(),
                size: "S".to_string(),
                quantity_in_stock: 4,
            },
        )
        .await
        .unwrap_err();
    let fields = err.field_errors().expect("field errors");
    assert!(fields.contains("product"));
    assert_eq!(inventory.get(stray.id).await.unwrap().product_id, polo.id);
}

#[tokio::test]
async fn low_stock_uses_the_configured_threshold() {
    let app = TestApp::new().await;
    let inventory = &app.state.services.inventory;
    let tee = app.product("Tee", dec!(20.00)).await;
    app.variant(tee.id, "Red", "S", 10).await;
    app.variant(tee.id, "Red", "M", 11).await;
    app.variant(tee.id, "Red", "L", 0).await;

    assert_eq!(inventory.low_stock_threshold(), 10);
    assert_eq!(inventory.low_stock_count().await.unwrap(), 2);

    let low = inventory.list(PageRequest::default(), true).await.unwrap();
    assert_eq!(low.total, 2);
    assert!(low.items.iter().all(|row| row.low_stock));
}

#[tokio::test]
async fn product_list_filters_by_text_sku_and_status() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let linen = app.product("Linen Shirt", dec!(59.00)).await;
    let jeans = app.product("Slim Jeans", dec!(79.00)).await;
    app.variant(jeans.id, "Indigo", "32", 4).await;

    let mut input = fashion_backoffice::services::products::ProductInput {
        product_name: "Linen Shirt".to_string(),
        description: Some("Breathable summer shirt".to_string()),
        brand_id: None,
        category_id: None,
        gender: None,
        price: dec!(59.00),
        material: None,
        care_instructions: None,
        is_active: false,
    };
    products.update(linen.id, input.clone()).await.unwrap();

    let by_name = ProductFilter {
        q: Some("summer".to_string()),
        ..Default::default()
    };
    let page = products.list(&by_name, PageRequest::default()).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].product.id, linen.id);

    let by_sku = ProductFilter {
        q: Some("Indigo-32".to_string()),
        ..Default::default()
    };
    let page = products.list(&by_sku, PageRequest::default()).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].product.id, jeans.id);
    assert_eq!(page.items[0].total_stock, 4);

    let active = ProductFilter {
        status: Some(ProductStatusFilter::Active),
        ..Default::default()
    };
    let page = products.list(&active, PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].product.id, jeans.id);

    input.is_active = true;
    products.update(linen.id, input).await.unwrap();
    let page = products.list(&active, PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn product_detail_falls_back_to_default_thumbnail_until_upload() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let tee = app.product("Tee", dec!(20.00)).await;

    let detail = products.detail(tee.id).await.unwrap();
    assert_eq!(detail.thumbnail_url, "/static/images/default_product.png");
    assert!(detail.average_rating.is_none());

    let image = products
        .upload_image(tee.id, "front.PNG", b"not really a png", Some("Front".to_string()))
        .await
        .unwrap();
    assert!(image.is_thumbnail);
    assert!(image.image.starts_with("product_images/"));
    assert!(app.state.media.root().join(&image.image).exists());

    let detail = products.detail(tee.id).await.unwrap();
    assert_eq!(detail.thumbnail_url, format!("/media/{}", image.image));

    let err = products
        .upload_image(tee.id, "notes.txt", b"hello", None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationFailed(_));

    products.delete(tee.id).await.unwrap();
    assert!(!app.state.media.root().join(&image.image).exists());
}

#[tokio::test]
async fn product_delete_succeeds_when_its_image_file_cannot_be_removed() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;
    let tee = app.product("Tee", dec!(20.00)).await;
    let image = products
        .upload_image(tee.id, "back.png", b"png", None)
        .await
        .unwrap();

    // swap the stored file for a directory so removal fails
    let on_disk = app.state.media.root().join(&image.image);
    std::fs::remove_file(&on_disk).unwrap();
    std::fs::create_dir(&on_disk).unwrap();

    let deleted = products.delete(tee.id).await.unwrap();
    assert_eq!(deleted.id, tee.id);
    assert_matches!(products.get(tee.id).await, Err(ServiceError::NotFound(_)));
    assert!(on_disk.is_dir());
}

#[tokio::test]
async fn one_review_per_customer_and_product() {
    let app = TestApp::new().await;
    let reviews = &app.state.services.reviews;
    let tee = app.product("Tee", dec!(20.00)).await;
    let alice = app.customer("Alice", "alice@example.com").await;

    let review = |customer_id: Option<i32>, rating: i32| ReviewInput {
        product_id: tee.id,
        customer_id,
        rating,
        review_text: None,
        is_approved: true,
    };

    let first = reviews.create(review(Some(alice.id), 5)).await.unwrap();
    let err = reviews.create(review(Some(alice.id), 3)).await.unwrap_err();
    assert_eq!(
        err.field_errors().expect("field errors").get("customer"),
        Some(DUPLICATE_REVIEW)
    );

    // editing the existing review is not a duplicate of itself
    reviews.update(first.id, review(Some(alice.id), 4)).await.unwrap();

    // anonymous reviews never clash
    reviews.create(review(None, 2)).await.unwrap();
    reviews.create(review(None, 3)).await.unwrap();

    let detail = app.state.services.products.detail(tee.id).await.unwrap();
    assert_eq!(detail.reviews.len(), 3);
    assert_eq!(detail.average_rating, Some(dec!(3.0)));

    let db = &*app.state.db;
    assert_eq!(review::Entity::find().count(db).await.unwrap(), 3);
}
