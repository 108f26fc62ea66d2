mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};

use fashion_backoffice::{
    entities::{address, order, review, AddressType, DiscountType, OrderStatus, PaymentStatus},
    errors::ServiceError,
    services::{
        customers::{verify_password, AddressInput, CustomerInput},
        members::MemberInput,
        orders::{ApplyPromotionInput, OrderInput, OrderItemInput},
        promotions::{PromotionInput, PromotionState},
        reviews::ReviewInput,
        PageRequest,
    },
};

use common::TestApp;

fn address_input(address_type: AddressType, is_default: bool) -> AddressInput {
    AddressInput {
        address_line1: "12 Harbor Road".to_string(),
        address_line2: None,
        city: "Portland".to_string(),
        state_province: Some("OR".to_string()),
        postal_code: "97201".to_string(),
        country: "US".to_string(),
        address_type,
        is_default,
    }
}

fn order_for(customer_id: i32, payment_status: PaymentStatus) -> OrderInput {
    OrderInput {
        customer_id: Some(customer_id),
        shipping_address_id: None,
        billing_address_id: None,
        order_status: OrderStatus::Processing,
        payment_status,
        shipping_method: Some("Standard".to_string()),
        tracking_number: None,
    }
}

#[tokio::test]
async fn customer_email_is_unique_ignoring_case() {
    let app = TestApp::new().await;
    app.customer("Alice", "alice@example.com").await;

    let err = app
        .state
        .services
        .customers
        .create(CustomerInput {
            first_name: "Other".to_string(),
            last_name: "Alice".to_string(),
            email: "ALICE@example.com".to_string(),
            password: Some("another secret".to_string()),
            phone_number: None,
            notes: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.field_errors().expect("field errors").get("email"),
        Some("A customer with this email already exists.")
    );
}

#[tokio::test]
async fn password_is_hashed_and_kept_when_update_omits_it() {
    let app = TestApp::new().await;
    let customers = &app.state.services.customers;
    let alice = app.customer("Alice", "alice@example.com").await;
    assert_ne!(alice.password_hash, "correct horse");
    assert!(verify_password(&alice.password_hash, "correct horse"));

    let mut input = CustomerInput {
        first_name: "Alicia".to_string(),
        last_name: "Tester".to_string(),
        email: "alice@example.com".to_string(),
        password: None,
        phone_number: Some("+1-555-0101".to_string()),
        notes: None,
    };
    let updated = customers.update(alice.id, input.clone()).await.unwrap();
    assert_eq!(updated.first_name, "Alicia");
    assert_eq!(updated.password_hash, alice.password_hash);

    input.password = Some("brand new secret".to_string());
    let updated = customers.update(alice.id, input.clone()).await.unwrap();
    assert!(verify_password(&updated.password_hash, "brand new secret"));
    assert!(!verify_password(&updated.password_hash, "correct horse"));

    input.email = "second@example.com".to_string();
    input.password = None;
    let err = customers.create(input).await.unwrap_err();
    assert!(err.field_errors().expect("field errors").contains("password"));
}

#[tokio::test]
async fn new_default_address_replaces_previous_default_of_same_type() {
    let app = TestApp::new().await;
    let customers = &app.state.services.customers;
    let alice = app.customer("Alice", "alice@example.com").await;

    let first = customers
        .add_address(alice.id, address_input(AddressType::Shipping, true))
        .await
        .unwrap();
    let billing = customers
        .add_address(alice.id, address_input(AddressType::Billing, true))
        .await
        .unwrap();
    let second = customers
        .add_address(alice.id, address_input(AddressType::Shipping, true))
        .await
        .unwrap();

    let addresses = customers.addresses(alice.id).await.unwrap();
    let is_default = |id: i32| addresses.iter().find(|a| a.id == id).map(|a| a.is_default);
    assert_eq!(is_default(first.id), Some(false));
    assert_eq!(is_default(second.id), Some(true));
    assert_eq!(is_default(billing.id), Some(true));
}

#[tokio::test]
async fn detail_reports_order_statistics_and_premium_status() {
    let app = TestApp::new().await;
    let orders = &app.state.services.orders;
    let alice = app.customer("Alice", "alice@example.com").await;
    let coat = app.product("Coat", dec!(300.00)).await;
    let coat_m = app.variant(coat.id, "Camel", "M", 10).await;

    let detail = app.state.services.customers.detail(alice.id).await.unwrap();
    assert_eq!(detail.stats.total_orders, 0);
    assert_eq!(detail.stats.total_spent, dec!(0));
    assert!(!detail.stats.is_premium);
    assert_eq!(detail.profile_picture_url, "/static/images/default_profile.png");

    let first = orders.create(order_for(alice.id, PaymentStatus::Paid)).await.unwrap();
    orders
        .add_item(first.id, OrderItemInput { variant_id: coat_m.id, quantity: 2 })
        .await
        .unwrap();
    let second = orders.create(order_for(alice.id, PaymentStatus::Pending)).await.unwrap();
    orders
        .add_item(second.id, OrderItemInput { variant_id: coat_m.id, quantity: 2 })
        .await
        .unwrap();

    let detail = app.state.services.customers.detail(alice.id).await.unwrap();
    assert_eq!(detail.stats.total_orders, 2);
    assert_eq!(detail.stats.total_spent, dec!(1200.00));
    assert_eq!(detail.stats.average_order_value, dec!(600.00));
    assert!(detail.stats.is_premium);
    assert!(detail.stats.last_order_date.is_some());
    assert_eq!(detail.orders[0].id, second.id);
}

#[tokio::test]
async fn deleting_a_customer_removes_orders_addresses_and_reviews() {
    let app = TestApp::new().await;
    let alice = app.customer("Alice", "alice@example.com").await;
    let bob = app.customer("Bob", "bob@example.com").await;
    let tee = app.product("Tee", dec!(20.00)).await;
    let tee_m = app.variant(tee.id, "White", "M", 10).await;

    let shipping = app
        .state
        .services
        .customers
        .add_address(alice.id, address_input(AddressType::Shipping, true))
        .await
        .unwrap();
    let mut input = order_for(alice.id, PaymentStatus::Paid);
    input.shipping_address_id = Some(shipping.id);
    let alices_order = app.state.services.orders.create(input).await.unwrap();
    app.state
        .services
        .orders
        .add_item(alices_order.id, OrderItemInput { variant_id: tee_m.id, quantity: 1 })
        .await
        .unwrap();
    app.state.services.orders.create(order_for(bob.id, PaymentStatus::Paid)).await.unwrap();
    app.state
        .services
        .reviews
        .create(ReviewInput {
            product_id: tee.id,
            customer_id: Some(alice.id),
            rating: 4,
            review_text: None,
            is_approved: true,
        })
        .await
        .unwrap();

    app.state.services.customers.delete(alice.id).await.unwrap();

    let db = &*app.state.db;
    let remaining = order::Entity::find().all(db).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].customer_id, Some(bob.id));
    assert_eq!(address::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(review::Entity::find().count(db).await.unwrap(), 0);
    assert_matches!(
        app.state.services.customers.get(alice.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deleting_an_address_removes_orders_shipped_to_it() {
    let app = TestApp::new().await;
    let customers = &app.state.services.customers;
    let alice = app.customer("Alice", "alice@example.com").await;
    let shipping = customers
        .add_address(alice.id, address_input(AddressType::Shipping, true))
        .await
        .unwrap();

    let mut input = order_for(alice.id, PaymentStatus::Pending);
    input.shipping_address_id = Some(shipping.id);
    app.state.services.orders.create(input).await.unwrap();
    app.state
        .services
        .orders
        .create(order_for(alice.id, PaymentStatus::Pending))
        .await
        .unwrap();

    let owner = customers.delete_address(shipping.id).await.unwrap();
    assert_eq!(owner, alice.id);
    let db = &*app.state.db;
    assert_eq!(order::Entity::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn profile_picture_upload_and_clear() {
    let app = TestApp::new().await;
    let customers = &app.state.services.customers;
    let alice = app.customer("Alice", "alice@example.com").await;

    let with_picture = customers
        .upload_picture(alice.id, "me.jpg", b"jpeg bytes")
        .await
        .unwrap();
    let stored = with_picture.profile_picture.clone().expect("picture stored");
    assert!(stored.starts_with("profile_pics/"));
    assert!(app.state.media.root().join(&stored).exists());

    let cleared = customers.clear_picture(alice.id).await.unwrap();
    assert!(cleared.profile_picture.is_none());
    assert!(!app.state.media.root().join(&stored).exists());
}

#[tokio::test]
async fn members_are_listed_newest_first_with_unique_email() {
    let app = TestApp::new().await;
    let members = &app.state.services.members;
    let member = |first: &str, email: &str| MemberInput {
        first_name: first.to_string(),
        last_name: "Staff".to_string(),
        email: email.to_string(),
        phone_number: None,
        date_of_birth: None,
        bio: None,
    };

    let maya = members.create(member("Maya", "maya@example.com")).await.unwrap();
    let tom = members.create(member("Tom", "tom@example.com")).await.unwrap();

    let err = members.create(member("Again", "MAYA@example.com")).await.unwrap_err();
    assert_matches!(err, ServiceError::UniquenessConflict { ref field, .. } if field == "email");

    let page = members.list(PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].member.id, tom.id);
    assert_eq!(page.items[1].full_name, "Maya Staff");

    let view = members.detail(maya.id).await.unwrap();
    assert_eq!(view.profile_picture_url, "/static/images/default_member_profile.png");
}

#[tokio::test]
async fn promotion_usage_is_reported_and_limits_enforced() {
    let app = TestApp::new().await;
    let now = Utc::now();
    let alice = app.customer("Alice", "alice@example.com").await;
    let tee = app.product("Tee", dec!(40.00)).await;
    let tee_m = app.variant(tee.id, "White", "M", 50).await;

    let promotions = &app.state.services.promotions;
    let promo = promotions
        .create(PromotionInput {
            promo_code: "FIVEOFF".to_string(),
            description: None,
            discount_type: DiscountType::FixedAmount,
            discount_value: dec!(5),
            start_date: now - Duration::hours(1),
            end_date: now + Duration::days(7),
            min_order_amount: None,
            usage_limit: None,
            per_customer_limit: Some(1),
            is_active: true,
        })
        .await
        .unwrap();

    let orders = &app.state.services.orders;
    let apply = ApplyPromotionInput {
        promotion_id: promo.id,
        discount_applied: None,
    };
    let first = orders.create(order_for(alice.id, PaymentStatus::Paid)).await.unwrap();
    orders
        .add_item(first.id, OrderItemInput { variant_id: tee_m.id, quantity: 1 })
        .await
        .unwrap();
    orders.apply_promotion(first.id, apply.clone(), now).await.unwrap();

    let second = orders.create(order_for(alice.id, PaymentStatus::Paid)).await.unwrap();
    orders
        .add_item(second.id, OrderItemInput { variant_id: tee_m.id, quantity: 1 })
        .await
        .unwrap();
    let err = orders.apply_promotion(second.id, apply, now).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationFailed(_));

    let detail = promotions.detail(promo.id, now).await.unwrap();
    assert_eq!(detail.state, PromotionState::Running);
    assert_eq!(detail.times_used, 1);
    assert_eq!(detail.total_discount, dec!(5));
    assert_eq!(
        PromotionState::of(&detail.promotion, now + Duration::days(8)),
        PromotionState::Expired
    );

    let err = promotions
        .create(PromotionInput {
            promo_code: "FIVEOFF".to_string(),
            description: None,
            discount_type: DiscountType::FreeShipping,
            discount_value: dec!(1),
            start_date: now,
            end_date: now + Duration::days(1),
            min_order_amount: None,
            usage_limit: None,
            per_customer_limit: None,
            is_active: false,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::UniquenessConflict { ref field, .. } if field == "promo_code");

    // deleting the promotion drops its applications, orders stay
    promotions.delete(promo.id).await.unwrap();
    let detail = orders.detail(first.id).await.unwrap();
    assert!(detail.applied_promotions.is_empty());
    assert_eq!(detail.order.total_amount, dec!(40.00));
}
