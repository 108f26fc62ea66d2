//! Seed data script - populates the database with a demo fashion catalog
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 4 brands and a two-level category tree
//! - 8 products, each in two colors across the standard sizes
//! - 5 customers with shipping and billing addresses
//! - 2 staff members
//! - 2 promotions
//! - 20 orders spread over the last 60 days
//! - a handful of reviews

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tracing::info;

use fashion_backoffice::{
    config,
    db::{self, with_transaction},
    entities::{
        brand, customer, order, order_item, product, product_variant, AddressType, DiscountType,
        Gender, OrderStatus, PaymentStatus,
    },
    errors::ServiceError,
    handlers::AppServices,
    media::MediaStore,
    services::{
        brands::BrandInput,
        categories::CategoryInput,
        customers::{AddressInput, CustomerInput},
        inventory::VariantBatchInput,
        members::MemberInput,
        orders::recompute_order_total,
        products::ProductInput,
        promotions::PromotionInput,
        reviews::ReviewInput,
    },
};

const SIZES: [&str; 4] = ["S", "M", "L", "XL"];

#[derive(Parser)]
#[command(name = "seed-data", about = "Populate the back office with demo data")]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Seed even when the catalog already has brands
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    info!("=== Fashion Back Office Seed Data ===");
    info!("Connecting to database: {}", cfg.database_url);
    let pool = Arc::new(db::establish_connection_from_app_config(&cfg).await?);
    db::run_migrations(&pool).await?;

    if !cli.force && brand::Entity::find().count(pool.as_ref()).await? > 0 {
        info!("Catalog already has data; pass --force to seed anyway");
        return Ok(());
    }

    let media = Arc::new(MediaStore::from_config(&cfg));
    let services = AppServices::new(pool.clone(), media, &cfg);

    info!("Creating catalog...");
    let products = create_catalog(&services).await?;
    info!("  Created {} products", products.len());

    info!("Creating inventory...");
    let variants = create_variants(&services, &products).await?;
    info!("  Created {} variants", variants.len());

    info!("Creating customers...");
    let customers = create_customers(&services).await?;
    info!("  Created {} customers", customers.len());

    info!("Creating staff members...");
    create_members(&services).await?;

    info!("Creating promotions...");
    create_promotions(&services).await?;

    info!("Creating orders...");
    let order_count = create_orders(&pool, &variants, &customers).await?;
    info!("  Created {} orders with items", order_count);

    info!("Creating reviews...");
    let review_count = create_reviews(&services, &products, &customers).await?;
    info!("  Created {} reviews", review_count);

    info!("=== Seed Data Complete ===");
    info!("Try: curl http://{}:{}/admin/", cfg.host, cfg.port);
    Ok(())
}

async fn create_catalog(services: &AppServices) -> anyhow::Result<Vec<product::Model>> {
    let mut brands = Vec::new();
    for (name, site) in [
        ("Northline", "https://northline.example.com"),
        ("Atelier Rose", "https://atelier-rose.example.com"),
        ("Denim Works", "https://denimworks.example.com"),
        ("Little Steps", "https://littlesteps.example.com"),
    ] {
        brands.push(
            services
                .brands
                .create(BrandInput {
                    brand_name: name.to_string(),
                    description: None,
                    website_url: Some(site.to_string()),
                })
                .await?,
        );
    }

    let clothing = services
        .categories
        .create(category("Clothing", None))
        .await?;
    let tops = services
        .categories
        .create(category("Tops", Some(clothing.id)))
        .await?;
    let bottoms = services
        .categories
        .create(category("Bottoms", Some(clothing.id)))
        .await?;
    let outerwear = services
        .categories
        .create(category("Outerwear", Some(clothing.id)))
        .await?;

    let catalog = [
        ("Organic Cotton Tee", 0, tops.id, Gender::Unisex, dec!(24.99), "Cotton"),
        ("Linen Shirt", 1, tops.id, Gender::Women, dec!(59.00), "Linen"),
        ("Merino Crew Sweater", 0, tops.id, Gender::Men, dec!(89.50), "Merino wool"),
        ("Slim Fit Jeans", 2, bottoms.id, Gender::Men, dec!(79.99), "Denim"),
        ("Wide Leg Trousers", 1, bottoms.id, Gender::Women, dec!(69.00), "Viscose"),
        ("Kids Jogger", 3, bottoms.id, Gender::Kids, dec!(29.99), "Cotton fleece"),
        ("Quilted Jacket", 0, outerwear.id, Gender::Unisex, dec!(149.00), "Recycled nylon"),
        ("Wool Overcoat", 1, outerwear.id, Gender::Women, dec!(249.00), "Wool blend"),
    ];

    let mut products = Vec::new();
    for (name, brand_index, category_id, gender, price, material) in catalog {
        products.push(
            services
                .products
                .create(ProductInput {
                    product_name: name.to_string(),
                    description: Some(format!("{} from the seasonal collection.", name)),
                    brand_id: Some(brands[brand_index].id),
                    category_id: Some(category_id),
                    gender: Some(gender),
                    price,
                    material: Some(material.to_string()),
                    care_instructions: Some("Machine wash cold.".to_string()),
                    is_active: true,
                })
                .await?,
        );
    }
    Ok(products)
}

fn category(name: &str, parent: Option<i32>) -> CategoryInput {
    CategoryInput {
        category_name: name.to_string(),
        parent_category_id: parent,
        description: None,
    }
}

async fn create_variants(
    services: &AppServices,
    products: &[product::Model],
) -> anyhow::Result<Vec<product_variant::Model>> {
    let mut variants = Vec::new();
    for (i, product) in products.iter().enumerate() {
        for (color, stock) in [("Black", 25), ("Sand", (i as i32 * 3) % 12)] {
            let created = services
                .inventory
                .create_batch(VariantBatchInput {
                    product_id: product.id,
                    color: color.to_string(),
                    sizes: SIZES.iter().map(|s| s.to_string()).collect(),
                    quantity_in_stock: stock,
                })
                .await?;
            variants.extend(created);
        }
    }
    Ok(variants)
}

async fn create_customers(services: &AppServices) -> anyhow::Result<Vec<customer::Model>> {
    let people = [
        ("Alice", "Johnson", "alice@example.com", "Portland"),
        ("Bob", "Smith", "bob@example.com", "Denver"),
        ("Carol", "Williams", "carol@example.com", "Austin"),
        ("David", "Brown", "david@example.com", "Chicago"),
        ("Eva", "Martinez", "eva@example.com", "Miami"),
    ];

    let mut customers = Vec::new();
    for (i, (first, last, email, city)) in people.into_iter().enumerate() {
        let customer = services
            .customers
            .create(CustomerInput {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: email.to_string(),
                password: Some("demo-password".to_string()),
                phone_number: Some(format!("+1-555-01{:02}", i + 1)),
                notes: None,
            })
            .await?;
        for address_type in [AddressType::Shipping, AddressType::Billing] {
            services
                .customers
                .add_address(
                    customer.id,
                    AddressInput {
                        address_line1: format!("{} Market Street", 100 + i * 10),
                        address_line2: None,
                        city: city.to_string(),
                        state_province: None,
                        postal_code: format!("9{:04}", i * 111),
                        country: "United States".to_string(),
                        address_type,
                        is_default: true,
                    },
                )
                .await?;
        }
        customers.push(customer);
    }
    Ok(customers)
}

async fn create_members(services: &AppServices) -> anyhow::Result<()> {
    for (first, last, email, born) in [
        ("Maya", "Chen", "maya@backoffice.example.com", (1988, 4, 12)),
        ("Tom", "Okafor", "tom@backoffice.example.com", (1993, 11, 2)),
    ] {
        services
            .members
            .create(MemberInput {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: email.to_string(),
                phone_number: None,
                date_of_birth: NaiveDate::from_ymd_opt(born.0, born.1, born.2),
                bio: Some("Store operations".to_string()),
            })
            .await?;
    }
    Ok(())
}

async fn create_promotions(services: &AppServices) -> anyhow::Result<()> {
    let now = Utc::now();
    services
        .promotions
        .create(PromotionInput {
            promo_code: "WELCOME10".to_string(),
            description: Some("10% off a first order".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            start_date: now - Duration::days(30),
            end_date: now + Duration::days(60),
            min_order_amount: Some(dec!(50)),
            usage_limit: None,
            per_customer_limit: Some(1),
            is_active: true,
        })
        .await?;
    services
        .promotions
        .create(PromotionInput {
            promo_code: "WINTER25".to_string(),
            description: Some("25 off outerwear".to_string()),
            discount_type: DiscountType::FixedAmount,
            discount_value: dec!(25),
            start_date: now + Duration::days(14),
            end_date: now + Duration::days(45),
            min_order_amount: Some(dec!(150)),
            usage_limit: Some(200),
            per_customer_limit: None,
            is_active: true,
        })
        .await?;
    Ok(())
}

/// Orders are backdated, so they are written directly in one transaction
/// rather than through the order service, which stamps the current time.
async fn create_orders(
    db: &DatabaseConnection,
    variants: &[product_variant::Model],
    customers: &[customer::Model],
) -> anyhow::Result<usize> {
    let scenarios = [
        (OrderStatus::Pending, PaymentStatus::Pending, 0),
        (OrderStatus::Processing, PaymentStatus::Paid, 0),
        (OrderStatus::Processing, PaymentStatus::Paid, 1),
        (OrderStatus::Shipped, PaymentStatus::Paid, 3),
        (OrderStatus::Shipped, PaymentStatus::Paid, 6),
        (OrderStatus::Delivered, PaymentStatus::Paid, 9),
        (OrderStatus::Delivered, PaymentStatus::Paid, 14),
        (OrderStatus::Cancelled, PaymentStatus::Refunded, 17),
        (OrderStatus::Delivered, PaymentStatus::Paid, 22),
        (OrderStatus::Pending, PaymentStatus::Failed, 26),
        (OrderStatus::Delivered, PaymentStatus::Paid, 31),
        (OrderStatus::Delivered, PaymentStatus::Paid, 35),
        (OrderStatus::Delivered, PaymentStatus::Paid, 38),
        (OrderStatus::Delivered, PaymentStatus::Paid, 42),
        (OrderStatus::Cancelled, PaymentStatus::Refunded, 44),
        (OrderStatus::Delivered, PaymentStatus::Paid, 47),
        (OrderStatus::Delivered, PaymentStatus::Paid, 51),
        (OrderStatus::Delivered, PaymentStatus::Paid, 54),
        (OrderStatus::Delivered, PaymentStatus::Paid, 57),
        (OrderStatus::Delivered, PaymentStatus::Paid, 59),
    ];

    let prices: Vec<(i32, Decimal)> = {
        let products = product::Entity::find().all(db).await?;
        products.into_iter().map(|p| (p.id, p.price)).collect()
    };
    let variants = variants.to_vec();
    let customers = customers.to_vec();
    let now = Utc::now();

    let count = with_transaction(db, move |txn| {
        Box::pin(async move {
            for (i, (order_status, payment_status, days_ago)) in scenarios.iter().enumerate() {
                // every fifth order is a guest checkout
                let customer_id = (i % 5 != 4).then(|| customers[i % customers.len()].id);
                let order = order::ActiveModel {
                    customer_id: Set(customer_id),
                    order_date: Set(now - Duration::days(*days_ago) - Duration::hours(i as i64)),
                    total_amount: Set(Decimal::ZERO),
                    order_status: Set(*order_status),
                    payment_status: Set(*payment_status),
                    shipping_method: Set(Some("Standard".to_string())),
                    tracking_number: Set(matches!(
                        order_status,
                        OrderStatus::Shipped | OrderStatus::Delivered
                    )
                    .then(|| format!("1Z999AA{:08}", 10_000_000 + i))),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                for line in 0..(i % 3) + 1 {
                    let variant = &variants[(i * 7 + line * 3) % variants.len()];
                    let price = prices
                        .iter()
                        .find(|(id, _)| *id == variant.product_id)
                        .map(|(_, price)| *price)
                        .unwrap_or_default();
                    order_item::ActiveModel {
                        order_id: Set(order.id),
                        variant_id: Set(variant.id),
                        quantity: Set(line as i32 + 1),
                        price_at_purchase: Set(price),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }
                recompute_order_total(txn, order.id).await?;
            }
            Ok::<_, ServiceError>(scenarios.len())
        })
    })
    .await?;
    Ok(count)
}

async fn create_reviews(
    services: &AppServices,
    products: &[product::Model],
    customers: &[customer::Model],
) -> anyhow::Result<usize> {
    let reviews = [
        (0, Some(0), 5, "Soft and fits true to size."),
        (0, Some(1), 4, "Great tee, shrank a little."),
        (3, Some(2), 5, "Best jeans I have owned."),
        (6, Some(3), 3, "Warm but runs large."),
        (7, None, 4, "Lovely coat."),
    ];
    for (product_index, customer_index, rating, text) in reviews {
        services
            .reviews
            .create(ReviewInput {
                product_id: products[product_index].id,
                customer_id: customer_index.map(|c: usize| customers[c].id),
                rating,
                review_text: Some(text.to_string()),
                is_approved: rating >= 4,
            })
            .await?;
    }
    Ok(reviews.len())
}
