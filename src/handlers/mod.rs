pub mod brands;
pub mod categories;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod members;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod reviews;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::media::MediaStore;
use crate::services::{
    brands::BrandService, categories::CategoryService, customers::CustomerService,
    dashboard::DashboardService, inventory::InventoryService, members::MemberService,
    orders::OrderService, products::ProductService, promotions::PromotionService,
    reviews::ReviewService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub brands: Arc<BrandService>,
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub inventory: Arc<InventoryService>,
    pub customers: Arc<CustomerService>,
    pub members: Arc<MemberService>,
    pub orders: Arc<OrderService>,
    pub promotions: Arc<PromotionService>,
    pub reviews: Arc<ReviewService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<MediaStore>, config: &AppConfig) -> Self {
        let threshold = config.low_stock_threshold;
        Self {
            brands: Arc::new(BrandService::new(db.clone())),
            categories: Arc::new(CategoryService::new(db.clone())),
            products: Arc::new(ProductService::new(db.clone(), media.clone(), threshold)),
            inventory: Arc::new(InventoryService::new(db.clone(), threshold)),
            customers: Arc::new(CustomerService::new(db.clone(), media.clone())),
            members: Arc::new(MemberService::new(db.clone(), media)),
            orders: Arc::new(OrderService::new(db.clone())),
            promotions: Arc::new(PromotionService::new(db.clone())),
            reviews: Arc::new(ReviewService::new(db.clone())),
            dashboard: Arc::new(DashboardService::new(db, threshold)),
        }
    }
}
