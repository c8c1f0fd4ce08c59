//! Storefront HTTP Protocol

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

pub const ENDPOINT_PRODUCTS: &str = "/api/products";
pub const ENDPOINT_CATEGORIES: &str = "/api/categories";
pub const ENDPOINT_COLLECTIONS: &str = "/api/collections";
pub const ENDPOINT_BANNERS: &str = "/api/banners";
pub const ENDPOINT_TESTIMONIALS: &str = "/api/testimonials";
pub const ENDPOINT_ORDERS: &str = "/api/orders";

// --- Data Transfer Objects ---

/// One requested order line; the unit price is captured server-side from
/// the current catalog.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub items: Vec<OrderItemRequest>,
}

/// Body of `POST /api/products/:id/reviews`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
}
