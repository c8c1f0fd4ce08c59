//! Administration HTTP Protocol

use serde::{Deserialize, Serialize};

use crate::storage::types::OrderStatus;

// --- API Endpoints ---

pub const ENDPOINT_ADMIN_FREE_PRODUCTS: &str = "/api/admin/free-products";
pub const ENDPOINT_ADMIN_PRODUCTS: &str = "/api/admin/products";
pub const ENDPOINT_ADMIN_CATEGORIES: &str = "/api/admin/categories";
pub const ENDPOINT_ADMIN_COLLECTIONS: &str = "/api/admin/collections";
pub const ENDPOINT_ADMIN_BANNERS: &str = "/api/admin/banners";
pub const ENDPOINT_ADMIN_TESTIMONIALS: &str = "/api/admin/testimonials";

// --- Data Transfer Objects ---

/// Body of `PUT /api/admin/orders/:id/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}
