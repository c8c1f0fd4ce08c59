//! Cart HTTP Protocol
//!
//! Request/response DTOs for the cart endpoints. Eligibility failures are
//! reported through the shared error body (`error::ErrorResponse`) with a
//! message naming the rule that rejected the mutation.

use serde::{Deserialize, Serialize};

use crate::storage::types::CartItem;

// --- API Endpoints ---

/// Cart lookup/creation endpoint.
pub const ENDPOINT_CART: &str = "/api/cart";
/// Cart item collection endpoint; items are addressed by id below it.
pub const ENDPOINT_CART_ITEMS: &str = "/api/cart/items";

// --- Data Transfer Objects ---

/// Body of `POST /api/cart`. At least one identifier must be present.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCartRequest {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

/// Body of `POST /api/cart/items`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: u32,
    /// Free-flagged items pass the eligibility window before any write.
    #[serde(default)]
    pub is_free: bool,
}

/// Body of `PUT /api/cart/items/:id`. Quantity 0 removes the item.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Response of `PUT /api/cart/items/:id`: the updated item, or `removed`
/// when the quantity dropped to zero.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateItemResponse {
    pub removed: bool,
    pub item: Option<CartItem>,
}
