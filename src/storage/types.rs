//! Persistence Entities
//!
//! Plain serializable records shared by every storage backend. All ids are
//! opaque strings (uuid v4 unless derived, see [`cart_item_id`]), timestamps
//! are unix milliseconds, and money fields use [`Decimal`] so window
//! comparisons at the eligibility boundaries stay exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Generates a fresh opaque entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// --- Users ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
}

// --- Catalog ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub stock: i64,
    pub category_id: Option<String>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub stock: i64,
    pub category_id: Option<String>,
}

/// Partial product update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub stock: Option<i64>,
    pub category_id: Option<String>,
}

impl ProductUpdate {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = image_url.clone();
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category_id) = &self.category_id {
            product.category_id = Some(category_id.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCollection {
    pub name: String,
    pub slug: String,
}

// --- Orders ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
    /// Price captured at order time; later catalog edits don't rewrite history.
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: String,
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum()
    }
}

// --- Reviews, testimonials, banners ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub product_id: String,
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Testimonial {
    pub id: String,
    pub author: String,
    pub quote: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTestimonial {
    pub author: String,
    pub quote: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub link: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBanner {
    pub title: String,
    pub image_url: String,
    pub link: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial banner update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BannerUpdate {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub active: Option<bool>,
}

impl BannerUpdate {
    pub fn apply_to(&self, banner: &mut Banner) {
        if let Some(title) = &self.title {
            banner.title = title.clone();
        }
        if let Some(image_url) = &self.image_url {
            banner.image_url = image_url.clone();
        }
        if let Some(link) = &self.link {
            banner.link = Some(link.clone());
        }
        if let Some(active) = self.active {
            banner.active = active;
        }
    }
}

// --- Carts ---

/// A shopping cart. At least one of `user_id`/`session_id` is present
/// (enforced at creation by the cart service). Carts are created on first
/// access and never destroyed; abandoned carts simply persist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCart {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

/// A line item owned by exactly one cart.
///
/// The `(cart_id, product_id, is_free)` tuple is unique: the item id is
/// derived from it (see [`cart_item_id`]), so re-adding the same product
/// under the same free/paid status increments `quantity` instead of
/// creating a second row, in every backend, without a separate index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub is_free: bool,
    pub added_at: u64,
}

/// Deterministic cart-item id for the unique `(cart, product, is_free)` tuple.
pub fn cart_item_id(cart_id: &str, product_id: &str, is_free: bool) -> String {
    format!(
        "{}:{}:{}",
        cart_id,
        product_id,
        if is_free { "free" } else { "paid" }
    )
}

// --- Free-product configuration ---

/// Administrator-defined rule making a catalog product obtainable at no
/// charge while the cart subtotal sits inside `[min_order_value,
/// max_order_value]` (both bounds inclusive; a missing upper bound means
/// unbounded). Read-only from the storefront's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreeProduct {
    pub id: String,
    pub product_id: String,
    pub enabled: bool,
    pub min_order_value: Decimal,
    pub max_order_value: Option<Decimal>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFreeProduct {
    pub product_id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub min_order_value: Decimal,
    pub max_order_value: Option<Decimal>,
}
