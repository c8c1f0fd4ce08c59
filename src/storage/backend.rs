//! Storage Contract
//!
//! One uniform persistence interface over every backend. Lookups that miss
//! return `Ok(None)`: an absent record is a normal outcome, never an error.
//! Genuine backend failures (connection loss, encoding problems) surface as
//! [`StorageError`] and are what the failover wrapper reacts to.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;

use super::types::*;

#[derive(Debug, Error)]
pub enum StorageError {
    /// A backend-level failure (I/O, encoding). Carries the underlying
    /// message; the operation may still succeed on the fallback backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// Both the selected backend and the in-memory fallback failed.
    #[error("storage operation failed for {op}")]
    OperationFailed { op: &'static str },
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(format!("encoding: {err}"))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Type-erased future for a single storage operation, used by the failover
/// wrapper to run the same call against either backend.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = StorageResult<T>> + Send + 'a>>;

/// The uniform persistence interface.
///
/// Implemented by the in-memory store, the Redis-backed store, and the
/// failover facade that wraps the two. Every method is one entity/operation
/// pair; update methods return `Ok(None)` when the target record is absent,
/// deletes report whether a record was removed.
#[async_trait]
pub trait Storage: Send + Sync {
    // --- Users ---
    async fn create_user(&self, new: NewUser) -> StorageResult<User>;
    async fn get_user(&self, id: &str) -> StorageResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    // --- Products ---
    async fn create_product(&self, new: NewProduct) -> StorageResult<Product>;
    async fn get_product(&self, id: &str) -> StorageResult<Option<Product>>;
    async fn list_products(&self) -> StorageResult<Vec<Product>>;
    async fn update_product(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> StorageResult<Option<Product>>;
    async fn delete_product(&self, id: &str) -> StorageResult<bool>;

    // --- Categories ---
    async fn create_category(&self, new: NewCategory) -> StorageResult<Category>;
    async fn get_category(&self, id: &str) -> StorageResult<Option<Category>>;
    async fn list_categories(&self) -> StorageResult<Vec<Category>>;
    async fn delete_category(&self, id: &str) -> StorageResult<bool>;

    // --- Collections ---
    async fn create_collection(&self, new: NewCollection) -> StorageResult<Collection>;
    async fn get_collection(&self, id: &str) -> StorageResult<Option<Collection>>;
    async fn list_collections(&self) -> StorageResult<Vec<Collection>>;
    async fn delete_collection(&self, id: &str) -> StorageResult<bool>;

    // --- Orders ---
    async fn create_order(&self, new: NewOrder) -> StorageResult<Order>;
    async fn get_order(&self, id: &str) -> StorageResult<Option<Order>>;
    async fn list_orders_for_user(&self, user_id: &str) -> StorageResult<Vec<Order>>;
    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> StorageResult<Option<Order>>;

    // --- Reviews ---
    async fn create_review(&self, new: NewReview) -> StorageResult<Review>;
    async fn list_reviews_for_product(&self, product_id: &str) -> StorageResult<Vec<Review>>;
    async fn delete_review(&self, id: &str) -> StorageResult<bool>;

    // --- Testimonials ---
    async fn create_testimonial(&self, new: NewTestimonial) -> StorageResult<Testimonial>;
    async fn list_testimonials(&self) -> StorageResult<Vec<Testimonial>>;
    async fn delete_testimonial(&self, id: &str) -> StorageResult<bool>;

    // --- Banners ---
    async fn create_banner(&self, new: NewBanner) -> StorageResult<Banner>;
    async fn list_banners(&self) -> StorageResult<Vec<Banner>>;
    async fn update_banner(&self, id: &str, update: BannerUpdate)
        -> StorageResult<Option<Banner>>;
    async fn delete_banner(&self, id: &str) -> StorageResult<bool>;

    // --- Carts ---
    async fn create_cart(&self, new: NewCart) -> StorageResult<Cart>;
    async fn get_cart(&self, id: &str) -> StorageResult<Option<Cart>>;
    async fn find_cart_by_user(&self, user_id: &str) -> StorageResult<Option<Cart>>;
    async fn find_cart_by_session(&self, session_id: &str) -> StorageResult<Option<Cart>>;

    // --- Cart items ---

    /// Adds `quantity` of a product to a cart. If the `(cart, product,
    /// is_free)` tuple already exists the quantity is incremented on the
    /// existing row.
    async fn upsert_cart_item(
        &self,
        cart_id: &str,
        product_id: &str,
        quantity: u32,
        is_free: bool,
    ) -> StorageResult<CartItem>;
    async fn get_cart_item(&self, id: &str) -> StorageResult<Option<CartItem>>;
    async fn get_cart_items(&self, cart_id: &str) -> StorageResult<Vec<CartItem>>;
    /// Sets an item's quantity. Quantity 0 removes the row; the method then
    /// returns `Ok(None)`, as it does for an unknown id.
    async fn update_cart_item_quantity(
        &self,
        id: &str,
        quantity: u32,
    ) -> StorageResult<Option<CartItem>>;
    async fn remove_cart_item(&self, id: &str) -> StorageResult<bool>;
    async fn clear_cart(&self, cart_id: &str) -> StorageResult<()>;

    // --- Free-product configuration ---
    async fn create_free_product(&self, new: NewFreeProduct) -> StorageResult<FreeProduct>;
    async fn get_free_product(&self, id: &str) -> StorageResult<Option<FreeProduct>>;
    /// Looks up the configuration targeting a given catalog product, if any.
    async fn find_free_product_for_product(
        &self,
        product_id: &str,
    ) -> StorageResult<Option<FreeProduct>>;
    async fn list_free_products(&self) -> StorageResult<Vec<FreeProduct>>;
    async fn update_free_product(
        &self,
        id: &str,
        update: NewFreeProduct,
    ) -> StorageResult<Option<FreeProduct>>;
    async fn delete_free_product(&self, id: &str) -> StorageResult<bool>;

    /// Liveness probe used by the failover monitor. The in-memory store is
    /// always healthy; the Redis store round-trips to the server.
    async fn health_check(&self) -> StorageResult<()>;
}
