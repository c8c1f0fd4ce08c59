//! Free-Product Eligibility Engine
//!
//! Gates mutations of free-flagged cart items behind a cart-subtotal window
//! check. A free product may enter (or change quantity in) a cart only while
//! the cart's non-free subtotal sits inside the configured
//! `[min_order_value, max_order_value]` window, both bounds inclusive.
//!
//! The check-then-write sequence for one cart is serialized through a
//! per-cart advisory lock, so two concurrent additions cannot both validate
//! against the same stale subtotal.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::storage::backend::{Storage, StorageError};
use crate::storage::types::{Cart, CartItem, NewCart, Product};

/// Business-rule outcome of a cart mutation. These are ordinary rejected
/// results, not process failures: the cart is left unmodified.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart {0} not found")]
    CartNotFound(String),

    #[error("product {0} not found")]
    ProductNotFound(String),

    #[error("cart item {0} not found")]
    ItemNotFound(String),

    #[error("free product not found or disabled")]
    NotEligible,

    #[error("Minimum order value of ₹{min} required to add this free product")]
    BelowMinimum { min: Decimal },

    #[error("Cart total exceeds the maximum order value of ₹{max} for this free product")]
    AboveMaximum { max: Decimal },

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("cart requires a user id or a session id")]
    MissingIdentity,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One cart line joined with its product (which may have been deleted since
/// the item was added).
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
}

pub struct CartService {
    storage: Arc<dyn Storage>,
    // cart id -> advisory lock serializing check-then-write sequences
    cart_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CartService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            cart_locks: DashMap::new(),
        }
    }

    fn cart_lock(&self, cart_id: &str) -> Arc<Mutex<()>> {
        if self.cart_locks.len() > 10_000 {
            self.cart_locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        self.cart_locks
            .entry(cart_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Returns the cart bound to the given user or session, creating one on
    /// first access. At least one identifier must be present.
    pub async fn get_or_create_cart(
        &self,
        user_id: Option<String>,
        session_id: Option<String>,
    ) -> Result<Cart, CartError> {
        if user_id.is_none() && session_id.is_none() {
            return Err(CartError::MissingIdentity);
        }

        if let Some(user_id) = &user_id {
            if let Some(cart) = self.storage.find_cart_by_user(user_id).await? {
                return Ok(cart);
            }
        }
        if let Some(session_id) = &session_id {
            if let Some(cart) = self.storage.find_cart_by_session(session_id).await? {
                return Ok(cart);
            }
        }

        let cart = self
            .storage
            .create_cart(NewCart {
                user_id,
                session_id,
            })
            .await?;
        tracing::info!("created cart {}", cart.id);
        Ok(cart)
    }

    /// Sum of price × quantity over the cart's non-free items. Free items
    /// contribute zero; items whose product no longer resolves are skipped.
    pub async fn cart_subtotal(&self, cart_id: &str) -> Result<Decimal, CartError> {
        let items = self.storage.get_cart_items(cart_id).await?;

        let mut subtotal = Decimal::ZERO;
        for item in items.iter().filter(|item| !item.is_free) {
            match self.storage.get_product(&item.product_id).await? {
                Some(product) => subtotal += product.price * Decimal::from(item.quantity),
                None => {
                    tracing::warn!(
                        "cart {} references missing product {}",
                        cart_id,
                        item.product_id
                    );
                }
            }
        }
        Ok(subtotal)
    }

    /// Checks whether a free unit of `product_id` may be added to (or kept
    /// changing inside) the cart right now. Runs on the initial add and on
    /// every later quantity update of the free item, because the subtotal
    /// may have shifted in between. Already-present free items are never
    /// evicted here.
    async fn validate_free_item(&self, cart_id: &str, product_id: &str) -> Result<(), CartError> {
        let config = match self.storage.find_free_product_for_product(product_id).await? {
            Some(config) if config.enabled => config,
            _ => return Err(CartError::NotEligible),
        };

        let subtotal = self.cart_subtotal(cart_id).await?;

        if subtotal < config.min_order_value {
            return Err(CartError::BelowMinimum {
                min: config.min_order_value,
            });
        }
        if let Some(max) = config.max_order_value {
            if subtotal > max {
                return Err(CartError::AboveMaximum { max });
            }
        }
        Ok(())
    }

    /// Adds a product to the cart, merging into the existing `(cart,
    /// product, is_free)` row if present. Free items pass the eligibility
    /// window first; paid items never consult it.
    pub async fn add_item(
        &self,
        cart_id: &str,
        product_id: &str,
        quantity: u32,
        is_free: bool,
    ) -> Result<CartItem, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let lock = self.cart_lock(cart_id);
        let _guard = lock.lock().await;

        if self.storage.get_cart(cart_id).await?.is_none() {
            return Err(CartError::CartNotFound(cart_id.to_string()));
        }
        if self.storage.get_product(product_id).await?.is_none() {
            return Err(CartError::ProductNotFound(product_id.to_string()));
        }

        if is_free {
            self.validate_free_item(cart_id, product_id).await?;
        }

        let item = self
            .storage
            .upsert_cart_item(cart_id, product_id, quantity, is_free)
            .await?;
        tracing::debug!(
            "cart {}: {} x{} ({})",
            cart_id,
            product_id,
            item.quantity,
            if is_free { "free" } else { "paid" }
        );
        Ok(item)
    }

    /// Sets an item's quantity. Quantity 0 removes the item and returns
    /// `Ok(None)`. Free items re-run the eligibility check before the write.
    pub async fn update_quantity(
        &self,
        item_id: &str,
        quantity: u32,
    ) -> Result<Option<CartItem>, CartError> {
        let item = self
            .storage
            .get_cart_item(item_id)
            .await?
            .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;

        let lock = self.cart_lock(&item.cart_id);
        let _guard = lock.lock().await;

        if quantity == 0 {
            self.storage.remove_cart_item(item_id).await?;
            return Ok(None);
        }

        if item.is_free {
            self.validate_free_item(&item.cart_id, &item.product_id)
                .await?;
        }

        Ok(self
            .storage
            .update_cart_item_quantity(item_id, quantity)
            .await?)
    }

    pub async fn remove_item(&self, item_id: &str) -> Result<(), CartError> {
        let item = self
            .storage
            .get_cart_item(item_id)
            .await?
            .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;

        let lock = self.cart_lock(&item.cart_id);
        let _guard = lock.lock().await;

        self.storage.remove_cart_item(item_id).await?;
        Ok(())
    }

    pub async fn clear_cart(&self, cart_id: &str) -> Result<(), CartError> {
        if self.storage.get_cart(cart_id).await?.is_none() {
            return Err(CartError::CartNotFound(cart_id.to_string()));
        }

        let lock = self.cart_lock(cart_id);
        let _guard = lock.lock().await;

        self.storage.clear_cart(cart_id).await?;
        Ok(())
    }

    /// Cart contents joined with product details plus the current subtotal.
    pub async fn cart_view(&self, cart_id: &str) -> Result<CartView, CartError> {
        let cart = self
            .storage
            .get_cart(cart_id)
            .await?
            .ok_or_else(|| CartError::CartNotFound(cart_id.to_string()))?;

        let items = self.storage.get_cart_items(cart_id).await?;
        let mut lines = Vec::with_capacity(items.len());
        let mut subtotal = Decimal::ZERO;

        for item in items {
            let product = self.storage.get_product(&item.product_id).await?;
            if !item.is_free {
                if let Some(product) = &product {
                    subtotal += product.price * Decimal::from(item.quantity);
                }
            }
            lines.push(CartLine { item, product });
        }

        Ok(CartView {
            cart,
            lines,
            subtotal,
        })
    }
}
