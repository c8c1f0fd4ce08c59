//! Backend Failover
//!
//! Wraps the remote and in-memory backends behind the same [`Storage`]
//! interface and degrades transparently when the remote is unreachable.
//!
//! ## Selection rules
//! - A "remote active" flag, owned by the facade instance, decides which
//!   backend serves a call. It is initialized from the remote's ready-state
//!   at construction and updated by [`ConnectionEvent`]s: `Connected` turns
//!   it on, `Disconnected` and `Error` turn it off.
//! - Every operation tries the active backend once. A remote failure flips
//!   the flag and retries the same operation against memory; if that retry
//!   also fails the caller gets a generic `OperationFailed`.
//! - At most one backend serves any single call; results are never merged.
//!
//! Records written to memory during an outage are not replayed when the
//! remote recovers; durability is lost for the degraded window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::backend::{Storage, StorageError, StorageFuture, StorageResult};
use super::types::*;
use async_trait::async_trait;

/// Connection lifecycle signal for the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    Error,
}

/// The "use remote backend" flag, owned by the facade (no ambient state).
pub struct ConnectionState {
    remote_active: AtomicBool,
}

impl ConnectionState {
    pub fn new(remote_active: bool) -> Self {
        Self {
            remote_active: AtomicBool::new(remote_active),
        }
    }

    pub fn remote_active(&self) -> bool {
        self.remote_active.load(Ordering::Acquire)
    }

    pub fn apply(&self, event: ConnectionEvent) {
        let active = matches!(event, ConnectionEvent::Connected);
        let was_active = self.remote_active.swap(active, Ordering::AcqRel);
        if was_active != active {
            tracing::info!(
                "storage backend switched to {} ({:?})",
                if active { "remote" } else { "memory" },
                event
            );
        }
    }
}

/// Failover decorator over the two backends.
pub struct FallbackStorage {
    remote: Arc<dyn Storage>,
    memory: Arc<dyn Storage>,
    state: Arc<ConnectionState>,
}

impl FallbackStorage {
    pub fn new(
        remote: Arc<dyn Storage>,
        memory: Arc<dyn Storage>,
        remote_active: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            remote,
            memory,
            state: Arc::new(ConnectionState::new(remote_active)),
        })
    }

    /// Builds the facade, initializing the flag from the remote's
    /// ready-state (one probe at construction).
    pub async fn connect(remote: Arc<dyn Storage>, memory: Arc<dyn Storage>) -> Arc<Self> {
        let ready = remote.health_check().await.is_ok();
        if ready {
            tracing::info!("remote backend ready, serving from remote");
        } else {
            tracing::warn!("remote backend unreachable, serving from memory");
        }
        Self::new(remote, memory, ready)
    }

    pub fn remote_active(&self) -> bool {
        self.state.remote_active()
    }

    /// Applies one connection lifecycle event.
    pub fn apply_event(&self, event: ConnectionEvent) {
        self.state.apply(event);
    }

    /// Consumes injected connection events from a channel. The sender side
    /// is owned by whoever watches the real connection (or a test).
    pub fn listen(&self, mut events: mpsc::Receiver<ConnectionEvent>) {
        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                state.apply(event);
            }
            tracing::debug!("connection event channel closed");
        });
    }

    /// Probes the remote on an interval and feeds the outcome into the
    /// state flag. This is what brings the facade back to the remote after
    /// an outage.
    pub fn spawn_health_monitor(&self, period: Duration) {
        let remote = self.remote.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match remote.health_check().await {
                    Ok(()) => state.apply(ConnectionEvent::Connected),
                    Err(err) => {
                        if state.remote_active() {
                            tracing::warn!("remote health check failed: {}", err);
                        }
                        state.apply(ConnectionEvent::Error);
                    }
                }
            }
        });
    }

    /// Runs one operation with the failover rules described in the module
    /// docs. `f` is invoked at most twice, each time against exactly one
    /// backend.
    async fn run<'a, T, F>(&'a self, op: &'static str, f: F) -> StorageResult<T>
    where
        F: Fn(&'a dyn Storage) -> StorageFuture<'a, T>,
    {
        if self.state.remote_active() {
            match f(self.remote.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!("remote backend failed for {}: {}", op, err);
                    self.state.apply(ConnectionEvent::Error);
                }
            }
        }

        f(self.memory.as_ref()).await.map_err(|err| {
            tracing::error!("memory backend failed for {}: {}", op, err);
            StorageError::OperationFailed { op }
        })
    }
}

#[async_trait]
impl Storage for FallbackStorage {
    // --- Users ---

    async fn create_user(&self, new: NewUser) -> StorageResult<User> {
        self.run("create_user", |s| s.create_user(new.clone())).await
    }

    async fn get_user(&self, id: &str) -> StorageResult<Option<User>> {
        self.run("get_user", |s| s.get_user(id)).await
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.run("get_user_by_email", |s| s.get_user_by_email(email))
            .await
    }

    // --- Products ---

    async fn create_product(&self, new: NewProduct) -> StorageResult<Product> {
        self.run("create_product", |s| s.create_product(new.clone()))
            .await
    }

    async fn get_product(&self, id: &str) -> StorageResult<Option<Product>> {
        self.run("get_product", |s| s.get_product(id)).await
    }

    async fn list_products(&self) -> StorageResult<Vec<Product>> {
        self.run("list_products", |s| s.list_products()).await
    }

    async fn update_product(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> StorageResult<Option<Product>> {
        self.run("update_product", |s| s.update_product(id, update.clone()))
            .await
    }

    async fn delete_product(&self, id: &str) -> StorageResult<bool> {
        self.run("delete_product", |s| s.delete_product(id)).await
    }

    // --- Categories ---

    async fn create_category(&self, new: NewCategory) -> StorageResult<Category> {
        self.run("create_category", |s| s.create_category(new.clone()))
            .await
    }

    async fn get_category(&self, id: &str) -> StorageResult<Option<Category>> {
        self.run("get_category", |s| s.get_category(id)).await
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        self.run("list_categories", |s| s.list_categories()).await
    }

    async fn delete_category(&self, id: &str) -> StorageResult<bool> {
        self.run("delete_category", |s| s.delete_category(id)).await
    }

    // --- Collections ---

    async fn create_collection(&self, new: NewCollection) -> StorageResult<Collection> {
        self.run("create_collection", |s| s.create_collection(new.clone()))
            .await
    }

    async fn get_collection(&self, id: &str) -> StorageResult<Option<Collection>> {
        self.run("get_collection", |s| s.get_collection(id)).await
    }

    async fn list_collections(&self) -> StorageResult<Vec<Collection>> {
        self.run("list_collections", |s| s.list_collections()).await
    }

    async fn delete_collection(&self, id: &str) -> StorageResult<bool> {
        self.run("delete_collection", |s| s.delete_collection(id))
            .await
    }

    // --- Orders ---

    async fn create_order(&self, new: NewOrder) -> StorageResult<Order> {
        self.run("create_order", |s| s.create_order(new.clone())).await
    }

    async fn get_order(&self, id: &str) -> StorageResult<Option<Order>> {
        self.run("get_order", |s| s.get_order(id)).await
    }

    async fn list_orders_for_user(&self, user_id: &str) -> StorageResult<Vec<Order>> {
        self.run("list_orders_for_user", |s| s.list_orders_for_user(user_id))
            .await
    }

    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> StorageResult<Option<Order>> {
        self.run("update_order_status", |s| s.update_order_status(id, status))
            .await
    }

    // --- Reviews ---

    async fn create_review(&self, new: NewReview) -> StorageResult<Review> {
        self.run("create_review", |s| s.create_review(new.clone()))
            .await
    }

    async fn list_reviews_for_product(&self, product_id: &str) -> StorageResult<Vec<Review>> {
        self.run("list_reviews_for_product", |s| {
            s.list_reviews_for_product(product_id)
        })
        .await
    }

    async fn delete_review(&self, id: &str) -> StorageResult<bool> {
        self.run("delete_review", |s| s.delete_review(id)).await
    }

    // --- Testimonials ---

    async fn create_testimonial(&self, new: NewTestimonial) -> StorageResult<Testimonial> {
        self.run("create_testimonial", |s| s.create_testimonial(new.clone()))
            .await
    }

    async fn list_testimonials(&self) -> StorageResult<Vec<Testimonial>> {
        self.run("list_testimonials", |s| s.list_testimonials()).await
    }

    async fn delete_testimonial(&self, id: &str) -> StorageResult<bool> {
        self.run("delete_testimonial", |s| s.delete_testimonial(id))
            .await
    }

    // --- Banners ---

    async fn create_banner(&self, new: NewBanner) -> StorageResult<Banner> {
        self.run("create_banner", |s| s.create_banner(new.clone()))
            .await
    }

    async fn list_banners(&self) -> StorageResult<Vec<Banner>> {
        self.run("list_banners", |s| s.list_banners()).await
    }

    async fn update_banner(
        &self,
        id: &str,
        update: BannerUpdate,
    ) -> StorageResult<Option<Banner>> {
        self.run("update_banner", |s| s.update_banner(id, update.clone()))
            .await
    }

    async fn delete_banner(&self, id: &str) -> StorageResult<bool> {
        self.run("delete_banner", |s| s.delete_banner(id)).await
    }

    // --- Carts ---

    async fn create_cart(&self, new: NewCart) -> StorageResult<Cart> {
        self.run("create_cart", |s| s.create_cart(new.clone())).await
    }

    async fn get_cart(&self, id: &str) -> StorageResult<Option<Cart>> {
        self.run("get_cart", |s| s.get_cart(id)).await
    }

    async fn find_cart_by_user(&self, user_id: &str) -> StorageResult<Option<Cart>> {
        self.run("find_cart_by_user", |s| s.find_cart_by_user(user_id))
            .await
    }

    async fn find_cart_by_session(&self, session_id: &str) -> StorageResult<Option<Cart>> {
        self.run("find_cart_by_session", |s| {
            s.find_cart_by_session(session_id)
        })
        .await
    }

    // --- Cart items ---

    async fn upsert_cart_item(
        &self,
        cart_id: &str,
        product_id: &str,
        quantity: u32,
        is_free: bool,
    ) -> StorageResult<CartItem> {
        self.run("upsert_cart_item", |s| {
            s.upsert_cart_item(cart_id, product_id, quantity, is_free)
        })
        .await
    }

    async fn get_cart_item(&self, id: &str) -> StorageResult<Option<CartItem>> {
        self.run("get_cart_item", |s| s.get_cart_item(id)).await
    }

    async fn get_cart_items(&self, cart_id: &str) -> StorageResult<Vec<CartItem>> {
        self.run("get_cart_items", |s| s.get_cart_items(cart_id)).await
    }

    async fn update_cart_item_quantity(
        &self,
        id: &str,
        quantity: u32,
    ) -> StorageResult<Option<CartItem>> {
        self.run("update_cart_item_quantity", |s| {
            s.update_cart_item_quantity(id, quantity)
        })
        .await
    }

    async fn remove_cart_item(&self, id: &str) -> StorageResult<bool> {
        self.run("remove_cart_item", |s| s.remove_cart_item(id)).await
    }

    async fn clear_cart(&self, cart_id: &str) -> StorageResult<()> {
        self.run("clear_cart", |s| s.clear_cart(cart_id)).await
    }

    // --- Free-product configuration ---

    async fn create_free_product(&self, new: NewFreeProduct) -> StorageResult<FreeProduct> {
        self.run("create_free_product", |s| s.create_free_product(new.clone()))
            .await
    }

    async fn get_free_product(&self, id: &str) -> StorageResult<Option<FreeProduct>> {
        self.run("get_free_product", |s| s.get_free_product(id)).await
    }

    async fn find_free_product_for_product(
        &self,
        product_id: &str,
    ) -> StorageResult<Option<FreeProduct>> {
        self.run("find_free_product_for_product", |s| {
            s.find_free_product_for_product(product_id)
        })
        .await
    }

    async fn list_free_products(&self) -> StorageResult<Vec<FreeProduct>> {
        self.run("list_free_products", |s| s.list_free_products())
            .await
    }

    async fn update_free_product(
        &self,
        id: &str,
        update: NewFreeProduct,
    ) -> StorageResult<Option<FreeProduct>> {
        self.run("update_free_product", |s| {
            s.update_free_product(id, update.clone())
        })
        .await
    }

    async fn delete_free_product(&self, id: &str) -> StorageResult<bool> {
        self.run("delete_free_product", |s| s.delete_free_product(id))
            .await
    }

    async fn health_check(&self) -> StorageResult<()> {
        // The facade itself is healthy as long as one backend answers.
        self.run("health_check", |s| s.health_check()).await
    }
}
