//! Storage Module Tests
//!
//! Validates the in-memory backend mechanics and the failover wrapper.
//!
//! ## Test Scopes
//! - **MemoryStore**: CRUD behavior, the cart-item tuple upsert, and
//!   absent-record semantics.
//! - **FallbackStorage**: backend selection, the single fallback retry, and
//!   connection-event handling.
//!
//! *Note: the Redis backend needs a running server and is covered by
//! integration tests; unit tests exercise it only through the failing-remote
//! double below.*

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use tokio::sync::mpsc;

    use crate::storage::backend::{Storage, StorageError, StorageResult};
    use crate::storage::fallback::{ConnectionEvent, FallbackStorage};
    use crate::storage::memory::MemoryStore;
    use crate::storage::types::*;
    use async_trait::async_trait;

    fn new_product(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Decimal::from(price),
            image_url: format!("https://cdn.example/{name}.jpg"),
            stock: 10,
            category_id: None,
        }
    }

    fn session_cart() -> NewCart {
        NewCart {
            user_id: None,
            session_id: Some("session-1".to_string()),
        }
    }

    // A remote backend that fails every operation, standing in for an
    // unreachable database.
    struct FailingStore;

    impl FailingStore {
        fn fail<T>() -> StorageResult<T> {
            Err(StorageError::Backend("remote unreachable".to_string()))
        }
    }

    #[async_trait]
    impl Storage for FailingStore {
        async fn create_user(&self, _new: NewUser) -> StorageResult<User> {
            Self::fail()
        }
        async fn get_user(&self, _id: &str) -> StorageResult<Option<User>> {
            Self::fail()
        }
        async fn get_user_by_email(&self, _email: &str) -> StorageResult<Option<User>> {
            Self::fail()
        }
        async fn create_product(&self, _new: NewProduct) -> StorageResult<Product> {
            Self::fail()
        }
        async fn get_product(&self, _id: &str) -> StorageResult<Option<Product>> {
            Self::fail()
        }
        async fn list_products(&self) -> StorageResult<Vec<Product>> {
            Self::fail()
        }
        async fn update_product(
            &self,
            _id: &str,
            _update: ProductUpdate,
        ) -> StorageResult<Option<Product>> {
            Self::fail()
        }
        async fn delete_product(&self, _id: &str) -> StorageResult<bool> {
            Self::fail()
        }
        async fn create_category(&self, _new: NewCategory) -> StorageResult<Category> {
            Self::fail()
        }
        async fn get_category(&self, _id: &str) -> StorageResult<Option<Category>> {
            Self::fail()
        }
        async fn list_categories(&self) -> StorageResult<Vec<Category>> {
            Self::fail()
        }
        async fn delete_category(&self, _id: &str) -> StorageResult<bool> {
            Self::fail()
        }
        async fn create_collection(&self, _new: NewCollection) -> StorageResult<Collection> {
            Self::fail()
        }
        async fn get_collection(&self, _id: &str) -> StorageResult<Option<Collection>> {
            Self::fail()
        }
        async fn list_collections(&self) -> StorageResult<Vec<Collection>> {
            Self::fail()
        }
        async fn delete_collection(&self, _id: &str) -> StorageResult<bool> {
            Self::fail()
        }
        async fn create_order(&self, _new: NewOrder) -> StorageResult<Order> {
            Self::fail()
        }
        async fn get_order(&self, _id: &str) -> StorageResult<Option<Order>> {
            Self::fail()
        }
        async fn list_orders_for_user(&self, _user_id: &str) -> StorageResult<Vec<Order>> {
            Self::fail()
        }
        async fn update_order_status(
            &self,
            _id: &str,
            _status: OrderStatus,
        ) -> StorageResult<Option<Order>> {
            Self::fail()
        }
        async fn create_review(&self, _new: NewReview) -> StorageResult<Review> {
            Self::fail()
        }
        async fn list_reviews_for_product(&self, _product_id: &str) -> StorageResult<Vec<Review>> {
            Self::fail()
        }
        async fn delete_review(&self, _id: &str) -> StorageResult<bool> {
            Self::fail()
        }
        async fn create_testimonial(&self, _new: NewTestimonial) -> StorageResult<Testimonial> {
            Self::fail()
        }
        async fn list_testimonials(&self) -> StorageResult<Vec<Testimonial>> {
            Self::fail()
        }
        async fn delete_testimonial(&self, _id: &str) -> StorageResult<bool> {
            Self::fail()
        }
        async fn create_banner(&self, _new: NewBanner) -> StorageResult<Banner> {
            Self::fail()
        }
        async fn list_banners(&self) -> StorageResult<Vec<Banner>> {
            Self::fail()
        }
        async fn update_banner(
            &self,
            _id: &str,
            _update: BannerUpdate,
        ) -> StorageResult<Option<Banner>> {
            Self::fail()
        }
        async fn delete_banner(&self, _id: &str) -> StorageResult<bool> {
            Self::fail()
        }
        async fn create_cart(&self, _new: NewCart) -> StorageResult<Cart> {
            Self::fail()
        }
        async fn get_cart(&self, _id: &str) -> StorageResult<Option<Cart>> {
            Self::fail()
        }
        async fn find_cart_by_user(&self, _user_id: &str) -> StorageResult<Option<Cart>> {
            Self::fail()
        }
        async fn find_cart_by_session(&self, _session_id: &str) -> StorageResult<Option<Cart>> {
            Self::fail()
        }
        async fn upsert_cart_item(
            &self,
            _cart_id: &str,
            _product_id: &str,
            _quantity: u32,
            _is_free: bool,
        ) -> StorageResult<CartItem> {
            Self::fail()
        }
        async fn get_cart_item(&self, _id: &str) -> StorageResult<Option<CartItem>> {
            Self::fail()
        }
        async fn get_cart_items(&self, _cart_id: &str) -> StorageResult<Vec<CartItem>> {
            Self::fail()
        }
        async fn update_cart_item_quantity(
            &self,
            _id: &str,
            _quantity: u32,
        ) -> StorageResult<Option<CartItem>> {
            Self::fail()
        }
        async fn remove_cart_item(&self, _id: &str) -> StorageResult<bool> {
            Self::fail()
        }
        async fn clear_cart(&self, _cart_id: &str) -> StorageResult<()> {
            Self::fail()
        }
        async fn create_free_product(&self, _new: NewFreeProduct) -> StorageResult<FreeProduct> {
            Self::fail()
        }
        async fn get_free_product(&self, _id: &str) -> StorageResult<Option<FreeProduct>> {
            Self::fail()
        }
        async fn find_free_product_for_product(
            &self,
            _product_id: &str,
        ) -> StorageResult<Option<FreeProduct>> {
            Self::fail()
        }
        async fn list_free_products(&self) -> StorageResult<Vec<FreeProduct>> {
            Self::fail()
        }
        async fn update_free_product(
            &self,
            _id: &str,
            _update: NewFreeProduct,
        ) -> StorageResult<Option<FreeProduct>> {
            Self::fail()
        }
        async fn delete_free_product(&self, _id: &str) -> StorageResult<bool> {
            Self::fail()
        }
        async fn health_check(&self) -> StorageResult<()> {
            Self::fail()
        }
    }

    // ============================================================
    // MEMORY STORE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_memory_product_crud() {
        let store = MemoryStore::new();

        let product = store.create_product(new_product("lamp", 499)).await.unwrap();
        assert_eq!(product.price, Decimal::from(499));

        let fetched = store.get_product(&product.id).await.unwrap();
        assert_eq!(fetched, Some(product.clone()));

        let update = ProductUpdate {
            price: Some(Decimal::from(450)),
            ..Default::default()
        };
        let updated = store.update_product(&product.id, update).await.unwrap();
        assert_eq!(updated.unwrap().price, Decimal::from(450));

        assert!(store.delete_product(&product.id).await.unwrap());
        assert_eq!(store.get_product(&product.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_absent_lookups_return_none_not_error() {
        let store = MemoryStore::new();

        assert_eq!(store.get_cart("missing").await.unwrap(), None);
        assert_eq!(store.get_cart_item("missing").await.unwrap(), None);
        assert_eq!(store.get_free_product("missing").await.unwrap(), None);
        assert_eq!(
            store.update_product("missing", ProductUpdate::default()).await.unwrap(),
            None,
            "updating an absent record should be None, not an error"
        );
        assert!(!store.delete_banner("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_merges_duplicate_tuple() {
        let store = MemoryStore::new();
        let cart = store.create_cart(session_cart()).await.unwrap();
        let product = store.create_product(new_product("mug", 120)).await.unwrap();

        let first = store
            .upsert_cart_item(&cart.id, &product.id, 2, false)
            .await
            .unwrap();
        let second = store
            .upsert_cart_item(&cart.id, &product.id, 3, false)
            .await
            .unwrap();

        assert_eq!(first.id, second.id, "same tuple should reuse the row");
        assert_eq!(second.quantity, 5, "duplicate add should merge quantities");

        let items = store.get_cart_items(&cart.id).await.unwrap();
        assert_eq!(items.len(), 1, "cart should hold a single merged row");
    }

    #[tokio::test]
    async fn test_free_and_paid_rows_are_distinct() {
        let store = MemoryStore::new();
        let cart = store.create_cart(session_cart()).await.unwrap();
        let product = store.create_product(new_product("mug", 120)).await.unwrap();

        store
            .upsert_cart_item(&cart.id, &product.id, 1, false)
            .await
            .unwrap();
        store
            .upsert_cart_item(&cart.id, &product.id, 1, true)
            .await
            .unwrap();

        let items = store.get_cart_items(&cart.id).await.unwrap();
        assert_eq!(
            items.len(),
            2,
            "free and paid status of the same product are separate rows"
        );
    }

    #[tokio::test]
    async fn test_update_quantity_zero_removes_item() {
        let store = MemoryStore::new();
        let cart = store.create_cart(session_cart()).await.unwrap();
        let product = store.create_product(new_product("mug", 120)).await.unwrap();

        let item = store
            .upsert_cart_item(&cart.id, &product.id, 2, false)
            .await
            .unwrap();

        let updated = store.update_cart_item_quantity(&item.id, 7).await.unwrap();
        assert_eq!(updated.unwrap().quantity, 7);

        let removed = store.update_cart_item_quantity(&item.id, 0).await.unwrap();
        assert_eq!(removed, None);
        assert_eq!(store.get_cart_item(&item.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_and_clear_cart() {
        let store = MemoryStore::new();
        let cart = store.create_cart(session_cart()).await.unwrap();
        let a = store.create_product(new_product("a", 10)).await.unwrap();
        let b = store.create_product(new_product("b", 20)).await.unwrap();

        let item = store.upsert_cart_item(&cart.id, &a.id, 1, false).await.unwrap();
        store.upsert_cart_item(&cart.id, &b.id, 1, false).await.unwrap();

        assert!(store.remove_cart_item(&item.id).await.unwrap());
        assert!(
            !store.remove_cart_item(&item.id).await.unwrap(),
            "second removal should report nothing deleted"
        );

        store.clear_cart(&cart.id).await.unwrap();
        assert!(store.get_cart_items(&cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cart_lookup_by_user_and_session() {
        let store = MemoryStore::new();
        let cart = store
            .create_cart(NewCart {
                user_id: Some("user-9".to_string()),
                session_id: Some("sess-9".to_string()),
            })
            .await
            .unwrap();

        let by_user = store.find_cart_by_user("user-9").await.unwrap();
        assert_eq!(by_user.map(|c| c.id), Some(cart.id.clone()));

        let by_session = store.find_cart_by_session("sess-9").await.unwrap();
        assert_eq!(by_session.map(|c| c.id), Some(cart.id));

        assert_eq!(store.find_cart_by_user("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_free_product_target_lookup_follows_updates() {
        let store = MemoryStore::new();

        let config = store
            .create_free_product(NewFreeProduct {
                product_id: "prod-1".to_string(),
                enabled: true,
                min_order_value: Decimal::from(1000),
                max_order_value: None,
            })
            .await
            .unwrap();

        let found = store.find_free_product_for_product("prod-1").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(config.id.clone()));

        store
            .update_free_product(
                &config.id,
                NewFreeProduct {
                    product_id: "prod-2".to_string(),
                    enabled: true,
                    min_order_value: Decimal::from(1000),
                    max_order_value: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(store.find_free_product_for_product("prod-1").await.unwrap(), None);
        let retargeted = store.find_free_product_for_product("prod-2").await.unwrap();
        assert_eq!(retargeted.map(|c| c.id), Some(config.id));
    }

    // ============================================================
    // FALLBACK STORAGE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_fallback_retries_memory_when_remote_fails() {
        let memory = Arc::new(MemoryStore::new());
        let cart = memory.create_cart(session_cart()).await.unwrap();
        let product = memory.create_product(new_product("mug", 120)).await.unwrap();
        memory
            .upsert_cart_item(&cart.id, &product.id, 2, false)
            .await
            .unwrap();

        let facade = FallbackStorage::new(Arc::new(FailingStore), memory.clone(), true);
        assert!(facade.remote_active(), "remote selected at construction");

        let items = facade
            .get_cart_items(&cart.id)
            .await
            .expect("failing remote should fall back to memory, not propagate");
        assert_eq!(items.len(), 1);
        assert!(
            !facade.remote_active(),
            "first remote failure should flip the backend flag"
        );
    }

    #[tokio::test]
    async fn test_both_backends_failing_reports_operation() {
        let facade = FallbackStorage::new(Arc::new(FailingStore), Arc::new(FailingStore), true);

        let err = facade.get_cart_items("cart-1").await.unwrap_err();
        assert!(
            matches!(err, StorageError::OperationFailed { op: "get_cart_items" }),
            "expected OperationFailed for get_cart_items, got: {err:?}"
        );
        assert!(err.to_string().contains("get_cart_items"));
    }

    #[tokio::test]
    async fn test_connection_events_route_operations() {
        // Two working memory stores: only the "remote" one knows the product,
        // so the serving backend is observable from the result.
        let remote = Arc::new(MemoryStore::new());
        let product = remote.create_product(new_product("lamp", 300)).await.unwrap();
        let local = Arc::new(MemoryStore::new());

        let facade = FallbackStorage::new(remote, local, true);

        let via_remote = facade.get_product(&product.id).await.unwrap();
        assert!(via_remote.is_some(), "remote should serve while connected");

        facade.apply_event(ConnectionEvent::Disconnected);
        let via_memory = facade.get_product(&product.id).await.unwrap();
        assert_eq!(
            via_memory, None,
            "after disconnect the memory backend serves, which never saw the product"
        );

        facade.apply_event(ConnectionEvent::Connected);
        let back = facade.get_product(&product.id).await.unwrap();
        assert!(back.is_some(), "connected event should route back to remote");
    }

    #[tokio::test]
    async fn test_construction_probe_initializes_flag() {
        let up = FallbackStorage::connect(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
        .await;
        assert!(up.remote_active(), "healthy remote should start active");

        let down =
            FallbackStorage::connect(Arc::new(FailingStore), Arc::new(MemoryStore::new())).await;
        assert!(
            !down.remote_active(),
            "unreachable remote should start on the memory backend"
        );
    }

    #[tokio::test]
    async fn test_listen_applies_channel_events() {
        let facade = FallbackStorage::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            true,
        );

        let (tx, rx) = mpsc::channel(4);
        facade.listen(rx);

        tx.send(ConnectionEvent::Error).await.unwrap();

        // The listener runs on a spawned task; poll briefly for the flip.
        let mut flipped = false;
        for _ in 0..50 {
            if !facade.remote_active() {
                flipped = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(flipped, "error event from the channel should disable the remote");
    }
}
