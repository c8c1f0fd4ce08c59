//! Cart Module Tests
//!
//! Validates the free-product eligibility window and the cart mutation
//! rules against the in-memory backend.
//!
//! ## Test Scopes
//! - **Subtotal**: free items contribute zero; missing products are skipped.
//! - **Eligibility window**: minimum/maximum gating, inclusive boundaries,
//!   unbounded maximum, disabled configurations, re-validation on update.
//! - **Mutations**: idempotent re-adds, zero-quantity removal, cart
//!   identity rules.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use crate::cart::engine::{CartError, CartService};
    use crate::storage::backend::Storage;
    use crate::storage::memory::MemoryStore;
    use crate::storage::types::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn setup() -> (Arc<MemoryStore>, CartService) {
        let store = Arc::new(MemoryStore::new());
        let service = CartService::new(store.clone());
        (store, service)
    }

    async fn make_product(store: &MemoryStore, name: &str, price: i64) -> Product {
        store
            .create_product(NewProduct {
                name: name.to_string(),
                description: String::new(),
                price: dec(price),
                image_url: String::new(),
                stock: 100,
                category_id: None,
            })
            .await
            .unwrap()
    }

    async fn make_cart(store: &MemoryStore) -> Cart {
        store
            .create_cart(NewCart {
                user_id: None,
                session_id: Some("test-session".to_string()),
            })
            .await
            .unwrap()
    }

    async fn make_config(
        store: &MemoryStore,
        product_id: &str,
        enabled: bool,
        min: i64,
        max: Option<i64>,
    ) -> FreeProduct {
        store
            .create_free_product(NewFreeProduct {
                product_id: product_id.to_string(),
                enabled,
                min_order_value: dec(min),
                max_order_value: max.map(dec),
            })
            .await
            .unwrap()
    }

    // ============================================================
    // SUBTOTAL TESTS
    // ============================================================

    #[tokio::test]
    async fn test_subtotal_ignores_free_items() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let paid = make_product(&store, "paid", 400).await;
        let gift = make_product(&store, "gift", 250).await;
        make_config(&store, &gift.id, true, 0, None).await;

        service.add_item(&cart.id, &paid.id, 3, false).await.unwrap();
        service.add_item(&cart.id, &gift.id, 1, true).await.unwrap();

        let subtotal = service.cart_subtotal(&cart.id).await.unwrap();
        assert_eq!(subtotal, dec(1200), "free line must contribute zero");
    }

    #[tokio::test]
    async fn test_subtotal_skips_deleted_products() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let keep = make_product(&store, "keep", 100).await;
        let gone = make_product(&store, "gone", 999).await;

        service.add_item(&cart.id, &keep.id, 1, false).await.unwrap();
        service.add_item(&cart.id, &gone.id, 1, false).await.unwrap();
        store.delete_product(&gone.id).await.unwrap();

        let subtotal = service.cart_subtotal(&cart.id).await.unwrap();
        assert_eq!(subtotal, dec(100), "items with deleted products are skipped");
    }

    // ============================================================
    // ELIGIBILITY WINDOW TESTS
    // ============================================================

    #[tokio::test]
    async fn test_below_minimum_rejected_and_cart_unchanged() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let paid = make_product(&store, "paid", 1200).await;
        let gift = make_product(&store, "gift", 100).await;
        make_config(&store, &gift.id, true, 1500, None).await;

        service.add_item(&cart.id, &paid.id, 1, false).await.unwrap();
        let before = store.get_cart_items(&cart.id).await.unwrap();

        let err = service
            .add_item(&cart.id, &gift.id, 1, true)
            .await
            .unwrap_err();
        assert!(
            matches!(err, CartError::BelowMinimum { .. }),
            "expected BelowMinimum, got {err:?}"
        );
        assert!(
            err.to_string().contains("Minimum order value of ₹1500"),
            "message should cite the threshold: {err}"
        );

        let after = store.get_cart_items(&cart.id).await.unwrap();
        assert_eq!(before, after, "rejected mutation must leave the cart unchanged");
    }

    #[tokio::test]
    async fn test_unbounded_maximum_never_rejects() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let paid = make_product(&store, "paid", 1_000_000).await;
        let gift = make_product(&store, "gift", 50).await;
        make_config(&store, &gift.id, true, 0, None).await;

        service.add_item(&cart.id, &paid.id, 5, false).await.unwrap();

        service
            .add_item(&cart.id, &gift.id, 1, true)
            .await
            .expect("no subtotal should hit an absent upper bound");
    }

    #[tokio::test]
    async fn test_window_boundaries_are_inclusive() {
        // subtotal == min and subtotal == max are both eligible; one unit
        // outside either bound is not.
        for (subtotal, ok) in [(1000, true), (999, false), (2000, true), (2001, false)] {
            let (store, service) = setup();
            let cart = make_cart(&store).await;
            let paid = make_product(&store, "paid", subtotal).await;
            let gift = make_product(&store, "gift", 10).await;
            make_config(&store, &gift.id, true, 1000, Some(2000)).await;

            service.add_item(&cart.id, &paid.id, 1, false).await.unwrap();

            let result = service.add_item(&cart.id, &gift.id, 1, true).await;
            assert_eq!(
                result.is_ok(),
                ok,
                "subtotal {subtotal} against window [1000, 2000]: {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_disabled_config_always_rejected() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let paid = make_product(&store, "paid", 5000).await;
        let gift = make_product(&store, "gift", 10).await;
        // Window would accept any subtotal; the flag alone must reject.
        make_config(&store, &gift.id, false, 0, None).await;

        service.add_item(&cart.id, &paid.id, 1, false).await.unwrap();

        let err = service
            .add_item(&cart.id, &gift.id, 1, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotEligible), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_config_rejected() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let gift = make_product(&store, "gift", 10).await;

        let err = service
            .add_item(&cart.id, &gift.id, 1, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotEligible), "got {err:?}");
    }

    #[tokio::test]
    async fn test_paid_items_skip_the_window() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let product = make_product(&store, "widget", 10).await;
        // A config targeting the product with an unreachable minimum: paid
        // adds must not consult it.
        make_config(&store, &product.id, true, 99_999, None).await;

        service
            .add_item(&cart.id, &product.id, 1, false)
            .await
            .expect("paid items are never subject to the eligibility window");
    }

    #[tokio::test]
    async fn test_gift_window_scenario() {
        // The end-to-end scenario: ₹1200 cart, gift A windowed [1000, 2000],
        // gift B min 1500; then the cart grows to ₹2500.
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let paid_a = make_product(&store, "kettle", 1200).await;
        let paid_b = make_product(&store, "toaster", 1300).await;
        let gift_a = make_product(&store, "gift-a", 200).await;
        let gift_b = make_product(&store, "gift-b", 300).await;
        make_config(&store, &gift_a.id, true, 1000, Some(2000)).await;
        make_config(&store, &gift_b.id, true, 1500, None).await;

        service.add_item(&cart.id, &paid_a.id, 1, false).await.unwrap();
        assert_eq!(service.cart_subtotal(&cart.id).await.unwrap(), dec(1200));

        // Gift A fits the window.
        let free_item = service.add_item(&cart.id, &gift_a.id, 1, true).await.unwrap();

        // Gift B's minimum is above the subtotal.
        let err = service
            .add_item(&cart.id, &gift_b.id, 1, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Minimum order value of ₹1500"));

        // The cart grows past gift A's ceiling.
        service.add_item(&cart.id, &paid_b.id, 1, false).await.unwrap();
        assert_eq!(service.cart_subtotal(&cart.id).await.unwrap(), dec(2500));

        let err = service
            .add_item(&cart.id, &gift_a.id, 1, true)
            .await
            .unwrap_err();
        assert!(
            err.to_string().contains("maximum order value of ₹2000"),
            "message should cite the ceiling: {err}"
        );

        // The already-present free item is not evicted by the rejection.
        let items = store.get_cart_items(&cart.id).await.unwrap();
        let still_there = items.iter().find(|item| item.id == free_item.id);
        assert_eq!(
            still_there.map(|item| item.quantity),
            Some(1),
            "existing free items stay when the window is later exceeded"
        );
    }

    #[tokio::test]
    async fn test_quantity_update_revalidates_free_items() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let paid = make_product(&store, "paid", 1500).await;
        let gift = make_product(&store, "gift", 100).await;
        make_config(&store, &gift.id, true, 1000, Some(2000)).await;

        let paid_item = service.add_item(&cart.id, &paid.id, 1, false).await.unwrap();
        let free_item = service.add_item(&cart.id, &gift.id, 1, true).await.unwrap();

        // Push the subtotal outside the window with a paid change.
        service.update_quantity(&paid_item.id, 2).await.unwrap();

        let err = service.update_quantity(&free_item.id, 2).await.unwrap_err();
        assert!(
            matches!(err, CartError::AboveMaximum { .. }),
            "free-item updates re-run the window check: {err:?}"
        );

        let unchanged = store.get_cart_item(&free_item.id).await.unwrap().unwrap();
        assert_eq!(unchanged.quantity, 1, "rejected update must not change the row");
    }

    // ============================================================
    // MUTATION TESTS
    // ============================================================

    #[tokio::test]
    async fn test_re_add_merges_instead_of_duplicating() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let product = make_product(&store, "mug", 120).await;

        service.add_item(&cart.id, &product.id, 2, false).await.unwrap();
        let merged = service.add_item(&cart.id, &product.id, 3, false).await.unwrap();

        assert_eq!(merged.quantity, 5);
        assert_eq!(
            store.get_cart_items(&cart.id).await.unwrap().len(),
            1,
            "re-adding the same tuple must not create a second row"
        );
    }

    #[tokio::test]
    async fn test_zero_quantity_add_is_invalid() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let product = make_product(&store, "mug", 120).await;

        let err = service
            .add_item(&cart.id, &product.id, 0, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
    }

    #[tokio::test]
    async fn test_zero_quantity_update_removes_item() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let product = make_product(&store, "mug", 120).await;

        let item = service.add_item(&cart.id, &product.id, 2, false).await.unwrap();
        let removed = service.update_quantity(&item.id, 0).await.unwrap();

        assert_eq!(removed, None);
        assert!(store.get_cart_items(&cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_cart_and_product_are_not_found() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let product = make_product(&store, "mug", 120).await;

        let err = service
            .add_item("missing-cart", &product.id, 1, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::CartNotFound(_)));

        let err = service
            .add_item(&cart.id, "missing-product", 1, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound(_)));

        let err = service.update_quantity("missing-item", 3).await.unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_cart_requires_an_identity() {
        let (_store, service) = setup();

        let err = service.get_or_create_cart(None, None).await.unwrap_err();
        assert!(matches!(err, CartError::MissingIdentity));
    }

    #[tokio::test]
    async fn test_cart_is_created_once_per_identity() {
        let (_store, service) = setup();

        let first = service
            .get_or_create_cart(Some("user-1".to_string()), None)
            .await
            .unwrap();
        let second = service
            .get_or_create_cart(Some("user-1".to_string()), None)
            .await
            .unwrap();
        assert_eq!(first.id, second.id, "same user must keep the same cart");
    }

    #[tokio::test]
    async fn test_cart_view_joins_products_and_subtotal() {
        let (store, service) = setup();
        let cart = make_cart(&store).await;
        let paid = make_product(&store, "paid", 300).await;
        let gift = make_product(&store, "gift", 80).await;
        make_config(&store, &gift.id, true, 0, None).await;

        service.add_item(&cart.id, &paid.id, 2, false).await.unwrap();
        service.add_item(&cart.id, &gift.id, 1, true).await.unwrap();

        let view = service.cart_view(&cart.id).await.unwrap();
        assert_eq!(view.cart.id, cart.id);
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.subtotal, dec(600), "view subtotal counts paid lines only");
        assert!(
            view.lines.iter().all(|line| line.product.is_some()),
            "lines carry the joined product details"
        );
    }
}
