//! Redis-Backed Store
//!
//! The remote persistent backend. Entities are serialized as JSON strings
//! under namespaced keys; set keys provide the listings and lookup keys the
//! secondary indexes (email, cart owner, free-product target).
//!
//! The connection is a [`ConnectionManager`] established lazily: opening the
//! store never fails the process when the server is down, operations simply
//! error until the link comes up (and the facade degrades to memory in the
//! meantime). Once established, the manager reconnects on its own.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use super::backend::{Storage, StorageError, StorageResult};
use super::types::*;
use async_trait::async_trait;

const PRODUCTS_SET: &str = "products";
const CATEGORIES_SET: &str = "categories";
const COLLECTIONS_SET: &str = "collections";
const TESTIMONIALS_SET: &str = "testimonials";
const BANNERS_SET: &str = "banners";
const FREE_PRODUCTS_SET: &str = "freeproducts";

// Key used by the liveness probe; it is never written.
const HEALTH_KEY: &str = "shopfront:health";

fn user_key(id: &str) -> String {
    format!("user:{id}")
}
fn user_email_key(email: &str) -> String {
    format!("user:email:{email}")
}
fn user_orders_key(user_id: &str) -> String {
    format!("user:{user_id}:orders")
}
fn product_key(id: &str) -> String {
    format!("product:{id}")
}
fn product_reviews_key(product_id: &str) -> String {
    format!("product:{product_id}:reviews")
}
fn category_key(id: &str) -> String {
    format!("category:{id}")
}
fn collection_key(id: &str) -> String {
    format!("collection:{id}")
}
fn order_key(id: &str) -> String {
    format!("order:{id}")
}
fn review_key(id: &str) -> String {
    format!("review:{id}")
}
fn testimonial_key(id: &str) -> String {
    format!("testimonial:{id}")
}
fn banner_key(id: &str) -> String {
    format!("banner:{id}")
}
fn cart_key(id: &str) -> String {
    format!("cart:{id}")
}
fn cart_user_key(user_id: &str) -> String {
    format!("cart:user:{user_id}")
}
fn cart_session_key(session_id: &str) -> String {
    format!("cart:session:{session_id}")
}
fn cart_items_key(cart_id: &str) -> String {
    format!("cart:{cart_id}:items")
}
fn cart_item_key(id: &str) -> String {
    format!("cartitem:{id}")
}
fn free_product_key(id: &str) -> String {
    format!("freeproduct:{id}")
}
fn free_product_target_key(product_id: &str) -> String {
    format!("freeproduct:product:{product_id}")
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        StorageError::Backend(format!("redis: {err}"))
    }
}

pub struct RedisStore {
    client: redis::Client,
    connection: RwLock<Option<ConnectionManager>>,
}

impl RedisStore {
    /// Creates the store without touching the network. Fails only on a
    /// malformed URL.
    pub fn new(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            connection: RwLock::new(None),
        })
    }

    /// Creates the store and attempts the initial connection. A server that
    /// is down is logged, not fatal.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let store = Self::new(url)?;
        if let Err(err) = store.con().await {
            tracing::warn!("redis not reachable at startup: {}", err);
        }
        Ok(store)
    }

    /// Returns a connection handle, establishing the manager on first use
    /// (or after a failed startup).
    async fn con(&self) -> StorageResult<ConnectionManager> {
        if let Some(con) = self.connection.read().await.as_ref() {
            return Ok(con.clone());
        }

        let manager = self.client.get_connection_manager().await?;
        let mut slot = self.connection.write().await;
        if slot.is_none() {
            *slot = Some(manager.clone());
            tracing::info!("redis connection established");
        }
        Ok(manager)
    }

    // --- JSON value helpers ---

    async fn put_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        let encoded = serde_json::to_string(value)?;
        let mut con = self.con().await?;
        let _: () = con.set(key, encoded).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let mut con = self.con().await?;
        let raw: Option<String> = con.get(key).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn delete_key(&self, key: &str) -> StorageResult<bool> {
        let mut con = self.con().await?;
        let removed: i64 = con.del(key).await?;
        Ok(removed > 0)
    }

    async fn add_to_set(&self, set: &str, member: &str) -> StorageResult<()> {
        let mut con = self.con().await?;
        let _: i64 = con.sadd(set, member).await?;
        Ok(())
    }

    async fn remove_from_set(&self, set: &str, member: &str) -> StorageResult<()> {
        let mut con = self.con().await?;
        let _: i64 = con.srem(set, member).await?;
        Ok(())
    }

    async fn set_members(&self, set: &str) -> StorageResult<Vec<String>> {
        let mut con = self.con().await?;
        let members: Vec<String> = con.smembers(set).await?;
        Ok(members)
    }

    /// Loads every record registered in an id set. Stale members (id in the
    /// set, record gone) are skipped.
    async fn list_from_set<T: DeserializeOwned>(
        &self,
        set: &str,
        key_of: fn(&str) -> String,
    ) -> StorageResult<Vec<T>> {
        let mut records = Vec::new();
        for id in self.set_members(set).await? {
            if let Some(record) = self.get_json(&key_of(&id)).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl Storage for RedisStore {
    // --- Users ---

    async fn create_user(&self, new: NewUser) -> StorageResult<User> {
        let user = User {
            id: new_id(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            is_admin: new.is_admin,
            created_at: now_ms(),
        };
        self.put_json(&user_key(&user.id), &user).await?;
        let mut con = self.con().await?;
        let _: () = con.set(user_email_key(&user.email), &user.id).await?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> StorageResult<Option<User>> {
        self.get_json(&user_key(id)).await
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let mut con = self.con().await?;
        let id: Option<String> = con.get(user_email_key(email)).await?;
        match id {
            Some(id) => self.get_json(&user_key(&id)).await,
            None => Ok(None),
        }
    }

    // --- Products ---

    async fn create_product(&self, new: NewProduct) -> StorageResult<Product> {
        let product = Product {
            id: new_id(),
            name: new.name,
            description: new.description,
            price: new.price,
            image_url: new.image_url,
            stock: new.stock,
            category_id: new.category_id,
            created_at: now_ms(),
        };
        self.put_json(&product_key(&product.id), &product).await?;
        self.add_to_set(PRODUCTS_SET, &product.id).await?;
        Ok(product)
    }

    async fn get_product(&self, id: &str) -> StorageResult<Option<Product>> {
        self.get_json(&product_key(id)).await
    }

    async fn list_products(&self) -> StorageResult<Vec<Product>> {
        self.list_from_set(PRODUCTS_SET, product_key).await
    }

    async fn update_product(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> StorageResult<Option<Product>> {
        let Some(mut product) = self.get_json::<Product>(&product_key(id)).await? else {
            return Ok(None);
        };
        update.apply_to(&mut product);
        self.put_json(&product_key(id), &product).await?;
        Ok(Some(product))
    }

    async fn delete_product(&self, id: &str) -> StorageResult<bool> {
        let removed = self.delete_key(&product_key(id)).await?;
        self.remove_from_set(PRODUCTS_SET, id).await?;
        Ok(removed)
    }

    // --- Categories ---

    async fn create_category(&self, new: NewCategory) -> StorageResult<Category> {
        let category = Category {
            id: new_id(),
            name: new.name,
            slug: new.slug,
        };
        self.put_json(&category_key(&category.id), &category).await?;
        self.add_to_set(CATEGORIES_SET, &category.id).await?;
        Ok(category)
    }

    async fn get_category(&self, id: &str) -> StorageResult<Option<Category>> {
        self.get_json(&category_key(id)).await
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        self.list_from_set(CATEGORIES_SET, category_key).await
    }

    async fn delete_category(&self, id: &str) -> StorageResult<bool> {
        let removed = self.delete_key(&category_key(id)).await?;
        self.remove_from_set(CATEGORIES_SET, id).await?;
        Ok(removed)
    }

    // --- Collections ---

    async fn create_collection(&self, new: NewCollection) -> StorageResult<Collection> {
        let collection = Collection {
            id: new_id(),
            name: new.name,
            slug: new.slug,
        };
        self.put_json(&collection_key(&collection.id), &collection)
            .await?;
        self.add_to_set(COLLECTIONS_SET, &collection.id).await?;
        Ok(collection)
    }

    async fn get_collection(&self, id: &str) -> StorageResult<Option<Collection>> {
        self.get_json(&collection_key(id)).await
    }

    async fn list_collections(&self) -> StorageResult<Vec<Collection>> {
        self.list_from_set(COLLECTIONS_SET, collection_key).await
    }

    async fn delete_collection(&self, id: &str) -> StorageResult<bool> {
        let removed = self.delete_key(&collection_key(id)).await?;
        self.remove_from_set(COLLECTIONS_SET, id).await?;
        Ok(removed)
    }

    // --- Orders ---

    async fn create_order(&self, new: NewOrder) -> StorageResult<Order> {
        let order = Order {
            id: new_id(),
            total: new.total(),
            user_id: new.user_id,
            lines: new.lines,
            status: OrderStatus::Pending,
            created_at: now_ms(),
        };
        self.put_json(&order_key(&order.id), &order).await?;
        self.add_to_set(&user_orders_key(&order.user_id), &order.id)
            .await?;
        Ok(order)
    }

    async fn get_order(&self, id: &str) -> StorageResult<Option<Order>> {
        self.get_json(&order_key(id)).await
    }

    async fn list_orders_for_user(&self, user_id: &str) -> StorageResult<Vec<Order>> {
        let mut orders = Vec::new();
        for id in self.set_members(&user_orders_key(user_id)).await? {
            if let Some(order) = self.get_json(&order_key(&id)).await? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> StorageResult<Option<Order>> {
        let Some(mut order) = self.get_json::<Order>(&order_key(id)).await? else {
            return Ok(None);
        };
        order.status = status;
        self.put_json(&order_key(id), &order).await?;
        Ok(Some(order))
    }

    // --- Reviews ---

    async fn create_review(&self, new: NewReview) -> StorageResult<Review> {
        let review = Review {
            id: new_id(),
            product_id: new.product_id,
            user_id: new.user_id,
            rating: new.rating,
            comment: new.comment,
            created_at: now_ms(),
        };
        self.put_json(&review_key(&review.id), &review).await?;
        self.add_to_set(&product_reviews_key(&review.product_id), &review.id)
            .await?;
        Ok(review)
    }

    async fn list_reviews_for_product(&self, product_id: &str) -> StorageResult<Vec<Review>> {
        let mut reviews = Vec::new();
        for id in self.set_members(&product_reviews_key(product_id)).await? {
            if let Some(review) = self.get_json(&review_key(&id)).await? {
                reviews.push(review);
            }
        }
        Ok(reviews)
    }

    async fn delete_review(&self, id: &str) -> StorageResult<bool> {
        let Some(review) = self.get_json::<Review>(&review_key(id)).await? else {
            return Ok(false);
        };
        self.delete_key(&review_key(id)).await?;
        self.remove_from_set(&product_reviews_key(&review.product_id), id)
            .await?;
        Ok(true)
    }

    // --- Testimonials ---

    async fn create_testimonial(&self, new: NewTestimonial) -> StorageResult<Testimonial> {
        let testimonial = Testimonial {
            id: new_id(),
            author: new.author,
            quote: new.quote,
            rating: new.rating,
        };
        self.put_json(&testimonial_key(&testimonial.id), &testimonial)
            .await?;
        self.add_to_set(TESTIMONIALS_SET, &testimonial.id).await?;
        Ok(testimonial)
    }

    async fn list_testimonials(&self) -> StorageResult<Vec<Testimonial>> {
        self.list_from_set(TESTIMONIALS_SET, testimonial_key).await
    }

    async fn delete_testimonial(&self, id: &str) -> StorageResult<bool> {
        let removed = self.delete_key(&testimonial_key(id)).await?;
        self.remove_from_set(TESTIMONIALS_SET, id).await?;
        Ok(removed)
    }

    // --- Banners ---

    async fn create_banner(&self, new: NewBanner) -> StorageResult<Banner> {
        let banner = Banner {
            id: new_id(),
            title: new.title,
            image_url: new.image_url,
            link: new.link,
            active: new.active,
        };
        self.put_json(&banner_key(&banner.id), &banner).await?;
        self.add_to_set(BANNERS_SET, &banner.id).await?;
        Ok(banner)
    }

    async fn list_banners(&self) -> StorageResult<Vec<Banner>> {
        self.list_from_set(BANNERS_SET, banner_key).await
    }

    async fn update_banner(
        &self,
        id: &str,
        update: BannerUpdate,
    ) -> StorageResult<Option<Banner>> {
        let Some(mut banner) = self.get_json::<Banner>(&banner_key(id)).await? else {
            return Ok(None);
        };
        update.apply_to(&mut banner);
        self.put_json(&banner_key(id), &banner).await?;
        Ok(Some(banner))
    }

    async fn delete_banner(&self, id: &str) -> StorageResult<bool> {
        let removed = self.delete_key(&banner_key(id)).await?;
        self.remove_from_set(BANNERS_SET, id).await?;
        Ok(removed)
    }

    // --- Carts ---

    async fn create_cart(&self, new: NewCart) -> StorageResult<Cart> {
        let cart = Cart {
            id: new_id(),
            user_id: new.user_id,
            session_id: new.session_id,
            created_at: now_ms(),
        };
        self.put_json(&cart_key(&cart.id), &cart).await?;
        let mut con = self.con().await?;
        if let Some(user_id) = &cart.user_id {
            let _: () = con.set(cart_user_key(user_id), &cart.id).await?;
        }
        if let Some(session_id) = &cart.session_id {
            let _: () = con.set(cart_session_key(session_id), &cart.id).await?;
        }
        Ok(cart)
    }

    async fn get_cart(&self, id: &str) -> StorageResult<Option<Cart>> {
        self.get_json(&cart_key(id)).await
    }

    async fn find_cart_by_user(&self, user_id: &str) -> StorageResult<Option<Cart>> {
        let mut con = self.con().await?;
        let id: Option<String> = con.get(cart_user_key(user_id)).await?;
        match id {
            Some(id) => self.get_json(&cart_key(&id)).await,
            None => Ok(None),
        }
    }

    async fn find_cart_by_session(&self, session_id: &str) -> StorageResult<Option<Cart>> {
        let mut con = self.con().await?;
        let id: Option<String> = con.get(cart_session_key(session_id)).await?;
        match id {
            Some(id) => self.get_json(&cart_key(&id)).await,
            None => Ok(None),
        }
    }

    // --- Cart items ---

    async fn upsert_cart_item(
        &self,
        cart_id: &str,
        product_id: &str,
        quantity: u32,
        is_free: bool,
    ) -> StorageResult<CartItem> {
        let id = cart_item_id(cart_id, product_id, is_free);
        let item = match self.get_json::<CartItem>(&cart_item_key(&id)).await? {
            Some(mut existing) => {
                existing.quantity += quantity;
                existing
            }
            None => CartItem {
                id: id.clone(),
                cart_id: cart_id.to_string(),
                product_id: product_id.to_string(),
                quantity,
                is_free,
                added_at: now_ms(),
            },
        };
        self.put_json(&cart_item_key(&id), &item).await?;
        self.add_to_set(&cart_items_key(cart_id), &id).await?;
        Ok(item)
    }

    async fn get_cart_item(&self, id: &str) -> StorageResult<Option<CartItem>> {
        self.get_json(&cart_item_key(id)).await
    }

    async fn get_cart_items(&self, cart_id: &str) -> StorageResult<Vec<CartItem>> {
        let mut items = Vec::new();
        for id in self.set_members(&cart_items_key(cart_id)).await? {
            if let Some(item) = self.get_json(&cart_item_key(&id)).await? {
                items.push(item);
            }
        }
        Ok(items)
    }

    async fn update_cart_item_quantity(
        &self,
        id: &str,
        quantity: u32,
    ) -> StorageResult<Option<CartItem>> {
        let Some(mut item) = self.get_json::<CartItem>(&cart_item_key(id)).await? else {
            return Ok(None);
        };

        if quantity == 0 {
            self.delete_key(&cart_item_key(id)).await?;
            self.remove_from_set(&cart_items_key(&item.cart_id), id)
                .await?;
            return Ok(None);
        }

        item.quantity = quantity;
        self.put_json(&cart_item_key(id), &item).await?;
        Ok(Some(item))
    }

    async fn remove_cart_item(&self, id: &str) -> StorageResult<bool> {
        let Some(item) = self.get_json::<CartItem>(&cart_item_key(id)).await? else {
            return Ok(false);
        };
        self.delete_key(&cart_item_key(id)).await?;
        self.remove_from_set(&cart_items_key(&item.cart_id), id)
            .await?;
        Ok(true)
    }

    async fn clear_cart(&self, cart_id: &str) -> StorageResult<()> {
        for id in self.set_members(&cart_items_key(cart_id)).await? {
            self.delete_key(&cart_item_key(&id)).await?;
        }
        self.delete_key(&cart_items_key(cart_id)).await?;
        Ok(())
    }

    // --- Free-product configuration ---

    async fn create_free_product(&self, new: NewFreeProduct) -> StorageResult<FreeProduct> {
        let config = FreeProduct {
            id: new_id(),
            product_id: new.product_id,
            enabled: new.enabled,
            min_order_value: new.min_order_value,
            max_order_value: new.max_order_value,
            created_at: now_ms(),
        };
        self.put_json(&free_product_key(&config.id), &config).await?;
        self.add_to_set(FREE_PRODUCTS_SET, &config.id).await?;
        let mut con = self.con().await?;
        let _: () = con
            .set(free_product_target_key(&config.product_id), &config.id)
            .await?;
        Ok(config)
    }

    async fn get_free_product(&self, id: &str) -> StorageResult<Option<FreeProduct>> {
        self.get_json(&free_product_key(id)).await
    }

    async fn find_free_product_for_product(
        &self,
        product_id: &str,
    ) -> StorageResult<Option<FreeProduct>> {
        let mut con = self.con().await?;
        let id: Option<String> = con.get(free_product_target_key(product_id)).await?;
        match id {
            Some(id) => self.get_json(&free_product_key(&id)).await,
            None => Ok(None),
        }
    }

    async fn list_free_products(&self) -> StorageResult<Vec<FreeProduct>> {
        self.list_from_set(FREE_PRODUCTS_SET, free_product_key).await
    }

    async fn update_free_product(
        &self,
        id: &str,
        update: NewFreeProduct,
    ) -> StorageResult<Option<FreeProduct>> {
        let Some(mut config) = self.get_json::<FreeProduct>(&free_product_key(id)).await? else {
            return Ok(None);
        };

        if config.product_id != update.product_id {
            self.delete_key(&free_product_target_key(&config.product_id))
                .await?;
        }
        config.product_id = update.product_id;
        config.enabled = update.enabled;
        config.min_order_value = update.min_order_value;
        config.max_order_value = update.max_order_value;

        self.put_json(&free_product_key(id), &config).await?;
        let mut con = self.con().await?;
        let _: () = con
            .set(free_product_target_key(&config.product_id), id)
            .await?;
        Ok(Some(config))
    }

    async fn delete_free_product(&self, id: &str) -> StorageResult<bool> {
        let Some(config) = self.get_json::<FreeProduct>(&free_product_key(id)).await? else {
            return Ok(false);
        };
        self.delete_key(&free_product_key(id)).await?;
        self.remove_from_set(FREE_PRODUCTS_SET, id).await?;
        self.delete_key(&free_product_target_key(&config.product_id))
            .await?;
        Ok(true)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let mut con = self.con().await?;
        let _: Option<String> = con.get(HEALTH_KEY).await?;
        Ok(())
    }
}
