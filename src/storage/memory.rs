use dashmap::DashMap;

use super::backend::{Storage, StorageResult};
use super::types::*;
use async_trait::async_trait;

/// In-memory backend. One concurrent map per entity; cart items are held in
/// a nested per-cart map so cart-scoped reads and clears touch one entry.
///
/// State is process-local and lost on restart. This store doubles as the
/// failover target when the remote backend is unreachable, and as the
/// storage used by unit tests.
pub struct MemoryStore {
    users: DashMap<String, User>,
    products: DashMap<String, Product>,
    categories: DashMap<String, Category>,
    collections: DashMap<String, Collection>,
    orders: DashMap<String, Order>,
    reviews: DashMap<String, Review>,
    testimonials: DashMap<String, Testimonial>,
    banners: DashMap<String, Banner>,
    carts: DashMap<String, Cart>,
    // cart id -> item id -> item
    cart_items: DashMap<String, DashMap<String, CartItem>>,
    free_products: DashMap<String, FreeProduct>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            products: DashMap::new(),
            categories: DashMap::new(),
            collections: DashMap::new(),
            orders: DashMap::new(),
            reviews: DashMap::new(),
            testimonials: DashMap::new(),
            banners: DashMap::new(),
            carts: DashMap::new(),
            cart_items: DashMap::new(),
            free_products: DashMap::new(),
        }
    }

    // Item ids embed the owning cart id as their first `:`-separated segment.
    fn owning_cart(item_id: &str) -> Option<&str> {
        item_id.split(':').next()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStore {
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
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> StorageResult<Option<User>> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone()))
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
        self.products.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: &str) -> StorageResult<Option<Product>> {
        Ok(self.products.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_products(&self) -> StorageResult<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update_product(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> StorageResult<Option<Product>> {
        match self.products.get_mut(id) {
            Some(mut entry) => {
                update.apply_to(entry.value_mut());
                Ok(Some(entry.value().clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_product(&self, id: &str) -> StorageResult<bool> {
        Ok(self.products.remove(id).is_some())
    }

    // --- Categories ---

    async fn create_category(&self, new: NewCategory) -> StorageResult<Category> {
        let category = Category {
            id: new_id(),
            name: new.name,
            slug: new.slug,
        };
        self.categories.insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: &str) -> StorageResult<Option<Category>> {
        Ok(self.categories.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        Ok(self
            .categories
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_category(&self, id: &str) -> StorageResult<bool> {
        Ok(self.categories.remove(id).is_some())
    }

    // --- Collections ---

    async fn create_collection(&self, new: NewCollection) -> StorageResult<Collection> {
        let collection = Collection {
            id: new_id(),
            name: new.name,
            slug: new.slug,
        };
        self.collections
            .insert(collection.id.clone(), collection.clone());
        Ok(collection)
    }

    async fn get_collection(&self, id: &str) -> StorageResult<Option<Collection>> {
        Ok(self.collections.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_collections(&self) -> StorageResult<Vec<Collection>> {
        Ok(self
            .collections
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_collection(&self, id: &str) -> StorageResult<bool> {
        Ok(self.collections.remove(id).is_some())
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
        self.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: &str) -> StorageResult<Option<Order>> {
        Ok(self.orders.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_orders_for_user(&self, user_id: &str) -> StorageResult<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> StorageResult<Option<Order>> {
        match self.orders.get_mut(id) {
            Some(mut entry) => {
                entry.value_mut().status = status;
                Ok(Some(entry.value().clone()))
            }
            None => Ok(None),
        }
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
        self.reviews.insert(review.id.clone(), review.clone());
        Ok(review)
    }

    async fn list_reviews_for_product(&self, product_id: &str) -> StorageResult<Vec<Review>> {
        Ok(self
            .reviews
            .iter()
            .filter(|entry| entry.value().product_id == product_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_review(&self, id: &str) -> StorageResult<bool> {
        Ok(self.reviews.remove(id).is_some())
    }

    // --- Testimonials ---

    async fn create_testimonial(&self, new: NewTestimonial) -> StorageResult<Testimonial> {
        let testimonial = Testimonial {
            id: new_id(),
            author: new.author,
            quote: new.quote,
            rating: new.rating,
        };
        self.testimonials
            .insert(testimonial.id.clone(), testimonial.clone());
        Ok(testimonial)
    }

    async fn list_testimonials(&self) -> StorageResult<Vec<Testimonial>> {
        Ok(self
            .testimonials
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_testimonial(&self, id: &str) -> StorageResult<bool> {
        Ok(self.testimonials.remove(id).is_some())
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
        self.banners.insert(banner.id.clone(), banner.clone());
        Ok(banner)
    }

    async fn list_banners(&self) -> StorageResult<Vec<Banner>> {
        Ok(self
            .banners
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update_banner(
        &self,
        id: &str,
        update: BannerUpdate,
    ) -> StorageResult<Option<Banner>> {
        match self.banners.get_mut(id) {
            Some(mut entry) => {
                update.apply_to(entry.value_mut());
                Ok(Some(entry.value().clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_banner(&self, id: &str) -> StorageResult<bool> {
        Ok(self.banners.remove(id).is_some())
    }

    // --- Carts ---

    async fn create_cart(&self, new: NewCart) -> StorageResult<Cart> {
        let cart = Cart {
            id: new_id(),
            user_id: new.user_id,
            session_id: new.session_id,
            created_at: now_ms(),
        };
        self.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, id: &str) -> StorageResult<Option<Cart>> {
        Ok(self.carts.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_cart_by_user(&self, user_id: &str) -> StorageResult<Option<Cart>> {
        Ok(self
            .carts
            .iter()
            .find(|entry| entry.value().user_id.as_deref() == Some(user_id))
            .map(|entry| entry.value().clone()))
    }

    async fn find_cart_by_session(&self, session_id: &str) -> StorageResult<Option<Cart>> {
        Ok(self
            .carts
            .iter()
            .find(|entry| entry.value().session_id.as_deref() == Some(session_id))
            .map(|entry| entry.value().clone()))
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
        let items = self
            .cart_items
            .entry(cart_id.to_string())
            .or_insert_with(DashMap::new);

        let item = match items.get_mut(&id) {
            Some(mut existing) => {
                existing.value_mut().quantity += quantity;
                existing.value().clone()
            }
            None => {
                let item = CartItem {
                    id: id.clone(),
                    cart_id: cart_id.to_string(),
                    product_id: product_id.to_string(),
                    quantity,
                    is_free,
                    added_at: now_ms(),
                };
                items.insert(id, item.clone());
                item
            }
        };

        Ok(item)
    }

    async fn get_cart_item(&self, id: &str) -> StorageResult<Option<CartItem>> {
        let Some(cart_id) = Self::owning_cart(id) else {
            return Ok(None);
        };
        Ok(self
            .cart_items
            .get(cart_id)
            .and_then(|items| items.get(id).map(|entry| entry.value().clone())))
    }

    async fn get_cart_items(&self, cart_id: &str) -> StorageResult<Vec<CartItem>> {
        Ok(self
            .cart_items
            .get(cart_id)
            .map(|items| items.iter().map(|entry| entry.value().clone()).collect())
            .unwrap_or_default())
    }

    async fn update_cart_item_quantity(
        &self,
        id: &str,
        quantity: u32,
    ) -> StorageResult<Option<CartItem>> {
        let Some(cart_id) = Self::owning_cart(id) else {
            return Ok(None);
        };
        let Some(items) = self.cart_items.get(cart_id) else {
            return Ok(None);
        };

        if quantity == 0 {
            items.remove(id);
            return Ok(None);
        }

        let result = match items.get_mut(id) {
            Some(mut entry) => {
                entry.value_mut().quantity = quantity;
                Ok(Some(entry.value().clone()))
            }
            None => Ok(None),
        };
        result
    }

    async fn remove_cart_item(&self, id: &str) -> StorageResult<bool> {
        let Some(cart_id) = Self::owning_cart(id) else {
            return Ok(false);
        };
        Ok(self
            .cart_items
            .get(cart_id)
            .map(|items| items.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn clear_cart(&self, cart_id: &str) -> StorageResult<()> {
        self.cart_items.remove(cart_id);
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
        self.free_products.insert(config.id.clone(), config.clone());
        Ok(config)
    }

    async fn get_free_product(&self, id: &str) -> StorageResult<Option<FreeProduct>> {
        Ok(self.free_products.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_free_product_for_product(
        &self,
        product_id: &str,
    ) -> StorageResult<Option<FreeProduct>> {
        Ok(self
            .free_products
            .iter()
            .find(|entry| entry.value().product_id == product_id)
            .map(|entry| entry.value().clone()))
    }

    async fn list_free_products(&self) -> StorageResult<Vec<FreeProduct>> {
        Ok(self
            .free_products
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update_free_product(
        &self,
        id: &str,
        update: NewFreeProduct,
    ) -> StorageResult<Option<FreeProduct>> {
        match self.free_products.get_mut(id) {
            Some(mut entry) => {
                let config = entry.value_mut();
                config.product_id = update.product_id;
                config.enabled = update.enabled;
                config.min_order_value = update.min_order_value;
                config.max_order_value = update.max_order_value;
                Ok(Some(config.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_free_product(&self, id: &str) -> StorageResult<bool> {
        Ok(self.free_products.remove(id).is_some())
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
