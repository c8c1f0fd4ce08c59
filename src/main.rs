use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Extension;
use axum::http::{header::CONTENT_TYPE, Method};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use shopfront::admin::handlers as admin;
use shopfront::admin::protocol::{
    ENDPOINT_ADMIN_BANNERS, ENDPOINT_ADMIN_CATEGORIES, ENDPOINT_ADMIN_COLLECTIONS,
    ENDPOINT_ADMIN_FREE_PRODUCTS, ENDPOINT_ADMIN_PRODUCTS, ENDPOINT_ADMIN_TESTIMONIALS,
};
use shopfront::cart::engine::CartService;
use shopfront::cart::handlers as cart;
use shopfront::cart::protocol::{ENDPOINT_CART, ENDPOINT_CART_ITEMS};
use shopfront::catalog::handlers as catalog;
use shopfront::catalog::protocol::{
    ENDPOINT_BANNERS, ENDPOINT_CATEGORIES, ENDPOINT_COLLECTIONS, ENDPOINT_ORDERS,
    ENDPOINT_PRODUCTS, ENDPOINT_TESTIMONIALS,
};
use shopfront::config::Config;
use shopfront::storage::backend::Storage;
use shopfront::storage::fallback::FallbackStorage;
use shopfront::storage::memory::MemoryStore;
use shopfront::storage::remote::RedisStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::load();

    let args: Vec<String> = std::env::args().collect();
    let mut bind_addr: SocketAddr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let mut redis_url = config.redis_url.clone();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = args[i + 1].parse()?;
                i += 2;
            }
            "--redis-url" => {
                redis_url = args[i + 1].clone();
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    tracing::info!("Starting shopfront on {}", bind_addr);

    // 1. Storage layer: remote + in-memory behind the failover facade.
    let remote = Arc::new(RedisStore::connect(&redis_url).await?);
    let memory = Arc::new(MemoryStore::new());
    let facade = FallbackStorage::connect(remote, memory).await;
    facade.spawn_health_monitor(Duration::from_secs(config.health_probe_secs));

    let storage: Arc<dyn Storage> = facade.clone();

    // 2. Cart core:
    let cart_service = Arc::new(CartService::new(storage.clone()));

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    // 3. HTTP Router:
    let app = Router::new()
        // Storefront
        .route(ENDPOINT_PRODUCTS, get(catalog::handle_list_products))
        .route("/api/products/:id", get(catalog::handle_get_product))
        .route(
            "/api/products/:id/reviews",
            get(catalog::handle_list_reviews).post(catalog::handle_create_review),
        )
        .route(ENDPOINT_CATEGORIES, get(catalog::handle_list_categories))
        .route(ENDPOINT_COLLECTIONS, get(catalog::handle_list_collections))
        .route(ENDPOINT_BANNERS, get(catalog::handle_list_banners))
        .route(ENDPOINT_TESTIMONIALS, get(catalog::handle_list_testimonials))
        .route(ENDPOINT_ORDERS, post(catalog::handle_create_order))
        .route("/api/orders/:id", get(catalog::handle_get_order))
        .route("/api/users/:id/orders", get(catalog::handle_list_user_orders))
        // Cart
        .route(ENDPOINT_CART, post(cart::handle_get_or_create_cart))
        .route("/api/cart/:id", get(cart::handle_cart_view))
        .route("/api/cart/:id/items", delete(cart::handle_clear_cart))
        .route(ENDPOINT_CART_ITEMS, post(cart::handle_add_item))
        .route(
            "/api/cart/items/:id",
            put(cart::handle_update_item).delete(cart::handle_remove_item),
        )
        // Administration
        .route(
            ENDPOINT_ADMIN_FREE_PRODUCTS,
            get(admin::handle_list_free_products).post(admin::handle_create_free_product),
        )
        .route(
            "/api/admin/free-products/:id",
            put(admin::handle_update_free_product).delete(admin::handle_delete_free_product),
        )
        .route(ENDPOINT_ADMIN_PRODUCTS, post(admin::handle_create_product))
        .route(
            "/api/admin/products/:id",
            put(admin::handle_update_product).delete(admin::handle_delete_product),
        )
        .route(ENDPOINT_ADMIN_CATEGORIES, post(admin::handle_create_category))
        .route(
            "/api/admin/categories/:id",
            delete(admin::handle_delete_category),
        )
        .route(
            ENDPOINT_ADMIN_COLLECTIONS,
            post(admin::handle_create_collection),
        )
        .route(
            "/api/admin/collections/:id",
            delete(admin::handle_delete_collection),
        )
        .route(ENDPOINT_ADMIN_BANNERS, post(admin::handle_create_banner))
        .route(
            "/api/admin/banners/:id",
            put(admin::handle_update_banner).delete(admin::handle_delete_banner),
        )
        .route(
            ENDPOINT_ADMIN_TESTIMONIALS,
            post(admin::handle_create_testimonial),
        )
        .route(
            "/api/admin/testimonials/:id",
            delete(admin::handle_delete_testimonial),
        )
        .route(
            "/api/admin/orders/:id/status",
            put(admin::handle_update_order_status),
        )
        .layer(cors)
        .layer(Extension(storage))
        .layer(Extension(cart_service));

    // 4. Serve until shutdown:
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        tracing::info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
