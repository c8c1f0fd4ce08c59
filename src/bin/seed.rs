//! Demo-data seeder.
//!
//! Posts a small catalog (categories, products, a banner, a testimonial and
//! two free-product configurations) to a running shopfront instance.
//!
//! ```sh
//! SHOPFRONT_URL=http://127.0.0.1:8080 cargo run --bin seed
//! ```

use anyhow::Result;
use serde_json::{json, Value};

use shopfront::admin::protocol::{
    ENDPOINT_ADMIN_BANNERS, ENDPOINT_ADMIN_CATEGORIES, ENDPOINT_ADMIN_FREE_PRODUCTS,
    ENDPOINT_ADMIN_PRODUCTS, ENDPOINT_ADMIN_TESTIMONIALS,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let base_url = std::env::var("SHOPFRONT_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let base_url = base_url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    tracing::info!("Seeding {}", base_url);

    let kitchen = post_json(
        &client,
        &format!("{base_url}{ENDPOINT_ADMIN_CATEGORIES}"),
        json!({ "name": "Kitchen", "slug": "kitchen" }),
    )
    .await?;
    let kitchen_id = kitchen["id"].as_str().unwrap_or_default().to_string();

    let products = [
        ("Steel Kettle", 1200, "1.5l brushed steel kettle"),
        ("Toaster", 1300, "Two-slot toaster with crumb tray"),
        ("Ceramic Mug", 250, "300ml glazed mug"),
        ("Coaster Set", 199, "Set of four cork coasters"),
    ];

    let mut product_ids = Vec::new();
    for (name, price, description) in products {
        let product = post_json(
            &client,
            &format!("{base_url}{ENDPOINT_ADMIN_PRODUCTS}"),
            json!({
                "name": name,
                "description": description,
                "price": price,
                "image_url": format!("https://cdn.example/{}.jpg", name.to_lowercase().replace(' ', "-")),
                "stock": 50,
                "category_id": kitchen_id,
            }),
        )
        .await?;
        let id = product["id"].as_str().unwrap_or_default().to_string();
        tracing::info!("product {} -> {}", name, id);
        product_ids.push(id);
    }

    // The mug is free between ₹1000 and ₹2000; the coaster set from ₹1500 up.
    post_json(
        &client,
        &format!("{base_url}{ENDPOINT_ADMIN_FREE_PRODUCTS}"),
        json!({
            "product_id": product_ids[2],
            "min_order_value": 1000,
            "max_order_value": 2000,
        }),
    )
    .await?;
    post_json(
        &client,
        &format!("{base_url}{ENDPOINT_ADMIN_FREE_PRODUCTS}"),
        json!({
            "product_id": product_ids[3],
            "min_order_value": 1500,
        }),
    )
    .await?;

    post_json(
        &client,
        &format!("{base_url}{ENDPOINT_ADMIN_BANNERS}"),
        json!({
            "title": "Monsoon kitchen sale",
            "image_url": "https://cdn.example/banners/monsoon.jpg",
            "link": "/collections/kitchen",
        }),
    )
    .await?;

    post_json(
        &client,
        &format!("{base_url}{ENDPOINT_ADMIN_TESTIMONIALS}"),
        json!({
            "author": "Asha",
            "quote": "The free mug actually showed up in my cart.",
            "rating": 5,
        }),
    )
    .await?;

    tracing::info!("Seed complete");
    Ok(())
}

async fn post_json(client: &reqwest::Client, url: &str, body: Value) -> Result<Value> {
    let response = client.post(url).json(&body).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("POST {} failed: {}", url, response.status());
    }
    Ok(response.json().await?)
}
