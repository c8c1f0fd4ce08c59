use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};

use super::protocol::{CreateOrderRequest, CreateReviewRequest};
use crate::error::ApiError;
use crate::storage::backend::Storage;
use crate::storage::types::*;

pub async fn handle_list_products(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(storage.list_products().await?))
}

pub async fn handle_get_product(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    storage
        .get_product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}

pub async fn handle_list_categories(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(storage.list_categories().await?))
}

pub async fn handle_list_collections(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Json<Vec<Collection>>, ApiError> {
    Ok(Json(storage.list_collections().await?))
}

/// Storefront banners: only the active ones are served.
pub async fn handle_list_banners(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Json<Vec<Banner>>, ApiError> {
    let banners = storage
        .list_banners()
        .await?
        .into_iter()
        .filter(|banner| banner.active)
        .collect();
    Ok(Json(banners))
}

pub async fn handle_list_testimonials(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Json<Vec<Testimonial>>, ApiError> {
    Ok(Json(storage.list_testimonials().await?))
}

// --- Reviews ---

pub async fn handle_list_reviews(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(storage.list_reviews_for_product(&product_id).await?))
}

pub async fn handle_create_review(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(product_id): Path<String>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    if storage.get_product(&product_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("product {product_id} not found")));
    }

    let review = storage
        .create_review(NewReview {
            product_id,
            user_id: req.user_id,
            rating: req.rating,
            comment: req.comment,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

// --- Orders ---

pub async fn handle_create_order(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    if req.items.is_empty() {
        return Err(ApiError::BadRequest(
            "order must contain at least one item".to_string(),
        ));
    }

    let mut lines = Vec::with_capacity(req.items.len());
    for item in &req.items {
        if item.quantity == 0 {
            return Err(ApiError::BadRequest(
                "order line quantity must be at least 1".to_string(),
            ));
        }
        let product = storage
            .get_product(&item.product_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("product {} not found", item.product_id)))?;
        lines.push(OrderLine {
            product_id: product.id,
            quantity: item.quantity,
            unit_price: product.price,
        });
    }

    let order = storage
        .create_order(NewOrder {
            user_id: req.user_id,
            lines,
        })
        .await?;
    tracing::info!("order {} placed, total {}", order.id, order.total);
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn handle_get_order(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    storage
        .get_order(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))
}

pub async fn handle_list_user_orders(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(storage.list_orders_for_user(&user_id).await?))
}
