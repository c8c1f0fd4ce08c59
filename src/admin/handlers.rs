use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};

use super::protocol::OrderStatusRequest;
use crate::error::ApiError;
use crate::storage::backend::Storage;
use crate::storage::types::*;

fn not_found(what: &str, id: &str) -> ApiError {
    ApiError::NotFound(format!("{what} {id} not found"))
}

// --- Free-product configuration ---

pub async fn handle_list_free_products(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Json<Vec<FreeProduct>>, ApiError> {
    Ok(Json(storage.list_free_products().await?))
}

pub async fn handle_create_free_product(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Json(req): Json<NewFreeProduct>,
) -> Result<(StatusCode, Json<FreeProduct>), ApiError> {
    if storage.get_product(&req.product_id).await?.is_none() {
        return Err(not_found("product", &req.product_id));
    }
    if let Some(max) = req.max_order_value {
        if max < req.min_order_value {
            return Err(ApiError::BadRequest(
                "max_order_value must not be below min_order_value".to_string(),
            ));
        }
    }

    let config = storage.create_free_product(req).await?;
    tracing::info!(
        "free product {} configured for product {}",
        config.id,
        config.product_id
    );
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn handle_update_free_product(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
    Json(req): Json<NewFreeProduct>,
) -> Result<Json<FreeProduct>, ApiError> {
    if let Some(max) = req.max_order_value {
        if max < req.min_order_value {
            return Err(ApiError::BadRequest(
                "max_order_value must not be below min_order_value".to_string(),
            ));
        }
    }

    storage
        .update_free_product(&id, req)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("free product", &id))
}

pub async fn handle_delete_free_product(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if storage.delete_free_product(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("free product", &id))
    }
}

// --- Products ---

pub async fn handle_create_product(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = storage.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn handle_update_product(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    storage
        .update_product(&id, req)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("product", &id))
}

pub async fn handle_delete_product(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if storage.delete_product(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("product", &id))
    }
}

// --- Categories ---

pub async fn handle_create_category(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Json(req): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = storage.create_category(req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn handle_delete_category(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if storage.delete_category(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("category", &id))
    }
}

// --- Collections ---

pub async fn handle_create_collection(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Json(req): Json<NewCollection>,
) -> Result<(StatusCode, Json<Collection>), ApiError> {
    let collection = storage.create_collection(req).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn handle_delete_collection(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if storage.delete_collection(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("collection", &id))
    }
}

// --- Banners ---

pub async fn handle_create_banner(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Json(req): Json<NewBanner>,
) -> Result<(StatusCode, Json<Banner>), ApiError> {
    let banner = storage.create_banner(req).await?;
    Ok((StatusCode::CREATED, Json(banner)))
}

pub async fn handle_update_banner(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
    Json(req): Json<BannerUpdate>,
) -> Result<Json<Banner>, ApiError> {
    storage
        .update_banner(&id, req)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("banner", &id))
}

pub async fn handle_delete_banner(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if storage.delete_banner(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("banner", &id))
    }
}

// --- Testimonials ---

pub async fn handle_create_testimonial(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Json(req): Json<NewTestimonial>,
) -> Result<(StatusCode, Json<Testimonial>), ApiError> {
    let testimonial = storage.create_testimonial(req).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

pub async fn handle_delete_testimonial(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if storage.delete_testimonial(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("testimonial", &id))
    }
}

// --- Orders ---

pub async fn handle_update_order_status(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(id): Path<String>,
    Json(req): Json<OrderStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    storage
        .update_order_status(&id, req.status)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("order", &id))
}
