use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};

use super::engine::{CartService, CartView};
use super::protocol::{AddItemRequest, CreateCartRequest, UpdateItemRequest, UpdateItemResponse};
use crate::error::ApiError;
use crate::storage::types::{Cart, CartItem};

pub async fn handle_get_or_create_cart(
    Extension(cart): Extension<Arc<CartService>>,
    Json(req): Json<CreateCartRequest>,
) -> Result<Json<Cart>, ApiError> {
    let cart = cart.get_or_create_cart(req.user_id, req.session_id).await?;
    Ok(Json(cart))
}

pub async fn handle_cart_view(
    Extension(cart): Extension<Arc<CartService>>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(cart.cart_view(&cart_id).await?))
}

pub async fn handle_add_item(
    Extension(cart): Extension<Arc<CartService>>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartItem>, ApiError> {
    let item = cart
        .add_item(&req.cart_id, &req.product_id, req.quantity, req.is_free)
        .await?;
    Ok(Json(item))
}

pub async fn handle_update_item(
    Extension(cart): Extension<Arc<CartService>>,
    Path(item_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<UpdateItemResponse>, ApiError> {
    let item = cart.update_quantity(&item_id, req.quantity).await?;
    Ok(Json(UpdateItemResponse {
        removed: item.is_none(),
        item,
    }))
}

pub async fn handle_remove_item(
    Extension(cart): Extension<Arc<CartService>>,
    Path(item_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    cart.remove_item(&item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_clear_cart(
    Extension(cart): Extension<Arc<CartService>>,
    Path(cart_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    cart.clear_cart(&cart_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
