//! Cart route handlers.
//!
//! The product kind in the path is parsed before any database access, so an
//! unknown kind is a plain 404.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};

use crate::cart::{
    self,
    requests::{AddToCartRequest, ChangeQuantityRequest},
    responses::CartResponse,
    CartAction,
};
use crate::error::{AppError, Result};
use crate::models::ProductKind;
use crate::AppState;

use super::shopper::Shopper;

type CartReply = (HeaderMap, Json<CartResponse>);

/// Cart contents. Reading never creates a cart; a shopper without one sees
/// an empty cart.
pub async fn cart_detail(
    State(state): State<AppState>,
    shopper: Shopper,
) -> Result<Json<CartResponse>> {
    let view = match shopper.existing_owner(&state.db).await? {
        Some(owner) => cart::get_cart_view(&state.db, &owner).await?,
        None => None,
    };
    Ok(Json(CartResponse::from_view(view.as_ref())))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    shopper: Shopper,
    Path((ct_model, slug)): Path<(String, String)>,
    body: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<CartReply> {
    let kind: ProductKind = ct_model.parse()?;
    let quantity = match body {
        Ok(Json(req)) => req.quantity(),
        // no JSON body at all: add one
        Err(JsonRejection::MissingJsonContentType(_)) => 1,
        Err(rejection) => return Err(AppError::Validation(rejection.body_text())),
    };
    mutate(&state, shopper, kind, &slug, CartAction::Add(quantity)).await
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    shopper: Shopper,
    Path((ct_model, slug)): Path<(String, String)>,
) -> Result<CartReply> {
    let kind: ProductKind = ct_model.parse()?;
    mutate(&state, shopper, kind, &slug, CartAction::Remove).await
}

pub async fn change_quantity(
    State(state): State<AppState>,
    shopper: Shopper,
    Path((ct_model, slug)): Path<(String, String)>,
    Json(req): Json<ChangeQuantityRequest>,
) -> Result<CartReply> {
    let kind: ProductKind = ct_model.parse()?;
    mutate(&state, shopper, kind, &slug, CartAction::SetQuantity(req.quantity)).await
}

async fn mutate(
    state: &AppState,
    shopper: Shopper,
    kind: ProductKind,
    slug: &str,
    action: CartAction,
) -> Result<CartReply> {
    let resolved = shopper.resolve(&state.db).await?;
    let view = cart::apply_cart_mutation(&state.db, &resolved.owner, kind, slug, action).await?;
    Ok((resolved.headers()?, Json(CartResponse::from(&view))))
}
