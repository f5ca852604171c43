//! Checkout route handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    Json,
};
use serde::Serialize;

use crate::cart::{self, responses::CartResponse};
use crate::error::Result;
use crate::models::{BuyingType, CartOwner};
use crate::orders::{self, CheckoutForm, OrderResponse};
use crate::AppState;

use super::shopper::RegisteredUser;

/// Where the shopper goes after placing an order
pub const THANK_YOU_PATH: &str = "/make-order/thank_you/";

#[derive(Debug, Serialize)]
pub struct BuyingTypeChoice {
    pub value: BuyingType,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CheckoutSummary {
    pub cart: CartResponse,
    pub buying_types: Vec<BuyingTypeChoice>,
}

/// Cart contents and the delivery choices for the order form
pub async fn checkout_summary(
    State(state): State<AppState>,
    RegisteredUser(user_id): RegisteredUser,
) -> Result<Json<CheckoutSummary>> {
    let customer = orders::customer_for_account(&state.db, user_id).await?;
    let view = cart::get_cart_view(&state.db, &CartOwner::Customer(customer.id)).await?;
    Ok(Json(CheckoutSummary {
        cart: CartResponse::from_view(view.as_ref()),
        buying_types: BuyingType::ALL
            .into_iter()
            .map(|value| BuyingTypeChoice {
                value,
                label: value.label(),
            })
            .collect(),
    }))
}

/// Place an order from the account's open cart
pub async fn make_order(
    State(state): State<AppState>,
    RegisteredUser(user_id): RegisteredUser,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, [(header::HeaderName, &'static str); 1], Json<OrderResponse>)> {
    let order = orders::checkout(&state.db, user_id, form).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, THANK_YOU_PATH)],
        Json(OrderResponse::try_from(&order)?),
    ))
}
