//! Response DTOs for cart endpoints.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::ProductKind;

use super::services::{CartItem, CartView};

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub kind: ProductKind,
    pub slug: String,
    pub title: String,
    pub url: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            kind: item.product.kind,
            slug: item.product.slug.clone(),
            title: item.product.title.clone(),
            url: item.product.absolute_url(),
            quantity: item.line.quantity,
            unit_price: item.product.price,
            total_price: item.line.total_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    /// `None` while the shopper has no cart yet
    pub id: Option<i32>,
    pub total_products: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub in_order: bool,
    pub for_anonymous_user: bool,
    pub items: Vec<CartItemResponse>,
}

impl From<&CartView> for CartResponse {
    fn from(view: &CartView) -> Self {
        Self {
            id: Some(view.cart.id),
            total_products: view.cart.total_products,
            total_price: view.cart.total_price,
            in_order: view.cart.in_order,
            for_anonymous_user: view.cart.for_anonymous_user,
            items: view.items.iter().map(CartItemResponse::from).collect(),
        }
    }
}

impl CartResponse {
    /// Response for a shopper who may not have a cart yet
    pub fn from_view(view: Option<&CartView>) -> Self {
        match view {
            Some(view) => Self::from(view),
            None => Self {
                id: None,
                total_products: 0,
                total_price: Decimal::ZERO,
                in_order: false,
                for_anonymous_user: false,
                items: Vec::new(),
            },
        }
    }
}
