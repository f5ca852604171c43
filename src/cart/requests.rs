//! Request DTOs for cart endpoints.

use serde::Deserialize;

/// Body of `add-to-cart`; the quantity defaults to one
#[derive(Debug, Default, Deserialize)]
pub struct AddToCartRequest {
    #[serde(default)]
    pub quantity: Option<i32>,
}

impl AddToCartRequest {
    pub fn quantity(&self) -> i32 {
        self.quantity.unwrap_or(1)
    }
}

/// Body of `change-quantity`
#[derive(Debug, Deserialize)]
pub struct ChangeQuantityRequest {
    pub quantity: i32,
}
