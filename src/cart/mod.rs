//! Shopping cart: line items, denormalized totals and the transactional
//! mutation service.

pub mod calculators;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod services;

// Re-export commonly used items
pub use calculators::{CartAction, CartContents, CartLine, CartMutation, CartTotals, PriceBook};
pub use services::{
    apply_cart_mutation, claim_anonymous_cart, get_cart_view, get_or_create_cart,
    recalculate_cart, CartItem, CartView,
};
