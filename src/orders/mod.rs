//! Customers, checkout and orders.

pub mod queries;
pub mod requests;
pub mod responses;
pub mod services;

pub use requests::{CheckoutForm, ValidCheckout};
pub use responses::OrderResponse;
pub use services::{checkout, customer_for_account, order_by_id, orders_for_customer, set_order_status};
