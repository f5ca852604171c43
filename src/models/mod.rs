//! Database models

pub mod cart;
pub mod catalog;
pub mod order;

pub use cart::{Cart, CartOwner, CartProduct};
pub use catalog::{
    Category, CategoryDetail, Dimensions, NewCategory, NewProduct, Product, ProductKind,
    ProductRef, ProductRow, ProductSummary, SidebarCategory, SidebarEntry,
};
pub use order::{BuyingType, Customer, Order, OrderStatus};
