//! Aggregates module
pub mod product;
pub mod cart;
pub mod order;

pub use product::Product;
pub use cart::{Cart, CartItem, Totals};
pub use order::{CheckoutForm, LineItem, Order, OrderError, OrderStatus};
