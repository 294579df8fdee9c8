//! Storefront Cart
//!
//! Shopper-side state for a small storefront: a cart whose quantities are
//! bounded by catalog stock, derived totals, durable persistence, and
//! re-synchronisation of a restored cart against the live catalog.
//!
//! ## Features
//! - Stock-bounded cart transitions with derived totals
//! - JSON blob persistence under a fixed storage key
//! - Catalog hydration of restored carts
//! - Simulated checkout with validated shopper details
//! - JSON surface for the storefront UI

use thiserror::Error;

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod http;
pub mod hydration;
pub mod persistence;
pub mod store;

pub use catalog::{Catalog, CatalogError, HttpCatalog};
pub use checkout::{Checkout, CheckoutError};
pub use config::StorefrontConfig;
pub use domain::aggregates::{Cart, CartItem, CheckoutForm, Order, OrderStatus, Product, Totals};
pub use domain::value_objects::ProductId;
pub use persistence::{CartRepository, JsonFileRepository, MemoryRepository};
pub use store::{CartState, CartStore};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
