//! Domain events
use crate::domain::value_objects::ProductId;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemAdded { product_id: ProductId },
    ItemRemoved { product_id: ProductId },
    QuantityChanged { product_id: ProductId, from: u32, to: u32 },
    Cleared { items: usize },
    Restored { items: usize },
    Hydrated { refreshed: usize, dropped: Vec<ProductId> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderEvent {
    Submitted { order_id: Uuid, total: Decimal },
    Placed { order_id: Uuid },
    Rejected { order_id: Uuid, reason: String },
}
