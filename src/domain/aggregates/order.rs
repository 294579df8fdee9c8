//! Order Aggregate
//!
//! What the checkout form turns into. There is no payment backend: an order
//! goes `Pending -> Submitting -> Placed`, or straight to `Rejected` when the
//! shopper's details do not validate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};
use crate::domain::aggregates::cart::Cart;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::ProductId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CheckoutForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Submitting, Placed, Rejected }

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    customer: CheckoutForm,
    items: Vec<LineItem>,
    total_items: u64,
    total_price: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Order {
    /// Snapshots the cart's lines and totals as they are at submission.
    pub fn draft(customer: CheckoutForm, cart: &Cart) -> Self {
        let now = Utc::now();
        let items = cart.items().iter().map(|i| LineItem {
            product_id: i.product.id.clone(),
            title: i.product.title.clone(),
            quantity: i.quantity,
            unit_price: i.product.price,
            total: i.line_total().amount(),
        }).collect();
        Self {
            id: Uuid::now_v7(), customer, items,
            total_items: cart.total_items(), total_price: cart.total_price(),
            status: OrderStatus::Pending, created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn customer(&self) -> &CheckoutForm { &self.customer }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn total_items(&self) -> u64 { self.total_items }
    pub fn total_price(&self) -> Decimal { self.total_price }
    pub fn status(&self) -> &OrderStatus { &self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Validates the shopper's details. Failure is terminal.
    pub fn submit(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending { return Err(OrderError::NotSubmittable(self.status.clone())); }
        if let Err(errors) = self.customer.validate() {
            self.status = OrderStatus::Rejected;
            self.touch();
            self.raise_event(DomainEvent::Order(OrderEvent::Rejected { order_id: self.id, reason: errors.to_string() }));
            return Err(OrderError::InvalidDetails(errors));
        }
        self.status = OrderStatus::Submitting;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Submitted { order_id: self.id, total: self.total_price }));
        Ok(())
    }

    pub fn mark_placed(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Submitting { return Err(OrderError::NotSubmittable(self.status.clone())); }
        self.status = OrderStatus::Placed;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: self.id }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("invalid checkout details: {0}")]
    InvalidDetails(ValidationErrors),
    #[error("order cannot advance from {0:?}")]
    NotSubmittable(OrderStatus),
}
