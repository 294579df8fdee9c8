//! Cart Aggregate
//!
//! Line items keyed by product id, in insertion order. Quantities are kept in
//! `1..=stock` by every transition that can raise them, but the bound is
//! advisory: a hydrated snapshot with a lower stock leaves the quantity alone
//! so the shortfall can be shown to the shopper.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::Product;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Price, ProductId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product: Product) -> Self { Self { product, quantity: 1 } }
    pub fn product_id(&self) -> &ProductId { &self.product.id }
    pub fn line_total(&self) -> Price { self.product.price().times(self.quantity) }
    /// Quantity exceeds the (possibly refreshed) stock on the snapshot.
    pub fn is_over_stock(&self) -> bool { self.quantity > self.product.stock }
    pub fn can_increase(&self) -> bool { self.quantity < self.product.stock }
}

/// Derived totals, always a fold over the items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub items: u64,
    pub price: Decimal,
}

impl Totals {
    pub fn of(items: &[CartItem]) -> Self {
        items.iter().fold(Self::default(), |acc, i| Self {
            items: acc.items + u64::from(i.quantity),
            price: acc.price + i.line_total().amount(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    totals: Totals,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from persisted items. Zero quantities are discarded
    /// and a repeated product id keeps its first entry.
    pub fn restore(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 || cart.position(item.product_id()).is_some() { continue; }
            cart.items.push(item);
        }
        cart.raise_event(CartEvent::Restored { items: cart.items.len() });
        cart.recalculate();
        cart
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> { self.items.iter().find(|i| i.product_id() == product_id) }
    pub fn totals(&self) -> Totals { self.totals }
    pub fn total_items(&self) -> u64 { self.totals.items }
    pub fn total_price(&self) -> Decimal { self.totals.price }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds one unit of `product`. An existing line is capped by the stock on
    /// its stored snapshot; at the ceiling the add is dropped.
    pub fn add_item(&mut self, product: &Product) {
        if product.stock == 0 { return; }
        match self.position(product.id()) {
            Some(idx) => {
                let item = &mut self.items[idx];
                if !item.can_increase() { return; }
                let from = item.quantity;
                item.quantity += 1;
                let to = item.quantity;
                self.raise_event(CartEvent::QuantityChanged { product_id: product.id.clone(), from, to });
            }
            None => {
                self.items.push(CartItem::new(product.clone()));
                self.raise_event(CartEvent::ItemAdded { product_id: product.id.clone() });
            }
        }
        self.recalculate();
    }

    pub fn remove_item(&mut self, product_id: &ProductId) {
        let before = self.items.len();
        self.items.retain(|i| i.product_id() != product_id);
        if self.items.len() == before { return; }
        self.raise_event(CartEvent::ItemRemoved { product_id: product_id.clone() });
        self.recalculate();
    }

    pub fn increase_quantity(&mut self, product_id: &ProductId) {
        let Some(idx) = self.position(product_id) else { return };
        let from = self.items[idx].quantity;
        if !self.items[idx].can_increase() { return; }
        self.set_quantity(idx, from + 1);
    }

    /// Never drops below one; removal goes through `remove_item`.
    pub fn decrease_quantity(&mut self, product_id: &ProductId) {
        let Some(idx) = self.position(product_id) else { return };
        let from = self.items[idx].quantity;
        self.set_quantity(idx, from.saturating_sub(1).max(1));
    }

    /// Clamps `requested` into `[1, stock]`. A snapshot with zero stock skips
    /// the upper clamp and takes `requested` as-is, so a non-positive request
    /// against zero stock removes the item.
    pub fn update_quantity(&mut self, product_id: &ProductId, requested: i64) {
        let Some(idx) = self.position(product_id) else { return };
        let stock = i64::from(self.items[idx].product.stock);
        let ceiling = if stock > 0 { stock } else { requested };
        let resolved = requested.max(1).min(ceiling);
        if resolved <= 0 {
            self.items.remove(idx);
            self.raise_event(CartEvent::ItemRemoved { product_id: product_id.clone() });
            self.recalculate();
            return;
        }
        let resolved = u32::try_from(resolved).unwrap_or(u32::MAX);
        self.set_quantity(idx, resolved);
    }

    pub fn clear(&mut self) {
        let items = self.items.len();
        if items == 0 && self.totals == Totals::default() { return; }
        self.items.clear();
        self.raise_event(CartEvent::Cleared { items });
        self.recalculate();
    }

    /// Replaces the whole item list with a reconciled view.
    pub fn hydrate(&mut self, items: Vec<CartItem>, refreshed: usize, dropped: Vec<ProductId>) {
        self.items = items;
        self.raise_event(CartEvent::Hydrated { refreshed, dropped });
        self.recalculate();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn set_quantity(&mut self, idx: usize, to: u32) {
        let item = &mut self.items[idx];
        let from = item.quantity;
        if from == to { return; }
        item.quantity = to;
        let product_id = item.product.id.clone();
        self.raise_event(CartEvent::QuantityChanged { product_id, from, to });
        self.recalculate();
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> { self.items.iter().position(|i| i.product_id() == product_id) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(DomainEvent::Cart(e)); }
    fn recalculate(&mut self) { self.totals = Totals::of(&self.items); }
}
