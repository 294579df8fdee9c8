//! Simulated order placement.
//!
//! No payment backend exists: a valid submission waits out the processing
//! delay, is marked placed, and empties the cart. The checkout panel closes
//! by itself once the success message has been shown for a while.

use std::time::Duration;

use thiserror::Error;

use crate::domain::aggregates::{CheckoutForm, Order, OrderError};
use crate::store::CartStore;

#[derive(Debug, Clone)]
pub struct Checkout {
    store: CartStore,
    processing_delay: Duration,
    success_display: Duration,
}

impl Checkout {
    pub fn new(store: CartStore, processing_delay: Duration, success_display: Duration) -> Self {
        Self { store, processing_delay, success_display }
    }

    pub async fn place_order(&self, form: CheckoutForm) -> Result<Order, CheckoutError> {
        let mut order = Order::draft(form, &self.store.snapshot().cart);
        let submitted = order.submit();
        log_events(&mut order);
        submitted?;

        tokio::time::sleep(self.processing_delay).await;

        order.mark_placed()?;
        log_events(&mut order);
        self.store.clear_cart();
        tracing::info!(order_id = %order.id(), items = order.total_items(), total = %order.total_price(), "Order placed");

        let store = self.store.clone();
        let linger = self.success_display;
        tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            store.close_checkout();
        });

        Ok(order)
    }
}

fn log_events(order: &mut Order) {
    for event in order.take_events() {
        tracing::debug!(?event, "order event");
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Order(#[from] OrderError),
}
