//! Re-synchronising a restored cart against the live catalog.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::aggregates::{CartItem, Product};
use crate::domain::value_objects::ProductId;
use crate::store::CartStore;

/// Outcome of matching cart items against a catalog listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciliation {
    pub items: Vec<CartItem>,
    pub refreshed: usize,
    pub dropped: Vec<ProductId>,
}

/// Swaps each item's snapshot for the catalog's current record and drops
/// items whose product is gone. Quantities are carried over untouched, even
/// when they now exceed the refreshed stock.
pub fn reconcile(items: &[CartItem], catalog: &[Product]) -> Reconciliation {
    let by_id: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();
    let mut out = Reconciliation { items: Vec::with_capacity(items.len()), refreshed: 0, dropped: Vec::new() };

    for item in items {
        match by_id.get(item.product_id()) {
            Some(fresh) => {
                if **fresh != item.product { out.refreshed += 1; }
                out.items.push(CartItem { product: (*fresh).clone(), quantity: item.quantity });
            }
            None => out.dropped.push(item.product_id().clone()),
        }
    }
    out
}

/// Pending delayed hydration. Dropping it before the delay elapses cancels
/// the run; once hydration has started it runs to completion.
#[derive(Debug)]
pub struct HydrationTrigger {
    handle: Option<JoinHandle<()>>,
}

impl HydrationTrigger {
    pub fn schedule(store: CartStore, delay: Duration) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Once started, hydration outlives the trigger.
            if let Err(e) = tokio::spawn(async move { store.hydrate_products().await }).await {
                if !e.is_cancelled() { tracing::warn!(error = %e, "Hydration task failed"); }
            }
        });
        Self { handle: Some(handle) }
    }

    /// Waits for the scheduled hydration to finish.
    pub async fn completed(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() { tracing::warn!(error = %e, "Hydration task failed"); }
            }
        }
    }
}

impl Drop for HydrationTrigger {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() { handle.abort(); }
    }
}
