//! Cart store: the single owner of cart and panel state.
//!
//! A `CartStore` is a cheap handle; clones share state. Every transition runs
//! to completion under the channel's write lock, so two synchronous mutations
//! never interleave. The only suspension point is the catalog fetch inside
//! [`CartStore::hydrate_products`]: mutations made while that fetch is in
//! flight are overwritten when it resolves, because hydration replaces the
//! item list with its reconciled view of the pre-fetch items.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::catalog::Catalog;
use crate::domain::aggregates::{Cart, CartItem, Product};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::ProductId;
use crate::hydration;
use crate::persistence::CartRepository;

/// Everything observers see. Panel flags and `is_hydrating` are never persisted.
#[derive(Clone, Debug, Default)]
pub struct CartState {
    pub cart: Cart,
    pub is_cart_open: bool,
    pub is_checkout_open: bool,
    pub is_hydrating: bool,
}

impl CartState {
    pub fn items(&self) -> &[CartItem] { self.cart.items() }
    pub fn total_items(&self) -> u64 { self.cart.total_items() }
    pub fn total_price(&self) -> Decimal { self.cart.total_price() }
}

#[derive(Clone)]
pub struct CartStore {
    state: Arc<watch::Sender<CartState>>,
    repository: Arc<dyn CartRepository>,
    catalog: Arc<dyn Catalog>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore").field("state", &*self.state.borrow()).finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restores the cart from `repository`. An unreadable blob starts an
    /// empty cart rather than failing startup.
    pub fn open(repository: Arc<dyn CartRepository>, catalog: Arc<dyn Catalog>) -> Self {
        let items = repository.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable persisted cart");
            Vec::new()
        });
        let mut cart = Cart::restore(items);
        log_events(cart.take_events());
        let (state, _) = watch::channel(CartState { cart, ..CartState::default() });
        Self { state: Arc::new(state), repository, catalog }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> { &self.catalog }

    pub fn snapshot(&self) -> CartState { self.state.borrow().clone() }

    /// Observers are woken only by transitions that changed something.
    pub fn subscribe(&self) -> watch::Receiver<CartState> { self.state.subscribe() }

    pub fn add_item(&self, product: &Product) { self.mutate_cart(|cart| cart.add_item(product)); }

    pub fn remove_item(&self, product_id: &ProductId) { self.mutate_cart(|cart| cart.remove_item(product_id)); }

    pub fn increase_quantity(&self, product_id: &ProductId) { self.mutate_cart(|cart| cart.increase_quantity(product_id)); }

    pub fn decrease_quantity(&self, product_id: &ProductId) { self.mutate_cart(|cart| cart.decrease_quantity(product_id)); }

    pub fn update_quantity(&self, product_id: &ProductId, quantity: i64) {
        self.mutate_cart(|cart| cart.update_quantity(product_id, quantity));
    }

    pub fn clear_cart(&self) { self.mutate_cart(Cart::clear); }

    pub fn toggle_cart(&self) { self.state.send_modify(|s| s.is_cart_open = !s.is_cart_open); }

    pub fn open_cart(&self) { self.set_flag(|s| &mut s.is_cart_open, true); }

    pub fn close_cart(&self) { self.set_flag(|s| &mut s.is_cart_open, false); }

    pub fn open_checkout(&self) { self.set_flag(|s| &mut s.is_checkout_open, true); }

    pub fn close_checkout(&self) { self.set_flag(|s| &mut s.is_checkout_open, false); }

    /// Refreshes every item against the catalog and drops vanished products.
    /// An empty cart makes no request. A failed fetch leaves the cart as it was.
    pub async fn hydrate_products(&self) {
        let items = {
            let state = self.state.borrow();
            if state.cart.is_empty() {
                tracing::debug!("Cart empty, skipping hydration");
                return;
            }
            state.cart.items().to_vec()
        };
        self.state.send_modify(|s| s.is_hydrating = true);

        match self.catalog.try_fetch_all().await {
            Ok(products) => {
                let outcome = hydration::reconcile(&items, &products);
                tracing::info!(kept = outcome.items.len(), refreshed = outcome.refreshed, dropped = outcome.dropped.len(), "Cart hydrated");
                let mut events = Vec::new();
                self.state.send_modify(|s| {
                    s.cart.hydrate(outcome.items, outcome.refreshed, outcome.dropped);
                    s.is_hydrating = false;
                    events = s.cart.take_events();
                });
                self.persist(events);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Hydration fetch failed, keeping cached cart");
                self.state.send_modify(|s| s.is_hydrating = false);
            }
        }
    }

    fn mutate_cart(&self, f: impl FnOnce(&mut Cart)) {
        let mut events = Vec::new();
        self.state.send_if_modified(|s| {
            f(&mut s.cart);
            events = s.cart.take_events();
            !events.is_empty()
        });
        self.persist(events);
    }

    fn set_flag(&self, flag: impl Fn(&mut CartState) -> &mut bool, value: bool) {
        self.state.send_if_modified(|s| {
            let slot = flag(s);
            let changed = *slot != value;
            *slot = value;
            changed
        });
    }

    fn persist(&self, events: Vec<DomainEvent>) {
        if events.is_empty() { return; }
        log_events(events);
        let items = self.state.borrow().cart.items().to_vec();
        if let Err(e) = self.repository.save(&items) {
            tracing::warn!(error = %e, "Failed to persist cart");
        }
    }
}

fn log_events(events: Vec<DomainEvent>) {
    for event in events {
        tracing::debug!(?event, "cart event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, MockCatalog};
    use crate::domain::aggregates::product::sample;
    use crate::persistence::MemoryRepository;
    use crate::StorefrontError;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use tokio::sync::{oneshot, Mutex};

    fn id(s: &str) -> ProductId { ProductId::new(s) }

    fn store_with(repo: Arc<MemoryRepository>, catalog: MockCatalog) -> CartStore {
        CartStore::open(repo, Arc::new(catalog))
    }

    fn seeded(items: &[(Product, u32)]) -> Arc<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::new());
        let items: Vec<_> = items.iter().map(|(p, q)| CartItem { product: p.clone(), quantity: *q }).collect();
        repo.save(&items).unwrap();
        repo
    }

    #[test]
    fn add_item_scenario_and_persistence() {
        let repo = Arc::new(MemoryRepository::new());
        let store = store_with(repo.clone(), MockCatalog::new());
        let a = sample("A", Decimal::new(10, 0), 3);
        for _ in 0..4 { store.add_item(&a); }

        let state = store.snapshot();
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].quantity, 3);
        assert_eq!(state.total_items(), 3);
        assert_eq!(state.total_price(), Decimal::new(30, 0));
        assert_eq!(repo.load().unwrap()[0].quantity, 3);
    }

    #[test]
    fn restores_and_rederives_totals() {
        let repo = seeded(&[(sample("A", Decimal::new(250, 2), 5), 2), (sample("B", Decimal::ONE, 5), 1)]);
        let store = store_with(repo, MockCatalog::new());
        let state = store.snapshot();
        assert_eq!(state.total_items(), 3);
        assert_eq!(state.total_price(), Decimal::new(6, 0));
        assert!(!state.is_cart_open && !state.is_checkout_open && !state.is_hydrating);
    }

    #[test]
    fn unreadable_blob_starts_empty() {
        let store = store_with(Arc::new(MemoryRepository::with_raw("[]")), MockCatalog::new());
        assert!(store.snapshot().cart.is_empty());
    }

    #[test]
    fn update_quantity_clamps_to_stock() {
        let store = store_with(Arc::new(MemoryRepository::new()), MockCatalog::new());
        store.add_item(&sample("A", Decimal::ONE, 4));
        store.update_quantity(&id("A"), 10);
        assert_eq!(store.snapshot().items()[0].quantity, 4);
    }

    #[test]
    fn clear_cart_keeps_panel_flags() {
        let store = store_with(Arc::new(MemoryRepository::new()), MockCatalog::new());
        store.add_item(&sample("A", Decimal::ONE, 4));
        store.open_cart();
        store.open_checkout();
        store.clear_cart();
        let state = store.snapshot();
        assert!(state.cart.is_empty());
        assert_eq!(state.total_items(), 0);
        assert_eq!(state.total_price(), Decimal::ZERO);
        assert!(state.is_cart_open && state.is_checkout_open);
    }

    #[test]
    fn panel_flags_are_independent() {
        let store = store_with(Arc::new(MemoryRepository::new()), MockCatalog::new());
        store.toggle_cart();
        assert!(store.snapshot().is_cart_open);
        store.toggle_cart();
        assert!(!store.snapshot().is_cart_open);
        store.open_checkout();
        let state = store.snapshot();
        assert!(state.is_checkout_open && !state.is_cart_open && state.cart.is_empty());
        store.close_checkout();
        assert!(!store.snapshot().is_checkout_open);
    }

    #[tokio::test]
    async fn subscribers_see_only_real_changes() {
        let store = store_with(Arc::new(MemoryRepository::new()), MockCatalog::new());
        let mut rx = store.subscribe();
        store.remove_item(&id("missing"));
        store.close_cart();
        assert!(!rx.has_changed().unwrap());
        store.add_item(&sample("A", Decimal::ONE, 1));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total_items(), 1);
    }

    #[tokio::test]
    async fn hydrate_on_empty_cart_makes_no_request() {
        let mut catalog = MockCatalog::new();
        catalog.expect_try_fetch_all().times(0);
        let store = store_with(Arc::new(MemoryRepository::new()), catalog);
        store.hydrate_products().await;
        assert!(!store.snapshot().is_hydrating);
    }

    #[tokio::test]
    async fn hydrate_refreshes_without_clamping() {
        let repo = seeded(&[(sample("P", Decimal::new(5, 0), 2), 2)]);
        let mut catalog = MockCatalog::new();
        catalog.expect_try_fetch_all().times(1).returning(|| Ok(vec![sample("P", Decimal::new(7, 0), 1)]));
        let store = store_with(repo.clone(), catalog);

        store.hydrate_products().await;

        let state = store.snapshot();
        assert_eq!(state.items()[0].quantity, 2);
        assert_eq!(state.items()[0].product.stock, 1);
        assert!(state.items()[0].is_over_stock());
        assert_eq!(state.total_price(), Decimal::new(14, 0));
        assert!(!state.is_hydrating);
        assert_eq!(repo.load().unwrap()[0].product.stock, 1);
    }

    #[tokio::test]
    async fn hydrate_drops_discontinued_products() {
        let repo = seeded(&[(sample("A", Decimal::new(3, 0), 5), 1), (sample("GONE", Decimal::new(100, 0), 5), 2)]);
        let mut catalog = MockCatalog::new();
        catalog.expect_try_fetch_all().returning(|| Ok(vec![sample("A", Decimal::new(3, 0), 5)]));
        let store = store_with(repo, catalog);

        store.hydrate_products().await;

        let state = store.snapshot();
        assert_eq!(state.items().len(), 1);
        assert!(state.cart.item(&id("GONE")).is_none());
        assert_eq!(state.total_items(), 1);
        assert_eq!(state.total_price(), Decimal::new(3, 0));
    }

    #[tokio::test]
    async fn hydrate_failure_leaves_cart_untouched() {
        let repo = seeded(&[(sample("A", Decimal::new(3, 0), 5), 2)]);
        let mut catalog = MockCatalog::new();
        catalog.expect_try_fetch_all().returning(|| {
            Err(CatalogError::UnexpectedStatus { url: "http://catalog/products".into(), status: StatusCode::SERVICE_UNAVAILABLE })
        });
        let store = store_with(repo, catalog);
        let before = store.snapshot();

        store.hydrate_products().await;

        let after = store.snapshot();
        assert_eq!(after.items(), before.items());
        assert_eq!(after.total_price(), Decimal::new(6, 0));
        assert!(!after.is_hydrating);
    }

    /// Holds the listing until the test releases it.
    struct GatedCatalog {
        gate: Mutex<Option<oneshot::Receiver<Vec<Product>>>>,
    }

    #[async_trait]
    impl Catalog for GatedCatalog {
        async fn try_fetch_all(&self) -> Result<Vec<Product>, CatalogError> {
            let rx = self.gate.lock().await.take();
            Ok(match rx {
                Some(rx) => rx.await.unwrap_or_default(),
                None => Vec::new(),
            })
        }

        async fn try_fetch_by_id(&self, _id: &ProductId) -> Result<Option<Product>, CatalogError> { Ok(None) }
    }

    #[tokio::test]
    async fn mutations_during_hydration_are_overwritten() {
        let a = sample("A", Decimal::ONE, 5);
        let b = sample("B", Decimal::ONE, 5);
        let repo = seeded(&[(a.clone(), 1)]);
        let (tx, rx) = oneshot::channel();
        let store = CartStore::open(repo, Arc::new(GatedCatalog { gate: Mutex::new(Some(rx)) }));

        let hydrating = tokio::spawn({
            let store = store.clone();
            async move { store.hydrate_products().await }
        });
        let mut watcher = store.subscribe();
        watcher.wait_for(|s| s.is_hydrating).await.unwrap();

        store.add_item(&b);
        store.increase_quantity(&id("A"));
        assert_eq!(store.snapshot().total_items(), 3);

        tx.send(vec![a.clone(), b.clone()]).unwrap();
        hydrating.await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].quantity, 1);
        assert!(state.cart.item(&id("B")).is_none());
    }

    struct FailingRepository;

    impl CartRepository for FailingRepository {
        fn load(&self) -> crate::Result<Vec<CartItem>> { Ok(Vec::new()) }
        fn save(&self, _items: &[CartItem]) -> crate::Result<()> { Err(StorefrontError::Storage("disk full".into())) }
    }

    #[test]
    fn save_failures_do_not_block_mutations() {
        let store = CartStore::open(Arc::new(FailingRepository), Arc::new(MockCatalog::new()));
        store.add_item(&sample("A", Decimal::ONE, 2));
        assert_eq!(store.snapshot().total_items(), 1);
    }
}
