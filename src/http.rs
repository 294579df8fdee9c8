//! JSON surface for the storefront UI: catalog pages, cart controls, checkout.

use axum::{extract::{Path, State}, http::StatusCode, routing::{delete, get, post}, Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkout::{Checkout, CheckoutError};
use crate::domain::aggregates::{CartItem, CheckoutForm, LineItem, Order, OrderError, OrderStatus, Product};
use crate::domain::value_objects::{Price, ProductId};
use crate::store::{CartState, CartStore};

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: CartStore,
    pub checkout: Checkout,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-cart"})) }))
        .route("/api/products", get(list_products))
        .route("/api/products/:id", get(get_product))
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_to_cart))
        .route("/api/cart/items/:id", delete(remove_item).put(update_quantity))
        .route("/api/cart/items/:id/increase", post(increase_quantity))
        .route("/api/cart/items/:id/decrease", post(decrease_quantity))
        .route("/api/cart/toggle", post(toggle_cart))
        .route("/api/cart/open", post(open_cart))
        .route("/api/cart/close", post(close_cart))
        .route("/api/checkout", post(place_order))
        .route("/api/checkout/open", post(open_checkout))
        .route("/api/checkout/close", post(close_checkout))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product: Product,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
    pub over_stock: bool,
    pub can_increase: bool,
    pub stock_warning: Option<String>,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            product: item.product.clone(),
            quantity: item.quantity,
            line_total: item.line_total().amount(),
            over_stock: item.is_over_stock(),
            can_increase: item.can_increase(),
            stock_warning: item.is_over_stock().then(|| format!("Only {} available", item.product.stock)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_items: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub subtotal: String,
    pub is_cart_open: bool,
    pub is_checkout_open: bool,
    pub is_hydrating: bool,
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self {
            items: state.items().iter().map(CartLineView::from).collect(),
            total_items: state.total_items(),
            total_price: state.total_price(),
            subtotal: Price::new(state.total_price()).to_string(),
            is_cart_open: state.is_cart_open,
            is_checkout_open: state.is_checkout_open,
            is_hydrating: state.is_hydrating,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub status: OrderStatus,
    pub customer: CheckoutForm,
    pub items: Vec<LineItem>,
    pub total_items: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            status: order.status().clone(),
            customer: order.customer().clone(),
            items: order.items().to_vec(),
            total_items: order.total_items(),
            total_price: order.total_price(),
            created_at: order.created_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest { pub product_id: ProductId }

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest { pub quantity: i64 }

fn cart_view(store: &CartStore) -> Json<CartView> { Json(CartView::from(&store.snapshot())) }

async fn list_products(State(s): State<AppState>) -> Json<Vec<Product>> {
    Json(s.store.catalog().fetch_all_products().await)
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Product> {
    s.store.catalog().fetch_product_by_id(&ProductId::new(id)).await.map(Json).ok_or((StatusCode::NOT_FOUND, "Not found".to_string()))
}

async fn get_cart(State(s): State<AppState>) -> Json<CartView> { cart_view(&s.store) }

async fn add_to_cart(State(s): State<AppState>, Json(r): Json<AddToCartRequest>) -> ApiResult<CartView> {
    let product = s.store.catalog().fetch_product_by_id(&r.product_id).await.ok_or((StatusCode::NOT_FOUND, "Not found".to_string()))?;
    s.store.add_item(&product);
    Ok(cart_view(&s.store))
}

async fn remove_item(State(s): State<AppState>, Path(id): Path<String>) -> Json<CartView> {
    s.store.remove_item(&ProductId::new(id));
    cart_view(&s.store)
}

async fn update_quantity(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<UpdateQuantityRequest>) -> Json<CartView> {
    s.store.update_quantity(&ProductId::new(id), r.quantity);
    cart_view(&s.store)
}

async fn increase_quantity(State(s): State<AppState>, Path(id): Path<String>) -> Json<CartView> {
    s.store.increase_quantity(&ProductId::new(id));
    cart_view(&s.store)
}

async fn decrease_quantity(State(s): State<AppState>, Path(id): Path<String>) -> Json<CartView> {
    s.store.decrease_quantity(&ProductId::new(id));
    cart_view(&s.store)
}

async fn clear_cart(State(s): State<AppState>) -> Json<CartView> {
    s.store.clear_cart();
    cart_view(&s.store)
}

async fn toggle_cart(State(s): State<AppState>) -> Json<CartView> { s.store.toggle_cart(); cart_view(&s.store) }
async fn open_cart(State(s): State<AppState>) -> Json<CartView> { s.store.open_cart(); cart_view(&s.store) }
async fn close_cart(State(s): State<AppState>) -> Json<CartView> { s.store.close_cart(); cart_view(&s.store) }
async fn open_checkout(State(s): State<AppState>) -> Json<CartView> { s.store.open_checkout(); cart_view(&s.store) }
async fn close_checkout(State(s): State<AppState>) -> Json<CartView> { s.store.close_checkout(); cart_view(&s.store) }

async fn place_order(State(s): State<AppState>, Json(form): Json<CheckoutForm>) -> ApiResult<OrderView> {
    match s.checkout.place_order(form).await {
        Ok(order) => Ok(Json(OrderView::from(&order))),
        Err(CheckoutError::Order(e @ OrderError::InvalidDetails(_))) => Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
        Err(e) => Err((StatusCode::CONFLICT, e.to_string())),
    }
}
