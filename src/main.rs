//! Storefront Cart - shopper-side cart service

use std::sync::Arc;

use anyhow::Result;
use storefront_cart::{http::{self, AppState}, hydration::HydrationTrigger, Checkout, CartStore, HttpCatalog, JsonFileRepository, StorefrontConfig};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = StorefrontConfig::from_env()?;
    let catalog = HttpCatalog::new(&config.api_base_url, config.request_timeout)?;
    let repository = JsonFileRepository::new(&config.storage_dir, &config.storage_key)?;
    tracing::info!(catalog = %catalog.base_url(), storage = %repository.path().display(), "Opening cart");

    let store = CartStore::open(Arc::new(repository), Arc::new(catalog));
    let checkout = Checkout::new(store.clone(), config.checkout_processing_delay, config.checkout_success_display);
    let _hydration = HydrationTrigger::schedule(store.clone(), config.hydration_delay);

    let app = http::router(AppState { store, checkout })
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🛒 Storefront cart listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
