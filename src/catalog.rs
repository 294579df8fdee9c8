//! Read-only client for the remote product catalog.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::ProductId;

/// Source of authoritative product records.
///
/// The `try_*` methods report failures so hydration can tell a failed fetch
/// from an empty catalog. Page renderers use the provided methods, which never
/// fail: errors are logged and come back as an empty list or `None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn try_fetch_all(&self) -> Result<Vec<Product>, CatalogError>;

    async fn try_fetch_by_id(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;

    async fn fetch_all_products(&self) -> Vec<Product> {
        match self.try_fetch_all().await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch products");
                Vec::new()
            }
        }
    }

    async fn fetch_product_by_id(&self, id: &ProductId) -> Option<Product> {
        match self.try_fetch_by_id(id).await {
            Ok(product) => product,
            Err(e) => {
                tracing::error!(product_id = %id, error = %e, "Failed to fetch product");
                None
            }
        }
    }
}

/// HTTP catalog speaking the `{"data": {...}}` envelope.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: Url,
    http: Client,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/')).map_err(|e| CatalogError::InvalidBaseUrl(format!("{raw}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl(raw));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str { self.base_url.as_str() }

    /// Each segment is percent-encoded, so an id is always a single path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn try_fetch_all(&self) -> Result<Vec<Product>, CatalogError> {
        let url = self.url(&["products"]);
        let response = self.http.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(CatalogError::UnexpectedStatus { url: url.to_string(), status: response.status() });
        }

        let body: Envelope<ProductList> = response.json().await?;
        Ok(body.data.and_then(|d| d.products).unwrap_or_default())
    }

    async fn try_fetch_by_id(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        // Dot segments cannot name a product; the URL parser would collapse them.
        if matches!(id.as_str(), "" | "." | "..") {
            return Ok(None);
        }
        let url = self.url(&["products", id.as_str()]);
        let response = self.http.get(url.clone()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CatalogError::UnexpectedStatus { url: url.to_string(), status: response.status() });
        }

        let body: Envelope<SingleProduct> = response.json().await?;
        Ok(body.data.and_then(|d| d.product))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ProductList {
    products: Option<Vec<Product>>,
}

#[derive(Debug, Deserialize)]
struct SingleProduct {
    product: Option<Product>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid catalog base url: {0}")]
    InvalidBaseUrl(String),

    #[error("catalog returned {status} for {url}")]
    UnexpectedStatus { url: String, status: StatusCode },
}
