//! Durable storage for cart contents.
//!
//! The cart lives in one named JSON blob shaped like
//! `{"state":{"items":[...]},"version":0}`. Only the items are written; totals
//! found in older blobs are ignored and re-derived by the cart on load.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::CartItem;
use crate::{Result, StorefrontError};

pub const STORAGE_VERSION: u32 = 0;

pub trait CartRepository: Send + Sync {
    /// Items last saved, or an empty list when nothing was saved yet.
    fn load(&self) -> Result<Vec<CartItem>>;

    fn save(&self, items: &[CartItem]) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedBlob {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default)]
    items: Vec<CartItem>,
    #[serde(default, skip_serializing)]
    total_items: Option<u64>,
    #[serde(default, skip_serializing, with = "rust_decimal::serde::float_option")]
    total_price: Option<Decimal>,
}

fn encode(items: &[CartItem]) -> Result<String> {
    let blob = PersistedBlob {
        state: PersistedState { items: items.to_vec(), total_items: None, total_price: None },
        version: STORAGE_VERSION,
    };
    Ok(serde_json::to_string(&blob)?)
}

fn decode(raw: &str) -> Result<Vec<CartItem>> {
    let blob: PersistedBlob = serde_json::from_str(raw)?;
    if blob.version != STORAGE_VERSION {
        tracing::warn!(version = blob.version, expected = STORAGE_VERSION, "Persisted cart has unexpected version");
    }
    Ok(blob.state.items)
}

/// One file per storage key under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Result<Self> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorefrontError::Storage(format!("invalid storage key {key:?}")));
        }
        Ok(Self { path: dir.as_ref().join(format!("{key}.json")) })
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl CartRepository for JsonFileRepository {
    fn load(&self) -> Result<Vec<CartItem>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, items: &[CartItem]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        // Readers never see a partially written blob.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encode(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-local repository holding the encoded blob.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    blob: Mutex<Option<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self { Self::default() }

    pub fn with_raw(raw: impl Into<String>) -> Self { Self { blob: Mutex::new(Some(raw.into())) } }

    pub fn raw(&self) -> Option<String> {
        self.blob.lock().map(|b| b.clone()).unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl CartRepository for MemoryRepository {
    fn load(&self) -> Result<Vec<CartItem>> {
        match self.raw() {
            Some(raw) => decode(&raw),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, items: &[CartItem]) -> Result<()> {
        let encoded = encode(items)?;
        let mut blob = self.blob.lock().map_err(|_| StorefrontError::Storage("memory repository poisoned".into()))?;
        *blob = Some(encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::sample;

    fn items() -> Vec<CartItem> {
        vec![
            CartItem { product: sample("A", Decimal::new(1999, 2), 3), quantity: 2 },
            CartItem { product: sample("B", Decimal::new(5, 0), 1), quantity: 1 },
        ]
    }

    #[test]
    fn test_file_repository_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path(), "cart-storage-v1").unwrap();
        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_repository_persists_items_only() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("nested"), "cart-storage-v1").unwrap();
        repo.save(&items()).unwrap();

        let raw = fs::read_to_string(repo.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["items"][0]["product"]["_id"], "A");
        assert_eq!(value["state"]["items"][0]["quantity"], 2);
        assert!(value["state"].get("totalPrice").is_none());

        assert_eq!(repo.load().unwrap(), items());
    }

    #[test]
    fn test_stale_totals_are_ignored() {
        let raw = r#"{"state":{"items":[{"product":{"_id":"A","title":"A","price":2.5,"description":"","image":"","stock":4},"quantity":2}],"totalItems":99,"totalPrice":1234.5},"version":0}"#;
        let repo = MemoryRepository::with_raw(raw);
        let loaded = repo.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].quantity, 2);
    }

    #[test]
    fn test_corrupt_blob_is_an_error() {
        let repo = MemoryRepository::with_raw("{not json");
        assert!(matches!(repo.load(), Err(StorefrontError::Serialization(_))));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        assert!(JsonFileRepository::new("/tmp", "../escape").is_err());
        assert!(JsonFileRepository::new("/tmp", "").is_err());
    }

    #[test]
    fn test_memory_repository_roundtrip() {
        let repo = MemoryRepository::new();
        assert!(repo.load().unwrap().is_empty());
        repo.save(&items()).unwrap();
        assert_eq!(repo.load().unwrap(), items());
    }
}
