//! Item and price-history persistence
//!
//! The store owns every timestamp: callers hand it a state delta or a price
//! observation and the store stamps it at apply time, so ordering is
//! consistent no matter who writes. `apply_check` is a single
//! read-modify-write under the write lock, which keeps the counters coherent
//! even if a future driver checks items concurrently.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::alert::StateDelta;
use crate::types::{PricePoint, TrackedItem};

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("no tracked item with id {0}")]
    NotFound(String),
}

/// Persistence interface for tracked items and their price history
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Persist a new tracked item
    async fn add_item(&self, item: TrackedItem) -> Result<TrackedItem, StorageError>;
    /// Fetch one item by id
    async fn get_item(&self, id: &str) -> Result<TrackedItem, StorageError>;
    /// All items, active or not
    async fn list_items(&self) -> Result<Vec<TrackedItem>, StorageError>;
    /// Delete an item; its price history is kept
    async fn remove_item(&self, id: &str) -> Result<(), StorageError>;
    /// Items eligible for checking
    async fn active_items(&self) -> Result<Vec<TrackedItem>, StorageError>;
    /// Items whose alert email matches. Lookup hook for the account-facing
    /// setup surface; the batch driver never calls it.
    async fn find_contact(&self, email: &str) -> Result<Vec<TrackedItem>, StorageError>;
    /// Record one price observation; the store assigns `observed_at`
    async fn append_price_point(
        &self,
        item: &TrackedItem,
        price: f64,
        currency: &str,
    ) -> Result<PricePoint, StorageError>;
    /// Price observations for one item, oldest first
    async fn price_history(&self, product_id: &str) -> Result<Vec<PricePoint>, StorageError>;
    /// Apply one check cycle's bookkeeping atomically; the store assigns
    /// `last_checked_at` (and `last_alerted_at` when the delta alerted)
    async fn apply_check(&self, id: &str, delta: StateDelta) -> Result<TrackedItem, StorageError>;
}

#[derive(Default)]
struct State {
    items: Vec<TrackedItem>,
    history: Vec<PricePoint>,
}

/// JSON-file-backed store.
///
/// Items live in `items.json` and observations in `price_history.json` under
/// the data directory; both files are rewritten whole on every mutation,
/// which is fine at the scale of a personal tracker. `in_memory()` skips the
/// files entirely for tests.
pub struct JsonStore {
    dir: Option<PathBuf>,
    state: RwLock<State>,
}

impl JsonStore {
    const ITEMS_FILE: &'static str = "items.json";
    const HISTORY_FILE: &'static str = "price_history.json";

    /// Open (or create) a store under `dir`
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;
        let items = Self::load_file(&dir.join(Self::ITEMS_FILE))?;
        let history = Self::load_file(&dir.join(Self::HISTORY_FILE))?;
        tracing::debug!(
            dir = %dir.display(),
            items = items.len(),
            observations = history.len(),
            "opened store"
        );
        Ok(Self {
            dir: Some(dir.to_path_buf()),
            state: RwLock::new(State { items, history }),
        })
    }

    /// Store with no backing files, for tests
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            state: RwLock::new(State::default()),
        }
    }

    fn load_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn persist(&self, state: &State) -> Result<(), StorageError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let items = serde_json::to_string_pretty(&state.items)?;
        std::fs::write(dir.join(Self::ITEMS_FILE), items)?;
        let history = serde_json::to_string_pretty(&state.history)?;
        std::fs::write(dir.join(Self::HISTORY_FILE), history)?;
        Ok(())
    }
}

#[async_trait]
impl PriceStore for JsonStore {
    async fn add_item(&self, item: TrackedItem) -> Result<TrackedItem, StorageError> {
        let mut state = self.state.write().await;
        state.items.push(item.clone());
        self.persist(&state)?;
        Ok(item)
    }

    async fn get_item(&self, id: &str) -> Result<TrackedItem, StorageError> {
        let state = self.state.read().await;
        state
            .items
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn list_items(&self) -> Result<Vec<TrackedItem>, StorageError> {
        Ok(self.state.read().await.items.clone())
    }

    async fn remove_item(&self, id: &str) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let before = state.items.len();
        state.items.retain(|i| i.id != id);
        if state.items.len() == before {
            return Err(StorageError::NotFound(id.to_string()));
        }
        self.persist(&state)?;
        Ok(())
    }

    async fn active_items(&self) -> Result<Vec<TrackedItem>, StorageError> {
        let state = self.state.read().await;
        Ok(state.items.iter().filter(|i| i.active).cloned().collect())
    }

    async fn find_contact(&self, email: &str) -> Result<Vec<TrackedItem>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .filter(|i| i.channels.email.as_deref() == Some(email))
            .cloned()
            .collect())
    }

    async fn append_price_point(
        &self,
        item: &TrackedItem,
        price: f64,
        currency: &str,
    ) -> Result<PricePoint, StorageError> {
        let point = PricePoint {
            product_id: item.id.clone(),
            product_url: item.product_url.clone(),
            price,
            currency: currency.to_string(),
            observed_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.history.push(point.clone());
        self.persist(&state)?;
        Ok(point)
    }

    async fn price_history(&self, product_id: &str) -> Result<Vec<PricePoint>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .filter(|p| p.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn apply_check(&self, id: &str, delta: StateDelta) -> Result<TrackedItem, StorageError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        item.check_count += 1;
        item.last_checked_price = Some(delta.observed_price);
        item.last_checked_at = Some(now);
        if delta.alerted {
            item.alerts_sent += 1;
            item.last_alerted_at = Some(now);
        }
        let updated = item.clone();
        self.persist(&state)?;
        Ok(updated)
    }
}
