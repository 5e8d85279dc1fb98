//! Core data types for price tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when a tracked item is created with bad input
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("product URL is not a valid http(s) URL: {0}")]
    InvalidUrl(String),
    #[error("alert price must be positive, got {0}")]
    NonPositivePrice(f64),
    #[error("at least one contact channel (telegram or email) is required")]
    NoContactChannel,
}

/// Delivery targets for a tracked item's alerts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactChannels {
    /// Telegram chat id for the Bot API
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    /// Email address for SMTP delivery
    #[serde(default)]
    pub email: Option<String>,
}

impl ContactChannels {
    /// True if no channel is configured
    pub fn is_empty(&self) -> bool {
        self.telegram_chat_id.is_none() && self.email.is_none()
    }
}

/// A user's standing request to monitor one product URL against one target price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedItem {
    /// Opaque identity
    pub id: String,
    /// Product page URL
    pub product_url: String,
    /// Alert threshold; alerts fire when the observed price is <= this
    pub alert_price: f64,
    /// Where alerts go
    pub channels: ContactChannels,
    /// Inactive items are skipped by the checker
    pub active: bool,
    /// Price seen on the most recent successful check
    #[serde(default)]
    pub last_checked_price: Option<f64>,
    /// When the item was last successfully checked
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Total successful checks; never decreases
    #[serde(default)]
    pub check_count: u64,
    /// Total alerts dispatched; never decreases, always <= check_count
    #[serde(default)]
    pub alerts_sent: u64,
    /// When an alert last fired for this item
    #[serde(default)]
    pub last_alerted_at: Option<DateTime<Utc>>,
    /// When the item was created
    pub created_at: DateTime<Utc>,
}

impl TrackedItem {
    /// Create a new tracked item, validating setup-time input.
    ///
    /// Counters start at zero and the item starts active. The check/alert
    /// fields are only ever touched by the store when a check cycle applies
    /// its state delta.
    pub fn new(
        product_url: &str,
        alert_price: f64,
        channels: ContactChannels,
    ) -> Result<Self, ValidationError> {
        let parsed = url::Url::parse(product_url)
            .map_err(|_| ValidationError::InvalidUrl(product_url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ValidationError::InvalidUrl(product_url.to_string()));
        }
        if !(alert_price > 0.0) {
            return Err(ValidationError::NonPositivePrice(alert_price));
        }
        if channels.is_empty() {
            return Err(ValidationError::NoContactChannel);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            product_url: product_url.to_string(),
            alert_price,
            channels,
            active: true,
            last_checked_price: None,
            last_checked_at: None,
            check_count: 0,
            alerts_sent: 0,
            last_alerted_at: None,
            created_at: Utc::now(),
        })
    }

    /// An item read back from storage may predate validation or have been
    /// hand-edited; the checker skips anything that no longer has the
    /// required fields rather than crashing the batch.
    pub fn is_checkable(&self) -> bool {
        !self.product_url.is_empty() && self.alert_price > 0.0 && !self.channels.is_empty()
    }
}

/// One historical price observation for a tracked item.
///
/// Created exactly once per successful acquisition per check cycle; never
/// mutated or deleted by the checker. `observed_at` is assigned by the store
/// at append time so ordering stays consistent across writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub product_id: String,
    pub product_url: String,
    pub price: f64,
    pub currency: String,
    pub observed_at: DateTime<Utc>,
}

/// Result of one successful price acquisition; transient, produced fresh
/// each cycle and never persisted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    /// Canonical numeric price
    pub price: f64,
    /// Product title, truncated by the extractor
    pub title: Option<String>,
    /// Whether the headless-render fallback produced the content
    pub rendered: bool,
}
