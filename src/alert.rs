//! Threshold alert evaluation
//!
//! Evaluation is a pure function of the item's stored state, the freshly
//! observed price, and the clock. It produces a decision plus a state delta;
//! actually mutating the item is the store's job, so a crashed notification
//! send can never leave half-applied bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AlertConfig;
use crate::types::TrackedItem;

/// When a below-threshold observation should fire an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertPolicy {
    /// Fire on every check that observes a price at or below the threshold
    EveryCheck,
    /// Fire only when the price crosses into the threshold from above (or on
    /// the first-ever check); repeat observations below stay silent
    OnDrop,
    /// Fire at most once per cooldown window while below the threshold
    Cooldown,
}

/// What one check cycle did to an item's bookkeeping.
///
/// Timestamps are deliberately absent: the store assigns them when the delta
/// is applied, so all writers agree on ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateDelta {
    /// Price observed this cycle, becomes `last_checked_price`
    pub observed_price: f64,
    /// Whether an alert was decided for this cycle
    pub alerted: bool,
}

/// Outcome of evaluating one observation against one item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub should_alert: bool,
    pub delta: StateDelta,
}

/// Decide whether an observed price should alert, and what bookkeeping to
/// record. The check itself always counts, alert or not.
pub fn evaluate(
    item: &TrackedItem,
    observed_price: f64,
    config: &AlertConfig,
    now: DateTime<Utc>,
) -> Evaluation {
    let below_threshold = observed_price <= item.alert_price;

    let should_alert = below_threshold
        && match config.policy {
            AlertPolicy::EveryCheck => true,
            AlertPolicy::OnDrop => match item.last_checked_price {
                // Transition: previous observation was above the threshold
                Some(previous) => previous > item.alert_price,
                // First observation for this item
                None => true,
            },
            AlertPolicy::Cooldown => match item.last_alerted_at {
                Some(last) => now.signed_duration_since(last) >= config.cooldown(),
                None => true,
            },
        };

    Evaluation {
        should_alert,
        delta: StateDelta {
            observed_price,
            alerted: should_alert,
        },
    }
}
