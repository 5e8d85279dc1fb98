//! Batch check driver
//!
//! Walks every active item: acquire the current price, record the
//! observation, evaluate the threshold, apply the bookkeeping, dispatch
//! alerts. One item's failure never aborts the batch, and a polite delay
//! separates consecutive items so target sites see a slow, boring client.

use std::sync::Arc;

use chrono::Utc;

use crate::alert;
use crate::config::{AlertConfig, CheckerConfig};
use crate::notify::{AlertMessage, Notifier, NotifyError};
use crate::scraping::Acquire;
use crate::storage::PriceStore;
use crate::types::TrackedItem;

/// Aggregate outcome of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Items with a successful acquisition this batch
    pub checked: u64,
    /// Items for which an alert was decided
    pub alerted: u64,
    /// Items whose acquisition failed
    pub failed: u64,
    /// Items skipped for missing required fields
    pub skipped: u64,
}

/// Drives check cycles over the store
pub struct Checker {
    store: Arc<dyn PriceStore>,
    acquirer: Arc<dyn Acquire>,
    notifier: Arc<dyn Notifier>,
    alerts: AlertConfig,
    config: CheckerConfig,
    currency: String,
}

impl Checker {
    pub fn new(
        store: Arc<dyn PriceStore>,
        acquirer: Arc<dyn Acquire>,
        notifier: Arc<dyn Notifier>,
        alerts: AlertConfig,
        config: CheckerConfig,
        currency: String,
    ) -> Self {
        Self {
            store,
            acquirer,
            notifier,
            alerts,
            config,
            currency,
        }
    }

    /// Check every active item once
    pub async fn run_batch(&self) -> anyhow::Result<BatchStats> {
        let items = self.store.active_items().await?;
        tracing::info!(items = items.len(), "starting check batch");

        let mut stats = BatchStats::default();
        for item in &items {
            if !item.is_checkable() {
                tracing::warn!(id = %item.id, "skipping item with missing required fields");
                stats.skipped += 1;
                continue;
            }

            match self.check_item(item).await {
                Ok(alerted) => {
                    stats.checked += 1;
                    if alerted {
                        stats.alerted += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(id = %item.id, url = %item.product_url, error = %e, "check failed");
                    stats.failed += 1;
                }
            }

            tokio::time::sleep(self.config.item_delay()).await;
        }

        tracing::info!(
            "Checked: {}, Alerts: {} (failed: {}, skipped: {})",
            stats.checked,
            stats.alerted,
            stats.failed,
            stats.skipped
        );
        Ok(stats)
    }

    /// Run batches forever at the configured interval
    pub async fn run_watch(&self) -> anyhow::Result<()> {
        let interval = self.config.watch_interval();
        loop {
            if let Err(e) = self.run_batch().await {
                tracing::error!(error = %e, "batch failed");
            }
            tracing::info!(next_in_secs = interval.as_secs(), "batch complete, sleeping");
            tokio::time::sleep(interval).await;
        }
    }

    /// One item's full cycle; returns whether an alert was decided.
    ///
    /// Bookkeeping is applied before delivery, so a notification failure
    /// never rolls back the check or causes a duplicate alert next cycle.
    async fn check_item(&self, item: &TrackedItem) -> anyhow::Result<bool> {
        let acquisition = self.acquirer.acquire(&item.product_url).await?;
        self.store
            .append_price_point(item, acquisition.price, &self.currency)
            .await?;

        let evaluation = alert::evaluate(item, acquisition.price, &self.alerts, Utc::now());
        self.store.apply_check(&item.id, evaluation.delta).await?;

        if evaluation.should_alert {
            tracing::info!(
                id = %item.id,
                price = acquisition.price,
                target = item.alert_price,
                rendered = acquisition.rendered,
                "price at or below target, dispatching alert"
            );
            self.dispatch(item, acquisition.price, acquisition.title.as_deref())
                .await;
        } else {
            tracing::debug!(
                id = %item.id,
                price = acquisition.price,
                target = item.alert_price,
                "no alert"
            );
        }
        Ok(evaluation.should_alert)
    }

    /// Deliver on every configured channel; failures are logged, not fatal
    async fn dispatch(&self, item: &TrackedItem, price: f64, title: Option<&str>) {
        let message = AlertMessage::price_drop(item, price, title, &self.currency);

        if let Some(chat_id) = &item.channels.telegram_chat_id {
            match self.notifier.send_message(chat_id, &message.chat_text).await {
                Ok(()) => {}
                Err(NotifyError::NotConfigured) => {
                    tracing::warn!(id = %item.id, "telegram alert skipped: channel not configured");
                }
                Err(e) => {
                    tracing::warn!(id = %item.id, error = %e, "telegram alert failed");
                }
            }
        }

        if let Some(email) = &item.channels.email {
            match self
                .notifier
                .send_email(email, &message.email_subject, &message.email_html)
                .await
            {
                Ok(()) => {}
                Err(NotifyError::NotConfigured) => {
                    tracing::warn!(id = %item.id, "email alert skipped: channel not configured");
                }
                Err(e) => {
                    tracing::warn!(id = %item.id, error = %e, "email alert failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::AcquireError;
    use crate::storage::JsonStore;
    use crate::types::{Acquisition, ContactChannels};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// Acquirer scripted per URL
    struct ScriptedAcquirer {
        prices: HashMap<String, f64>,
    }

    #[async_trait]
    impl Acquire for ScriptedAcquirer {
        async fn acquire(&self, product_url: &str) -> Result<Acquisition, AcquireError> {
            match self.prices.get(product_url) {
                Some(price) => Ok(Acquisition {
                    price: *price,
                    title: Some("Scripted Product".to_string()),
                    rendered: false,
                }),
                None => Err(AcquireError::NoPrice {
                    url: product_url.to_string(),
                }),
            }
        }
    }

    /// Notifier that records every delivery
    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<(String, String)>>,
        emails: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
            self.messages
                .lock()
                .await
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn send_email(&self, to: &str, subject: &str, _html: &str) -> Result<(), NotifyError> {
            self.emails
                .lock()
                .await
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    fn telegram_item(url: &str, alert_price: f64) -> TrackedItem {
        TrackedItem::new(
            url,
            alert_price,
            ContactChannels {
                telegram_chat_id: Some("42".to_string()),
                email: None,
            },
        )
        .unwrap()
    }

    fn checker(
        store: Arc<JsonStore>,
        prices: HashMap<String, f64>,
        notifier: Arc<RecordingNotifier>,
    ) -> Checker {
        let config = CheckerConfig {
            item_delay_ms: 0,
            ..CheckerConfig::default()
        };
        Checker::new(
            store,
            Arc::new(ScriptedAcquirer { prices }),
            notifier,
            AlertConfig::default(),
            config,
            "INR".to_string(),
        )
    }

    #[tokio::test]
    async fn below_threshold_item_alerts_and_updates_bookkeeping() {
        let store = Arc::new(JsonStore::in_memory());
        let item = store
            .add_item(telegram_item("https://example.com/p/1", 15000.0))
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let prices = HashMap::from([("https://example.com/p/1".to_string(), 12999.0)]);

        let stats = checker(store.clone(), prices, notifier.clone())
            .run_batch()
            .await
            .unwrap();

        assert_eq!(
            stats,
            BatchStats {
                checked: 1,
                alerted: 1,
                failed: 0,
                skipped: 0
            }
        );

        let updated = store.get_item(&item.id).await.unwrap();
        assert_eq!(updated.check_count, 1);
        assert_eq!(updated.alerts_sent, 1);
        assert_eq!(updated.last_checked_price, Some(12999.0));

        let history = store.price_history(&item.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, 12999.0);

        let messages = notifier.messages.lock().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "42");
        assert!(messages[0].1.contains("Price Drop!"));
    }

    #[tokio::test]
    async fn above_threshold_item_records_but_stays_silent() {
        let store = Arc::new(JsonStore::in_memory());
        let item = store
            .add_item(telegram_item("https://example.com/p/1", 10000.0))
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let prices = HashMap::from([("https://example.com/p/1".to_string(), 12999.0)]);

        let stats = checker(store.clone(), prices, notifier.clone())
            .run_batch()
            .await
            .unwrap();

        assert_eq!(stats.checked, 1);
        assert_eq!(stats.alerted, 0);
        let updated = store.get_item(&item.id).await.unwrap();
        assert_eq!(updated.check_count, 1);
        assert_eq!(updated.alerts_sent, 0);
        assert!(notifier.messages.lock().await.is_empty());
    }

    #[tokio::test]
    async fn failed_acquisition_leaves_no_trace_and_batch_continues() {
        let store = Arc::new(JsonStore::in_memory());
        let broken = store
            .add_item(telegram_item("https://example.com/broken", 500.0))
            .await
            .unwrap();
        let healthy = store
            .add_item(telegram_item("https://example.com/healthy", 500.0))
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let prices = HashMap::from([("https://example.com/healthy".to_string(), 450.0)]);

        let stats = checker(store.clone(), prices, notifier.clone())
            .run_batch()
            .await
            .unwrap();

        assert_eq!(stats.checked, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.alerted, 1);

        // No observation and no counter movement for the failed item
        assert!(store.price_history(&broken.id).await.unwrap().is_empty());
        assert_eq!(store.get_item(&broken.id).await.unwrap().check_count, 0);
        assert_eq!(store.get_item(&healthy.id).await.unwrap().check_count, 1);
    }

    #[tokio::test]
    async fn items_missing_required_fields_are_skipped() {
        let store = Arc::new(JsonStore::in_memory());
        let mut hollow = telegram_item("https://example.com/p/1", 500.0);
        hollow.channels = ContactChannels::default();
        store.add_item(hollow).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());

        let stats = checker(store.clone(), HashMap::new(), notifier)
            .run_batch()
            .await
            .unwrap();

        assert_eq!(
            stats,
            BatchStats {
                checked: 0,
                alerted: 0,
                failed: 0,
                skipped: 1
            }
        );
    }

    #[tokio::test]
    async fn on_drop_policy_does_not_realert_while_price_stays_low() {
        let store = Arc::new(JsonStore::in_memory());
        store
            .add_item(telegram_item("https://example.com/p/1", 15000.0))
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let prices = HashMap::from([("https://example.com/p/1".to_string(), 12999.0)]);
        let checker = checker(store.clone(), prices, notifier.clone());

        let first = checker.run_batch().await.unwrap();
        let second = checker.run_batch().await.unwrap();

        assert_eq!(first.alerted, 1);
        assert_eq!(second.alerted, 0);
        assert_eq!(notifier.messages.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn email_channel_gets_the_alert_too() {
        let store = Arc::new(JsonStore::in_memory());
        let mut item = telegram_item("https://example.com/p/1", 15000.0);
        item.channels.email = Some("user@example.com".to_string());
        store.add_item(item).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let prices = HashMap::from([("https://example.com/p/1".to_string(), 12999.0)]);

        checker(store, prices, notifier.clone())
            .run_batch()
            .await
            .unwrap();

        let emails = notifier.emails.lock().await;
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].0, "user@example.com");
        assert_eq!(emails[0].1, "Price Drop Alert");
    }
}
