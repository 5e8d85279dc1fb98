//! Alert delivery channels
//!
//! A [`Notifier`] knows how to push a message to a chat id and an HTML email
//! to an address. [`ChannelNotifier`] composes the concrete channels that are
//! actually configured and skips the rest; a delivery failure on one channel
//! never blocks the other.

pub mod email;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::NotifyConfig;
use crate::types::TrackedItem;

pub use email::EmailSender;
pub use telegram::TelegramSender;

/// Errors from a single delivery attempt
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram send failed: {0}")]
    Telegram(String),
    #[error("email send failed: {0}")]
    Email(String),
    #[error("channel is not configured")]
    NotConfigured,
}

/// Delivery interface for alert messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push a chat message (Telegram-flavored HTML)
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;
    /// Send an HTML email
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError>;
}

/// Formatted alert content for one price drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    /// Chat text, Telegram HTML parse mode
    pub chat_text: String,
    /// Email subject line
    pub email_subject: String,
    /// Email HTML body
    pub email_html: String,
}

impl AlertMessage {
    /// Build the alert content for an item and its freshly observed price
    pub fn price_drop(
        item: &TrackedItem,
        observed_price: f64,
        title: Option<&str>,
        currency: &str,
    ) -> Self {
        let title = title.unwrap_or("Product");
        let sym = currency_symbol(currency);
        let url = &item.product_url;

        let chat_text = format!(
            "\u{1f525} Price Drop!\n\n<b>{title}</b>\n\
             \u{1f4b8} Current Price: {sym}{observed_price}\n\
             \u{1f3af} Your Target: {sym}{target}\n\
             \u{1f517} {url}",
            target = item.alert_price,
        );

        let email_html = format!(
            "<p><b>{title}</b></p>\
             <p>Current Price: {sym}{observed_price}</p>\
             <p>Target Price: {sym}{target}</p>\
             <p><a href='{url}'>Buy Now</a></p>",
            target = item.alert_price,
        );

        Self {
            chat_text,
            email_subject: "Price Drop Alert".to_string(),
            email_html,
        }
    }
}

fn currency_symbol(currency: &str) -> &str {
    match currency {
        "INR" => "\u{20b9}",
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{a3}",
        other => other,
    }
}

/// Notifier composed from the configured channels.
///
/// A channel left unconfigured returns `NotConfigured`; the checker logs and
/// moves on rather than treating it as a delivery failure.
pub struct ChannelNotifier {
    telegram: Option<TelegramSender>,
    email: Option<EmailSender>,
}

impl ChannelNotifier {
    /// Build from config; channels without credentials stay disabled
    pub fn from_config(config: &NotifyConfig) -> anyhow::Result<Self> {
        let telegram = match config.telegram_token() {
            Some(token) => Some(TelegramSender::new(token, config.timeout_secs)?),
            None => {
                tracing::info!("telegram channel disabled: no bot token configured");
                None
            }
        };
        let email = match &config.smtp {
            Some(smtp) => Some(EmailSender::new(smtp)?),
            None => {
                tracing::info!("email channel disabled: no smtp configured");
                None
            }
        };
        Ok(Self { telegram, email })
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        match &self.telegram {
            Some(sender) => sender.send(chat_id, text).await,
            None => Err(NotifyError::NotConfigured),
        }
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        match &self.email {
            Some(sender) => sender.send(to, subject, html).await,
            None => Err(NotifyError::NotConfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContactChannels;

    fn item() -> TrackedItem {
        TrackedItem::new(
            "https://example.com/p/1",
            15000.0,
            ContactChannels {
                telegram_chat_id: Some("42".to_string()),
                email: Some("user@example.com".to_string()),
            },
        )
        .unwrap()
    }

    #[test]
    fn chat_text_carries_title_prices_and_url() {
        let msg = AlertMessage::price_drop(&item(), 12999.0, Some("Acme Phone"), "INR");
        assert!(msg.chat_text.starts_with("\u{1f525} Price Drop!"));
        assert!(msg.chat_text.contains("<b>Acme Phone</b>"));
        assert!(msg.chat_text.contains("\u{20b9}12999"));
        assert!(msg.chat_text.contains("\u{20b9}15000"));
        assert!(msg.chat_text.contains("https://example.com/p/1"));
    }

    #[test]
    fn missing_title_falls_back_to_generic_product() {
        let msg = AlertMessage::price_drop(&item(), 12999.0, None, "INR");
        assert!(msg.chat_text.contains("<b>Product</b>"));
        assert!(msg.email_html.contains("<b>Product</b>"));
    }

    #[test]
    fn email_has_fixed_subject_and_buy_link() {
        let msg = AlertMessage::price_drop(&item(), 12999.0, Some("Acme Phone"), "INR");
        assert_eq!(msg.email_subject, "Price Drop Alert");
        assert!(msg
            .email_html
            .contains("<a href='https://example.com/p/1'>Buy Now</a>"));
    }

    #[test]
    fn unknown_currency_codes_are_used_verbatim() {
        let msg = AlertMessage::price_drop(&item(), 12999.0, None, "JPY");
        assert!(msg.chat_text.contains("JPY12999"));
    }
}
