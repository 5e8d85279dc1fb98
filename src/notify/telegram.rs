//! Telegram Bot API channel

use std::time::Duration;

use serde::Serialize;

use super::NotifyError;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Sends messages through the Bot API `sendMessage` method
pub struct TelegramSender {
    client: reqwest::Client,
    token: String,
}

impl TelegramSender {
    pub fn new(token: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client, token })
    }

    /// Send `text` to `chat_id` with HTML parse mode
    pub async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{API_BASE}/bot{}/sendMessage", self.token);
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Telegram(e.to_string()))?;

        // The Bot API reports errors with non-2xx statuses and a JSON body;
        // the status alone is enough to decide success.
        if let Err(e) = response.error_for_status_ref() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Telegram(format!("{e}: {body}")));
        }

        tracing::debug!(chat_id, "telegram message sent");
        Ok(())
    }
}
