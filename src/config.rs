//! Configuration for pricewatch

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::alert::AlertPolicy;

/// Main configuration for the price checker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Page fetching configuration
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Headless-render fallback configuration
    #[serde(default)]
    pub render: RenderConfig,
    /// Alert evaluation configuration
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Notification channel configuration
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Batch checker configuration
    #[serde(default)]
    pub checker: CheckerConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.store.data_dir.as_os_str().is_empty() {
            errors.push("data_dir must not be empty".to_string());
        }
        if self.store.currency.is_empty() {
            errors.push("currency must not be empty".to_string());
        }

        if self.fetch.retries == 0 {
            errors.push("fetch retries must be positive".to_string());
        }
        if self.fetch.retries > 10 {
            errors.push("fetch retries must be <= 10".to_string());
        }
        if self.fetch.timeout_secs == 0 {
            errors.push("fetch timeout must be positive".to_string());
        }
        if self.fetch.user_agent.is_empty() {
            errors.push("user_agent must not be empty".to_string());
        }

        if self.render.timeout_secs == 0 {
            errors.push("render timeout must be positive".to_string());
        }

        if let AlertPolicy::Cooldown = self.alerts.policy {
            if self.alerts.cooldown_secs == 0 {
                errors.push("cooldown_secs must be positive for the cooldown policy".to_string());
            }
        }

        if self.notify.timeout_secs == 0 {
            errors.push("notify timeout must be positive".to_string());
        }
        if let Some(smtp) = &self.notify.smtp {
            if smtp.host.is_empty() {
                errors.push("smtp host must not be empty".to_string());
            }
            if smtp.port == 0 {
                errors.push("smtp port must be between 1 and 65535".to_string());
            }
            if smtp.from.is_empty() {
                errors.push("smtp from address must not be empty".to_string());
            }
        }

        if self.checker.watch_interval_secs == 0 {
            errors.push("watch_interval_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the tracked-item and price-history files
    pub data_dir: PathBuf,
    /// Currency code recorded on every price point (fixed per deployment)
    pub currency: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".pricewatch"),
            currency: "INR".to_string(),
        }
    }
}

/// Page fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User agent sent with every request
    pub user_agent: String,
    /// Maximum fetch attempts per acquisition
    pub retries: u32,
    /// Backoff base; attempt n sleeps base * n before retrying
    pub backoff_base_ms: u64,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            retries: 3,
            backoff_base_ms: 2000,
            timeout_secs: 15,
        }
    }
}

impl FetchConfig {
    /// Per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff before the retry following attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms * u64::from(attempt))
    }
}

/// Headless-render fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Enable the headless browser fallback for script-generated markup
    pub enabled: bool,
    /// Render timeout (seconds), independent of the fetch retry budget
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 30,
        }
    }
}

/// Alert evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// When a below-threshold price should fire an alert
    pub policy: AlertPolicy,
    /// Minimum gap between alerts for one item under the cooldown policy
    pub cooldown_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            policy: AlertPolicy::OnDrop,
            cooldown_secs: 24 * 60 * 60,
        }
    }
}

impl AlertConfig {
    /// Cooldown window as a chrono duration
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cooldown_secs as i64)
    }
}

/// Notification channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Telegram bot token; falls back to the TELEGRAM_BOT_TOKEN env var
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    /// SMTP settings; email delivery is skipped when absent
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// Per-send timeout (seconds)
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

fn default_notify_timeout() -> u64 {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            smtp: None,
            timeout_secs: default_notify_timeout(),
        }
    }
}

impl NotifyConfig {
    /// Resolve the telegram token from config or environment
    pub fn telegram_token(&self) -> Option<String> {
        self.telegram_bot_token
            .clone()
            .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }
}

/// SMTP settings for the email channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// From address on outgoing alert mail
    pub from: String,
}

/// Batch checker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Polite pause after each item completes (milliseconds)
    pub item_delay_ms: u64,
    /// Interval between batches in watch mode (seconds)
    pub watch_interval_secs: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: 2000,
            watch_interval_secs: 30 * 60,
        }
    }
}

impl CheckerConfig {
    /// Polite inter-item delay as a Duration
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    /// Interval between batches in watch mode
    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }
}
