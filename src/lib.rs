//! Pricewatch: polite product price tracker
//!
//! Watches product pages for price drops and alerts when a target is hit:
//! - Two-tier page acquisition (static HTTP with retries, headless render
//!   fallback for JS-populated pages)
//! - Per-site selector tables with priority-ordered fallbacks
//! - Currency-agnostic price text normalization
//! - Policy-driven threshold alerts (every check, on drop, or cooldown)
//! - Append-only price history in a JSON-file-backed store
//! - Telegram and SMTP delivery channels

pub mod alert;
pub mod checker;
pub mod config;
pub mod notify;
pub mod scraping;
pub mod storage;
pub mod types;

pub use config::Config;
pub use types::*;
