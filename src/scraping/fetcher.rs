//! HTTP fetch tier for product pages
//!
//! Static HTTP is the first (and usually only) tier: most product pages serve
//! price markup server-side. Transient failures are retried with a linearly
//! growing backoff before the caller escalates to the render tier.

use std::time::Instant;

use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("all {attempts} fetch attempts failed, last error: {last_error}")]
    Exhausted {
        attempts: u32,
        #[source]
        last_error: reqwest::Error,
    },
}

/// Retrying HTTP fetcher
pub struct PageFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl PageFetcher {
    /// Build a fetcher from config
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, config })
    }

    /// Fetch the page body, retrying transient failures.
    ///
    /// Non-2xx statuses count as failures and are retried like network
    /// errors. After the configured number of attempts the last error is
    /// surfaced; the sleep between attempts grows linearly.
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let retries = self.config.retries.max(1);
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(body) => {
                    tracing::debug!(
                        url = %url,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        bytes = body.len(),
                        "fetched page"
                    );
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        attempt,
                        retries,
                        status = e.status().map(|s| s.as_u16()),
                        error = %e,
                        "fetch attempt failed"
                    );
                    if attempt >= retries {
                        return Err(FetchError::Exhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<String, reqwest::Error> {
        let response = self.client.get(url.as_str()).send().await?;
        let response = response.error_for_status()?;
        response.text().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn backoff_grows_linearly() {
        let config = FetchConfig::default();
        assert_eq!(config.backoff(1), Duration::from_millis(2000));
        assert_eq!(config.backoff(2), Duration::from_millis(4000));
        assert_eq!(config.backoff(3), Duration::from_millis(6000));
    }

    #[test]
    fn builds_with_default_config() {
        assert!(PageFetcher::new(FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn exhausts_the_retry_budget_on_an_unreachable_host() {
        let config = FetchConfig {
            retries: 3,
            backoff_base_ms: 0,
            timeout_secs: 1,
            ..FetchConfig::default()
        };
        let fetcher = PageFetcher::new(config).unwrap();
        // Port 1 refuses connections immediately
        let url = Url::parse("http://127.0.0.1:1/").unwrap();

        match fetcher.fetch(&url).await {
            Err(FetchError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected retry exhaustion, got {other:?}"),
        }
    }
}
