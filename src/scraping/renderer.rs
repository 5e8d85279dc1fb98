//! Headless render tier
//!
//! Some product pages ship their price markup only after client-side
//! JavaScript runs. When the static tier yields nothing usable, the acquirer
//! asks a [`PageRenderer`] for the post-JS DOM. Rendering needs an external
//! chromium installation, so it is off by default and the checker runs with
//! [`NoopRenderer`] unless enabled in config.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use thiserror::Error;
use url::Url;

use crate::config::RenderConfig;

/// Errors from the render tier
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("rendering is not enabled")]
    Unavailable,
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces the post-JavaScript DOM for a URL
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<String, RenderError>;
}

/// Renderer that is always unavailable; used when rendering is disabled
pub struct NoopRenderer;

#[async_trait]
impl PageRenderer for NoopRenderer {
    async fn render(&self, _url: &Url) -> Result<String, RenderError> {
        Err(RenderError::Unavailable)
    }
}

/// Chromium-backed renderer.
///
/// Launches a fresh headless browser per render. Product checks are minutes
/// apart, so keeping a warm browser alive is not worth the resident memory.
pub struct ChromiumRenderer {
    config: RenderConfig,
}

impl ChromiumRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    async fn render_inner(&self, url: &Url) -> Result<String, RenderError> {
        let browser_config = BrowserConfig::builder()
            .build()
            .map_err(RenderError::Launch)?;
        let (mut browser, mut handler) = Browser::launch(browser_config).await?;

        // The handler stream must be drained for the browser to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = async {
            let page = browser.new_page(url.as_str()).await?;
            page.wait_for_navigation().await?;
            let content = page.content().await?;
            Ok::<_, RenderError>(content)
        }
        .await;

        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "browser close failed");
        }
        handler_task.abort();

        result
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &Url) -> Result<String, RenderError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        tracing::info!(url = %url, "rendering page with headless browser");
        match tokio::time::timeout(timeout, self.render_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_renderer_reports_unavailable() {
        let url = Url::parse("https://example.com/p/1").unwrap();
        let err = NoopRenderer.render(&url).await.unwrap_err();
        assert!(matches!(err, RenderError::Unavailable));
    }
}
