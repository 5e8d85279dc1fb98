//! Price acquisition pipeline
//!
//! One acquisition = fetch the page, extract field candidates for its site,
//! normalize the price text. If the static tier fails or yields no usable
//! price, the render tier is tried exactly once before giving up.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::scraping::fetcher::{FetchError, PageFetcher};
use crate::scraping::normalize::normalize_price;
use crate::scraping::renderer::PageRenderer;
use crate::scraping::sites::SiteRegistry;
use crate::types::Acquisition;

/// Errors from a full acquisition attempt
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("invalid product URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no usable price found at {url}")]
    NoPrice { url: String },
}

/// Acquires the current price for a product URL
#[async_trait]
pub trait Acquire: Send + Sync {
    async fn acquire(&self, product_url: &str) -> Result<Acquisition, AcquireError>;
}

/// Two-tier acquirer: static HTTP first, headless render as fallback
pub struct Acquirer {
    fetcher: PageFetcher,
    renderer: Box<dyn PageRenderer>,
    registry: SiteRegistry,
}

impl Acquirer {
    pub fn new(fetcher: PageFetcher, renderer: Box<dyn PageRenderer>) -> Self {
        Self {
            fetcher,
            renderer,
            registry: SiteRegistry::with_builtin_sites(),
        }
    }

    /// Extract and normalize from one tier's content
    fn acquire_from_html(&self, url: &Url, html: &str, rendered: bool) -> Option<Acquisition> {
        let fields = self.registry.extract(url, html);
        let price = fields.price_text.as_deref().and_then(normalize_price)?;
        Some(Acquisition {
            price,
            title: fields.title,
            rendered,
        })
    }

    async fn render_tier(&self, url: &Url) -> Option<Acquisition> {
        match self.renderer.render(url).await {
            Ok(html) => self.acquire_from_html(url, &html, true),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "render tier unavailable or failed");
                None
            }
        }
    }
}

#[async_trait]
impl Acquire for Acquirer {
    async fn acquire(&self, product_url: &str) -> Result<Acquisition, AcquireError> {
        let url = Url::parse(product_url)
            .map_err(|_| AcquireError::InvalidUrl(product_url.to_string()))?;
        let site = self.registry.detect(&url).name;

        match self.fetcher.fetch(&url).await {
            Ok(html) => {
                if let Some(acquisition) = self.acquire_from_html(&url, &html, false) {
                    tracing::debug!(url = %url, site, price = acquisition.price, "acquired price");
                    return Ok(acquisition);
                }
                // Static content came back but no price candidate matched;
                // the page may populate prices client-side.
                tracing::info!(url = %url, site, "no price in static content, trying render tier");
                self.render_tier(&url).await.ok_or(AcquireError::NoPrice {
                    url: product_url.to_string(),
                })
            }
            Err(fetch_err) => {
                // Render tier gets one shot at URLs the static tier cannot
                // reach at all (bot walls that a real browser passes).
                if let Some(acquisition) = self.render_tier(&url).await {
                    return Ok(acquisition);
                }
                Err(AcquireError::Fetch(fetch_err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::renderer::{NoopRenderer, RenderError};
    use crate::config::FetchConfig;

    struct FixedRenderer(String);

    #[async_trait]
    impl PageRenderer for FixedRenderer {
        async fn render(&self, _url: &Url) -> Result<String, RenderError> {
            Ok(self.0.clone())
        }
    }

    fn acquirer_with(renderer: Box<dyn PageRenderer>) -> Acquirer {
        let fetcher = PageFetcher::new(FetchConfig::default()).unwrap();
        Acquirer::new(fetcher, renderer)
    }

    /// Fetcher aimed at nothing: one fast attempt, no backoff
    fn failing_fetcher() -> PageFetcher {
        let config = FetchConfig {
            retries: 1,
            backoff_base_ms: 0,
            timeout_secs: 1,
            ..FetchConfig::default()
        };
        PageFetcher::new(config).unwrap()
    }

    #[test]
    fn static_tier_extraction_normalizes_price() {
        let acquirer = acquirer_with(Box::new(NoopRenderer));
        let url = Url::parse("https://www.flipkart.com/x/p/1").unwrap();
        let html = r#"<div class="_30jeq3">₹12,999</div><span class="B_NuCI">Phone</span>"#;

        let acquisition = acquirer.acquire_from_html(&url, html, false).unwrap();
        assert_eq!(acquisition.price, 12999.0);
        assert_eq!(acquisition.title.as_deref(), Some("Phone"));
        assert!(!acquisition.rendered);
    }

    #[test]
    fn unnormalizable_price_text_yields_nothing() {
        let acquirer = acquirer_with(Box::new(NoopRenderer));
        let url = Url::parse("https://www.flipkart.com/x/p/1").unwrap();
        let html = r#"<div class="_30jeq3">Currently unavailable</div>"#;
        assert!(acquirer.acquire_from_html(&url, html, false).is_none());
    }

    #[tokio::test]
    async fn render_tier_marks_acquisition_as_rendered() {
        let rendered_html =
            r#"<div class="_30jeq3">₹8,499</div><span class="B_NuCI">Gadget</span>"#.to_string();
        let acquirer = acquirer_with(Box::new(FixedRenderer(rendered_html)));
        let url = Url::parse("https://www.flipkart.com/x/p/1").unwrap();

        let acquisition = acquirer.render_tier(&url).await.unwrap();
        assert_eq!(acquisition.price, 8499.0);
        assert!(acquisition.rendered);
    }

    #[tokio::test]
    async fn render_tier_rescues_an_unreachable_static_tier() {
        // Host falls back to the generic profile, so the rendered DOM uses
        // its selectors
        let rendered_html = format!(
            r#"<span id="productTitle">Gadget</span><span class="a-offscreen">{rupee}2,499</span>"#,
            rupee = '\u{20b9}'
        );
        let acquirer = Acquirer::new(failing_fetcher(), Box::new(FixedRenderer(rendered_html)));

        let acquisition = acquirer.acquire("http://127.0.0.1:1/p/1").await.unwrap();
        assert_eq!(acquisition.price, 2499.0);
        assert_eq!(acquisition.title.as_deref(), Some("Gadget"));
        assert!(acquisition.rendered);
    }

    #[tokio::test]
    async fn fetch_failure_outranks_no_price_when_rendering_is_unavailable() {
        let acquirer = Acquirer::new(failing_fetcher(), Box::new(NoopRenderer));

        let err = acquirer.acquire("http://127.0.0.1:1/p/1").await.unwrap_err();
        assert!(matches!(err, AcquireError::Fetch(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_any_network() {
        let acquirer = acquirer_with(Box::new(NoopRenderer));
        let err = acquirer.acquire("not a url").await.unwrap_err();
        assert!(matches!(err, AcquireError::InvalidUrl(_)));
    }
}
