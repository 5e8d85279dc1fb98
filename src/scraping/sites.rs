//! Per-site extraction profiles
//!
//! Product pages drift across redesigns and A/B layouts, so each site carries
//! an ordered list of selector candidates per field; candidates are tried in
//! priority order and the first one whose element yields non-empty text wins.
//! Selection is purely textual: whether the winning text parses as a number
//! is the normalizer's concern, and a match whose text turns out unparseable
//! ("Currently unavailable") does not fall through to later candidates — the
//! acquirer escalates to the render tier instead. Adding a site means adding
//! one registry entry, nothing else.

use scraper::{Html, Selector};
use url::Url;

/// Maximum stored title length, in characters
const TITLE_MAX_CHARS: usize = 200;

/// Raw field candidates pulled out of a page; absence is not an error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCandidates {
    /// Raw price text, pre-normalization
    pub price_text: Option<String>,
    /// Product title, truncated to the storage bound
    pub title: Option<String>,
}

/// One site's extraction strategy
pub struct SiteProfile {
    /// Human-readable site name
    pub name: &'static str,
    /// Host substrings that select this profile
    domains: &'static [&'static str],
    /// Price selector candidates, in priority order
    price_selectors: Vec<Selector>,
    /// Title selector candidates, in priority order
    title_selectors: Vec<Selector>,
}

impl SiteProfile {
    fn new(
        name: &'static str,
        domains: &'static [&'static str],
        price: &[&str],
        title: &[&str],
    ) -> Self {
        Self {
            name,
            domains,
            // Selector strings are compile-time constants; a candidate that
            // fails to parse is dropped rather than poisoning the profile.
            price_selectors: price.iter().filter_map(|s| Selector::parse(s).ok()).collect(),
            title_selectors: title.iter().filter_map(|s| Selector::parse(s).ok()).collect(),
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        self.domains.iter().any(|d| host.contains(d))
    }

    /// Extract price text and title from parsed content.
    ///
    /// Never fails: a field with no matching candidate is simply `None`.
    pub fn extract(&self, document: &Html) -> FieldCandidates {
        FieldCandidates {
            price_text: first_match(document, &self.price_selectors),
            title: first_match(document, &self.title_selectors)
                .map(|t| truncate_chars(&t, TITLE_MAX_CHARS)),
        }
    }
}

/// First candidate whose matched element carries non-empty text
fn first_match(document: &Html, selectors: &[Selector]) -> Option<String> {
    for selector in selectors {
        if let Some(element) = document.select(selector).next() {
            let text = element.text().collect::<String>();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Truncate to at most `max` characters without splitting a code point
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Registry mapping host substrings to site profiles
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
    /// Index of the profile used for unrecognized hosts
    fallback: usize,
}

impl SiteRegistry {
    /// Registry with the built-in site profiles.
    ///
    /// Unrecognized hosts fall back to the Amazon profile; its selectors are
    /// generic enough (`h1`, `.a-offscreen`) to degrade gracefully.
    pub fn with_builtin_sites() -> Self {
        let flipkart = SiteProfile::new(
            "flipkart",
            &["flipkart.com"],
            &[
                "div._30jeq3",
                "div._1vC4OE",
                "div._1_WHN1",
                "div._25b18c",
                "span._30jeq3",
                "div._16Jk6d",
            ],
            &["span.B_NuCI", "h1._1AtVbE", "span._35KyD6", "h1"],
        );
        let amazon = SiteProfile::new(
            "amazon",
            &["amazon."],
            &[
                "#priceblock_ourprice",
                "#priceblock_dealprice",
                ".a-price .a-offscreen",
                "#price_inside_buybox",
                ".a-offscreen",
            ],
            &["#productTitle", "h1#title", "span#productTitle", "h1"],
        );

        let profiles = vec![flipkart, amazon];
        let fallback = profiles.len() - 1;
        Self { profiles, fallback }
    }

    /// Register an additional site profile
    pub fn register(
        &mut self,
        name: &'static str,
        domains: &'static [&'static str],
        price_selectors: &[&str],
        title_selectors: &[&str],
    ) {
        self.profiles
            .push(SiteProfile::new(name, domains, price_selectors, title_selectors));
    }

    /// Pick the profile for a URL by substring match against its host
    pub fn detect(&self, url: &Url) -> &SiteProfile {
        let host = url.host_str().unwrap_or_default().to_lowercase();
        self.profiles
            .iter()
            .find(|p| p.matches_host(&host))
            .unwrap_or(&self.profiles[self.fallback])
    }

    /// Detect the site for a URL and extract field candidates from content
    pub fn extract(&self, url: &Url, html: &str) -> FieldCandidates {
        let document = Html::parse_document(html);
        self.detect(url).extract(&document)
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::with_builtin_sites()
    }
}
