//! Scraping pipeline: fetch, render, extract, normalize
//!
//! The pipeline is two-tiered. Static HTTP ([`fetcher`]) covers pages that
//! serve prices server-side; the headless render tier ([`renderer`]) is the
//! one-shot fallback for JS-populated pages. Site-specific selector tables
//! live in [`sites`] and price text is canonicalized by [`normalize`].

pub mod acquire;
pub mod fetcher;
pub mod normalize;
pub mod renderer;
pub mod sites;

pub use acquire::{Acquire, AcquireError, Acquirer};
pub use fetcher::{FetchError, PageFetcher};
pub use normalize::normalize_price;
pub use renderer::{ChromiumRenderer, NoopRenderer, PageRenderer, RenderError};
pub use sites::{FieldCandidates, SiteProfile, SiteRegistry};
