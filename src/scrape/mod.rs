//! Multi-tier fetch strategy chain.
//!
//! Strategies are attempted strictly in order; the first one that yields a
//! normalized draft wins and each failure silently advances to the next:
//! authenticated platform API, plain HTTP fetch + structured extraction,
//! headless render + structured extraction, DOM-selector scraping. Platforms
//! without structured data (Partiful) go straight from the API tier to the
//! render + DOM tier.

pub mod dom;
pub mod fetch;
pub mod normalize;
pub mod render;
pub mod structured;

use std::sync::Arc;

use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

use crate::ai::AiCapability;
use crate::apis::{EventbriteApiClient, LumaApiClient};
use crate::config::Config;
use crate::constants::TBD;
use crate::error::{ImportError, Result};
use crate::pipeline::location::{find_uk_city_mention, LocationResolver};
use crate::platform::Platform;
use crate::scrape::fetch::{HttpPageFetcher, PageFetcher};
use crate::scrape::normalize::Provenance;
use crate::scrape::render::{ChromeRenderer, PageRenderer};
use crate::types::{NormalizedEventDraft, RawEventDescriptor, RawLocation};

pub struct FetchStrategyChain {
    luma_api: Option<LumaApiClient>,
    eventbrite_api: Option<EventbriteApiClient>,
    fetcher: Arc<dyn PageFetcher>,
    renderer: Arc<dyn PageRenderer>,
    resolver: LocationResolver,
}

impl FetchStrategyChain {
    /// Production wiring from environment configuration. A missing platform
    /// credential simply switches the API tier off.
    pub fn new(config: &Config, ai: Option<Arc<dyn AiCapability>>) -> Self {
        Self {
            luma_api: config
                .luma_api_key
                .clone()
                .map(|key| LumaApiClient::new(key, config.http_timeout)),
            eventbrite_api: config
                .eventbrite_api_key
                .clone()
                .map(|key| EventbriteApiClient::new(key, config.http_timeout)),
            fetcher: Arc::new(HttpPageFetcher::new(config.http_timeout)),
            renderer: Arc::new(ChromeRenderer::new(config.render_timeout)),
            resolver: LocationResolver::new(ai),
        }
    }

    /// Wiring with explicit collaborators, used by tests to substitute canned
    /// fetchers and renderers.
    pub fn with_parts(
        luma_api: Option<LumaApiClient>,
        eventbrite_api: Option<EventbriteApiClient>,
        fetcher: Arc<dyn PageFetcher>,
        renderer: Arc<dyn PageRenderer>,
        resolver: LocationResolver,
    ) -> Self {
        Self {
            luma_api,
            eventbrite_api,
            fetcher,
            renderer,
            resolver,
        }
    }

    /// Runs the strategy chain for one event. Returns the first successful
    /// normalized draft, or `FetchExhausted` once every strategy has failed.
    #[instrument(skip(self))]
    pub async fn obtain(
        &self,
        platform: Platform,
        id: &str,
        url: &str,
    ) -> Result<NormalizedEventDraft> {
        let mut failures: Vec<String> = Vec::new();

        // Strategy 1: authenticated platform API
        if let Some(descriptor) = self.try_api(platform, id, &mut failures).await {
            info!("Imported event via {} API", platform.name());
            return Ok(self.finish(descriptor, id, url, platform, Provenance::Api).await);
        }

        // Strategy 2: plain HTTP fetch + structured extraction
        if platform.has_structured_data() {
            match self.fetcher.fetch(url).await {
                Ok(html) => {
                    if let Some(descriptor) = structured::extract(&html) {
                        info!("Found structured event data via plain fetch");
                        return Ok(self
                            .finish(descriptor, id, url, platform, Provenance::Scraped)
                            .await);
                    }
                    // Private Luma events hide their structured data; salvage
                    // what the static page still shows
                    if platform == Platform::Luma {
                        if let Some(draft) = self.salvage_private_event(&html, id, url).await {
                            info!("Salvaged basic data from private event page");
                            return Ok(draft);
                        }
                    }
                    failures.push("no structured event data in fetched page".to_string());
                }
                Err(e) => {
                    warn!("plain fetch failed: {e}");
                    failures.push(format!("plain fetch: {e}"));
                }
            }
        }

        // Strategies 3 and 4 share one render
        match self.renderer.render(url).await {
            Ok(html) => {
                if platform.has_structured_data() {
                    if let Some(descriptor) = structured::extract(&html) {
                        info!("Found structured event data via headless render");
                        return Ok(self
                            .finish(descriptor, id, url, platform, Provenance::Scraped)
                            .await);
                    }
                }
                if let Some(descriptor) = dom::scrape(&html, platform) {
                    info!("Extracted event via DOM selectors");
                    return Ok(self
                        .finish(descriptor, id, url, platform, Provenance::Scraped)
                        .await);
                }
                failures.push("rendered page yielded no event data".to_string());
            }
            Err(e) => {
                warn!("headless render failed: {e}");
                failures.push(format!("render: {e}"));
            }
        }

        Err(ImportError::FetchExhausted {
            platform: platform.name().to_string(),
            url: url.to_string(),
            detail: failures.join("; "),
        })
    }

    async fn try_api(
        &self,
        platform: Platform,
        id: &str,
        failures: &mut Vec<String>,
    ) -> Option<RawEventDescriptor> {
        let attempt = match platform {
            Platform::Luma => match &self.luma_api {
                Some(api) => Some(api.fetch_event(id).await),
                None => None,
            },
            Platform::Eventbrite => match &self.eventbrite_api {
                Some(api) => Some(api.fetch_event(id).await),
                None => None,
            },
            _ => None,
        };

        match attempt {
            Some(Ok(descriptor)) => Some(descriptor),
            Some(Err(e)) => {
                warn!("{} API failed, falling back to scraper: {e}", platform.name());
                failures.push(format!("{} API: {e}", platform.name()));
                None
            }
            None => None,
        }
    }

    async fn finish(
        &self,
        descriptor: RawEventDescriptor,
        id: &str,
        url: &str,
        platform: Platform,
        provenance: Provenance,
    ) -> NormalizedEventDraft {
        let mut draft =
            normalize::to_draft(&descriptor, url, platform, provenance, &self.resolver).await;
        draft.platform_id = Some(id.to_string());
        draft
    }

    /// Private events serve a page with no structured data; the title and a
    /// city mention in the body are usually still present.
    async fn salvage_private_event(
        &self,
        html: &str,
        id: &str,
        url: &str,
    ) -> Option<NormalizedEventDraft> {
        let title = first_heading(html)?;

        let descriptor = RawEventDescriptor {
            name: Some(title),
            location: Some(RawLocation::Text("Register to see address".to_string())),
            ..Default::default()
        };
        let mut draft = self
            .finish(descriptor, id, url, Platform::Luma, Provenance::Scraped)
            .await;

        if draft.city == TBD {
            if let Some(city) = find_uk_city_mention(&page_text(html)) {
                draft.city = city;
                draft.city_confidence = 1.0;
                draft.needs_city_confirmation = false;
            }
        }
        Some(draft)
    }
}

fn first_heading(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1").ok()?;
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty())
}

fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    match Selector::parse("body") {
        Ok(selector) => document
            .select(&selector)
            .map(|el| el.text().collect::<String>())
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => String::new(),
    }
}
