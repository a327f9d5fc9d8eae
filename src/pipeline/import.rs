//! Top-level import coordinator.
//!
//! Drives one import request through the pipeline states:
//! `Detecting -> CheckingDuplicate -> Fetching -> Resolving ->
//! Persisting -> [Enriching] -> Done`, aborting with a user-facing error
//! from any state. Persisting the basic record is the commit point; the
//! progressive workflow returns right after it and enriches in a detached
//! continuation.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::ai::{AiCapability, OpenAiCapability, RetryingAi};
use crate::config::Config;
use crate::error::{ImportError, Result};
use crate::pipeline::enrich::EnrichmentOrchestrator;
use crate::platform::{extract_id, Platform};
use crate::scrape::FetchStrategyChain;
use crate::storage::EventStore;
use crate::types::{ImportRequest, StoredEvent};

/// Successful import result handed to the CLI/HTTP surface.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub event: StoredEvent,
    pub message: String,
    pub ai_processing: bool,
}

pub struct ImportCoordinator {
    store: Arc<dyn EventStore>,
    chain: FetchStrategyChain,
    enricher: Arc<EnrichmentOrchestrator>,
}

impl ImportCoordinator {
    pub fn new(
        store: Arc<dyn EventStore>,
        chain: FetchStrategyChain,
        enricher: Arc<EnrichmentOrchestrator>,
    ) -> Self {
        Self {
            store,
            chain,
            enricher,
        }
    }

    /// Production wiring: AI client (when a key is configured) shared by the
    /// strategy chain's location resolver and the enrichment stages.
    pub fn from_config(config: &Config, store: Arc<dyn EventStore>) -> Self {
        let ai: Option<Arc<dyn AiCapability>> = config.openai_api_key.clone().map(|key| {
            Arc::new(RetryingAi::new(OpenAiCapability::new(key, config.http_timeout)))
                as Arc<dyn AiCapability>
        });
        let chain = FetchStrategyChain::new(config, ai.clone());
        let enricher = Arc::new(EnrichmentOrchestrator::new(store.clone(), ai));
        Self::new(store, chain, enricher)
    }

    /// Progressive workflow: persist the basic record, return it immediately,
    /// and run enrichment as a detached continuation. The caller must not
    /// assume enrichment has completed when this returns.
    #[instrument(skip(self), fields(url = %request.url))]
    pub async fn import_progressive(&self, request: ImportRequest) -> Result<ImportOutcome> {
        let (event, platform) = self.import_basic(&request).await?;

        let ai_processing = self.enricher.enabled();
        if ai_processing {
            if let Some(id) = event.id {
                let enricher = self.enricher.clone();
                tokio::spawn(async move {
                    enricher.enrich_progressive(id).await;
                });
            }
        }

        let message = if ai_processing {
            format!(
                "Event details imported successfully from {}. AI analysis in progress...",
                platform.name()
            )
        } else {
            format!(
                "Event details imported successfully from {}. Please review and save.",
                platform.name()
            )
        };

        Ok(ImportOutcome {
            event,
            message,
            ai_processing,
        })
    }

    /// Synchronous workflow: persist the basic record, run the combined
    /// enrichment, and return the enriched record. Enrichment failure never
    /// un-succeeds a committed import.
    #[instrument(skip(self), fields(url = %request.url))]
    pub async fn import_full(&self, request: ImportRequest) -> Result<ImportOutcome> {
        let (event, platform) = self.import_basic(&request).await?;

        let event = match event.id {
            Some(id) => match self.enricher.enrich(id).await {
                Ok(enriched) => enriched,
                Err(e) => {
                    warn!("enrichment failed after commit, returning basic record: {e}");
                    event
                }
            },
            None => event,
        };

        Ok(ImportOutcome {
            event,
            message: format!(
                "Event details imported successfully from {}. Please review and save.",
                platform.name()
            ),
            ai_processing: false,
        })
    }

    /// Shared `Detecting -> CheckingDuplicate -> Fetching -> Persisting`
    /// prefix of both workflows.
    async fn import_basic(&self, request: &ImportRequest) -> Result<(StoredEvent, Platform)> {
        // Detecting
        let platform = Platform::detect(&request.url);
        if platform == Platform::Unknown {
            return Err(ImportError::UnsupportedPlatform {
                url: request.url.clone(),
            });
        }
        let id = extract_id(&request.url, platform).ok_or_else(|| ImportError::InvalidUrlFormat {
            platform: platform.name().to_string(),
            url: request.url.clone(),
        })?;

        // CheckingDuplicate, before any network fetch so idempotent retries
        // stay cheap. With force_update the guard is bypassed but the hit
        // still pins the identity the re-import must write to.
        let existing = self.store.find_duplicate(&request.url, Some(&id)).await?;
        if let Some(existing) = &existing {
            if !request.force_update {
                return Err(ImportError::AlreadyImported {
                    title: existing.title.clone(),
                });
            }
        }

        // Fetching (location resolution runs inside the chain's mapping)
        let draft = self.chain.obtain(platform, &id, &request.url).await?;

        // Persisting: the commit point
        match existing.filter(|_| request.force_update) {
            Some(mut current) => {
                current.apply_reimport(&draft, platform);
                self.store.update_event(&current).await?;
                info!("Re-imported event \"{}\" in place", current.title);
                Ok((current, platform))
            }
            None => {
                let mut event = StoredEvent::from_draft(&draft, platform);
                self.store.insert_event(&mut event).await?;
                info!("Imported event \"{}\"", event.title);
                Ok((event, platform))
            }
        }
    }
}
