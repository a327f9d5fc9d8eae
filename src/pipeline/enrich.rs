//! Two-stage, non-blocking AI enrichment on top of an already-saved record.
//!
//! Categorization (stage 1) and summarization (stage 2) are deliberately
//! decoupled: a record is usable with neither, either, or both halves
//! populated, and each stage degrades to defaults instead of failing the
//! import. Retry mechanics live in the AI wrapper; this orchestrator only
//! sequences stages and persists their results by record identity.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::{AiCapability, Classification, Summary};
use crate::constants::DEFAULT_EXCITEMENT_HOOK;
use crate::error::{ImportError, Result};
use crate::storage::EventStore;
use crate::types::StoredEvent;

pub struct EnrichmentOrchestrator {
    store: Arc<dyn EventStore>,
    ai: Option<Arc<dyn AiCapability>>,
}

impl EnrichmentOrchestrator {
    pub fn new(store: Arc<dyn EventStore>, ai: Option<Arc<dyn AiCapability>>) -> Self {
        Self { store, ai }
    }

    /// Enrichment is switched off entirely when no AI capability is
    /// configured; records keep their default AI fields.
    pub fn enabled(&self) -> bool {
        self.ai.is_some()
    }

    /// Stage 1: categorize an already-persisted record and write the result
    /// back by identity. A failed AI call degrades to `Other` / no areas.
    pub async fn categorize(&self, id: Uuid) -> Result<StoredEvent> {
        let mut event = self.load(id).await?;
        if self.ai.is_none() {
            return Ok(event);
        }

        let classification = self.classify(&event).await;
        apply_classification(&mut event, classification);
        self.store.update_event(&event).await?;
        info!("Categorized event {id}: {}", event.ai.ai_event_type);
        Ok(event)
    }

    /// Stage 2: generate the summary fields for an already-persisted record.
    /// Independent of stage 1; callable on any record with basic fields.
    pub async fn summarize(&self, id: Uuid) -> Result<StoredEvent> {
        let mut event = self.load(id).await?;
        if self.ai.is_none() {
            return Ok(event);
        }

        let summary = self.summarize_fields(&event).await;
        apply_summary(&mut event, summary);
        self.store.update_event(&event).await?;
        info!("Summarized event {id}");
        Ok(event)
    }

    /// Legacy combined mode: both stages run concurrently and are joined
    /// before the single write. Higher latency tolerance, one round trip.
    pub async fn enrich(&self, id: Uuid) -> Result<StoredEvent> {
        let mut event = self.load(id).await?;
        if self.ai.is_none() {
            return Ok(event);
        }

        let (classification, summary) =
            tokio::join!(self.classify(&event), self.summarize_fields(&event));
        apply_classification(&mut event, classification);
        apply_summary(&mut event, summary);
        self.store.update_event(&event).await?;
        info!("Enriched event {id}");
        Ok(event)
    }

    /// Progressive continuation: stages run in order, each persisting on its
    /// own, so categorization becomes visible before the slower summary.
    /// Best-effort by design; failures are logged, never surfaced.
    pub async fn enrich_progressive(&self, id: Uuid) {
        if let Err(e) = self.categorize(id).await {
            warn!("progressive categorization failed for {id}: {e}");
        }
        if let Err(e) = self.summarize(id).await {
            warn!("progressive summarization failed for {id}: {e}");
        }
    }

    async fn load(&self, id: Uuid) -> Result<StoredEvent> {
        self.store
            .get_event(id)
            .await?
            .ok_or_else(|| ImportError::Store(format!("no event with id {id}")))
    }

    async fn classify(&self, event: &StoredEvent) -> Option<Classification> {
        let ai = self.ai.as_ref()?;
        match ai.classify(&event.title, &event.description).await {
            Ok(classification) => Some(classification),
            Err(e) => {
                warn!("categorization failed, using defaults: {e}");
                None
            }
        }
    }

    async fn summarize_fields(&self, event: &StoredEvent) -> Option<Summary> {
        let ai = self.ai.as_ref()?;
        match ai.summarize(&event.title, &event.description).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("summary generation failed, using defaults: {e}");
                None
            }
        }
    }
}

fn apply_classification(event: &mut StoredEvent, classification: Option<Classification>) {
    match classification {
        Some(c) => {
            event.ai.ai_event_type = c.event_type;
            event.ai.ai_interest_areas = c.interest_areas;
            event.ai.ai_categorized = true;
        }
        None => {
            event.ai.ai_event_type = "Other".to_string();
            event.ai.ai_interest_areas = Vec::new();
            event.ai.ai_categorized = false;
        }
    }
    event.ai.ai_categorized_at = Some(Utc::now());
}

fn apply_summary(event: &mut StoredEvent, summary: Option<Summary>) {
    match summary {
        Some(s) => {
            event.ai.ai_summary = s.summary;
            event.ai.ai_technical_keywords = s.technical_keywords;
            event.ai.ai_excitement_hook = if s.excitement_hook.is_empty() {
                DEFAULT_EXCITEMENT_HOOK.to_string()
            } else {
                s.excitement_hook
            };
            event.ai.ai_summarized = true;
        }
        None => {
            event.ai.ai_summary = if event.description.is_empty() {
                event.title.clone()
            } else {
                event.description.clone()
            };
            event.ai.ai_technical_keywords = Vec::new();
            event.ai.ai_excitement_hook = DEFAULT_EXCITEMENT_HOOK.to_string();
            event.ai.ai_summarized = false;
        }
    }
    event.ai.ai_summarized_at = Some(Utc::now());
}
