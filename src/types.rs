use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_EXCITEMENT_HOOK;
use crate::platform::Platform;

/// A single user-triggered import. Consumed once by the coordinator.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub url: String,
    #[serde(default, rename = "forceUpdate")]
    pub force_update: bool,
}

/// Loosely-typed structured event data pulled from a page or a platform API.
///
/// This is the untyped boundary: every field is optional and the
/// string-or-object shapes upstream pages actually emit are modelled as
/// untagged enums. Nothing outside `scrape::normalize` reads these fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub organizer: Option<RawOrganizer>,
    #[serde(default)]
    pub image: Option<RawImage>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLocation {
    Text(String),
    Venue(RawVenue),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVenue {
    #[serde(rename = "@type", default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<RawAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAddress {
    Text(String),
    Structured(RawStructuredAddress),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStructuredAddress {
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub address_locality: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address_region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawOrganizer {
    Many(Vec<RawOrganizerEntry>),
    One(RawOrganizerEntry),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOrganizerEntry {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawImage {
    Many(Vec<String>),
    One(String),
}

impl RawImage {
    pub fn first(&self) -> Option<&str> {
        match self {
            RawImage::One(s) => Some(s.as_str()),
            RawImage::Many(v) => v.first().map(|s| s.as_str()),
        }
    }
}

/// Normalized event produced by the fetch strategy chain. The unit handed to
/// persistence and to AI enrichment.
///
/// Invariant: `date` is always a valid calendar date (falls back to today
/// when the upstream timestamp is unparseable); `time` may be "TBD".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEventDraft {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub city: String,
    pub city_confidence: f32,
    pub needs_city_confirmation: bool,
    pub organizer: String,
    pub url: String,
    pub image_url: Option<String>,
    pub categories: Vec<String>,
    pub platform_id: Option<String>,
    pub platform_tag: String,
}

/// AI-derived fields, added only after a record has a persisted identity.
/// Categorization and summary halves are independently settable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnrichedEventFields {
    pub ai_event_type: String,
    pub ai_interest_areas: Vec<String>,
    pub ai_categorized: bool,
    pub ai_categorized_at: Option<DateTime<Utc>>,
    pub ai_summary: String,
    pub ai_technical_keywords: Vec<String>,
    pub ai_excitement_hook: String,
    pub ai_summarized: bool,
    pub ai_summarized_at: Option<DateTime<Utc>>,
}

impl EnrichedEventFields {
    /// Default AI values a record carries until (or in place of) enrichment.
    /// The summary falls back to the raw description or title so the record
    /// is always usable.
    pub fn defaults_for(title: &str, description: &str) -> Self {
        let summary = if description.is_empty() {
            title.to_string()
        } else {
            description.to_string()
        };
        Self {
            ai_event_type: "Other".to_string(),
            ai_interest_areas: Vec::new(),
            ai_categorized: false,
            ai_categorized_at: None,
            ai_summary: summary,
            ai_technical_keywords: Vec::new(),
            ai_excitement_hook: DEFAULT_EXCITEMENT_HOOK.to_string(),
            ai_summarized: false,
            ai_summarized_at: None,
        }
    }
}

/// Persisted event record: draft fields, enrichment fields, store-assigned
/// identity, engagement counters, and audit timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub city: String,
    pub city_confidence: f32,
    pub needs_city_confirmation: bool,
    pub organizer: String,
    pub url: String,
    pub image_url: Option<String>,
    pub categories: Vec<String>,
    pub luma_id: Option<String>,
    pub eventbrite_id: Option<String>,
    pub platform: String,
    #[serde(flatten)]
    pub ai: EnrichedEventFields,
    pub view_count: u64,
    pub click_count: u64,
    pub imported_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Builds the basic persisted record from a normalized draft. AI fields
    /// start at their defaults and are filled in by the enrichment stages.
    pub fn from_draft(draft: &NormalizedEventDraft, platform: Platform) -> Self {
        let ai = EnrichedEventFields::defaults_for(&draft.title, &draft.description);
        Self {
            id: None,
            title: draft.title.clone(),
            description: draft.description.clone(),
            date: draft.date,
            time: draft.time.clone(),
            location: draft.location.clone(),
            city: draft.city.clone(),
            city_confidence: draft.city_confidence,
            needs_city_confirmation: draft.needs_city_confirmation,
            organizer: draft.organizer.clone(),
            url: draft.url.clone(),
            image_url: draft.image_url.clone(),
            categories: draft.categories.clone(),
            luma_id: matches!(platform, Platform::Luma)
                .then(|| draft.platform_id.clone())
                .flatten(),
            eventbrite_id: matches!(platform, Platform::Eventbrite)
                .then(|| draft.platform_id.clone())
                .flatten(),
            platform: draft.platform_tag.clone(),
            ai,
            view_count: 0,
            click_count: 0,
            imported_at: Utc::now(),
        }
    }

    /// Overwrites content fields from a re-imported draft while preserving
    /// identity and engagement counters.
    pub fn apply_reimport(&mut self, draft: &NormalizedEventDraft, platform: Platform) {
        let id = self.id;
        let view_count = self.view_count;
        let click_count = self.click_count;
        *self = StoredEvent::from_draft(draft, platform);
        self.id = id;
        self.view_count = view_count;
        self.click_count = click_count;
    }
}
