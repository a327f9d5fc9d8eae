use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::{ImportError, Result};
use crate::types::{RawEventDescriptor, RawImage, RawLocation, RawOrganizer, RawOrganizerEntry};

const LUMA_EVENT_ENDPOINT: &str = "https://api.lu.ma/public/v1/event";

/// Authenticated client for the public Luma event API.
pub struct LumaApiClient {
    client: reqwest::Client,
    api_key: String,
}

/// Shape of the Luma API event payload. Field names differ from the JSON-LD
/// descriptor (`start_at` vs `startDate`), so the payload is mapped into a
/// [`RawEventDescriptor`] before normalization.
#[derive(Debug, Deserialize)]
struct LumaApiEvent {
    name: Option<String>,
    description: Option<String>,
    start_at: Option<String>,
    end_at: Option<String>,
    #[serde(default)]
    online_event: bool,
    location: Option<RawLocation>,
    organizer: Option<RawOrganizerEntry>,
    cover_url: Option<String>,
}

impl LumaApiClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, api_key }
    }

    #[instrument(skip(self))]
    pub async fn fetch_event(&self, event_id: &str) -> Result<RawEventDescriptor> {
        let response = self
            .client
            .get(format!("{LUMA_EVENT_ENDPOINT}/{event_id}"))
            .header("accept", "application/json")
            .header("x-luma-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Api {
                message: format!("Luma API returned status {status}"),
            });
        }

        let event: LumaApiEvent = response.json().await?;
        info!("Successfully fetched event {} from Luma API", event_id);

        let location = match (event.location, event.online_event) {
            (Some(loc), _) => Some(loc),
            (None, true) => Some(RawLocation::Text("Online Event".to_string())),
            (None, false) => None,
        };

        Ok(RawEventDescriptor {
            name: event.name,
            description: event.description,
            start_date: event.start_at,
            end_date: event.end_at,
            location,
            organizer: event.organizer.map(RawOrganizer::One),
            image: event.cover_url.map(RawImage::One),
            url: None,
        })
    }
}
