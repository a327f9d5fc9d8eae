use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::{ImportError, Result};
use crate::types::{
    RawAddress, RawEventDescriptor, RawImage, RawLocation, RawOrganizer, RawOrganizerEntry,
    RawStructuredAddress, RawVenue,
};

const EVENTBRITE_EVENT_ENDPOINT: &str = "https://www.eventbriteapi.com/v3/events";

/// Authenticated client for the Eventbrite v3 API. Requests expand venue and
/// organizer so the city and organizer name arrive structured.
pub struct EventbriteApiClient {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TextField {
    text: Option<String>,
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeField {
    utc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAddress {
    city: Option<String>,
    address_1: Option<String>,
    postal_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiVenue {
    name: Option<String>,
    address: Option<ApiAddress>,
}

#[derive(Debug, Deserialize)]
struct ApiOrganizer {
    name: Option<String>,
    description: Option<TextField>,
}

#[derive(Debug, Deserialize)]
struct ApiLogo {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventbriteApiEvent {
    name: Option<TextField>,
    description: Option<TextField>,
    start: Option<TimeField>,
    end: Option<TimeField>,
    #[serde(default)]
    online_event: bool,
    venue: Option<ApiVenue>,
    organizer: Option<ApiOrganizer>,
    logo: Option<ApiLogo>,
}

impl EventbriteApiClient {
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
            .get(format!(
                "{EVENTBRITE_EVENT_ENDPOINT}/{event_id}/?expand=venue,organizer"
            ))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                404 => "Event not found. Please check the URL or ensure the event is public."
                    .to_string(),
                401 => "Unauthorized access to Eventbrite API. Please check API key configuration."
                    .to_string(),
                _ => format!("Eventbrite API returned status {status}"),
            };
            return Err(ImportError::Api { message });
        }

        let event: EventbriteApiEvent = response.json().await?;
        info!("Successfully fetched event {} from Eventbrite API", event_id);

        Ok(map_event(event))
    }
}

fn map_event(event: EventbriteApiEvent) -> RawEventDescriptor {
    let name = event.name.and_then(|n| n.text);
    // Prefer the HTML description: Eventbrite truncates the plain-text one
    let description = event
        .description
        .and_then(|d| d.html.or(d.text))
        .filter(|d| !d.is_empty());

    let location = match (event.venue, event.online_event) {
        (Some(venue), _) => Some(RawLocation::Venue(RawVenue {
            location_type: None,
            name: venue.name,
            address: venue.address.map(|a| {
                RawAddress::Structured(RawStructuredAddress {
                    street_address: a.address_1,
                    address_locality: a.city,
                    city: None,
                    address_region: None,
                    postal_code: a.postal_code,
                })
            }),
        })),
        (None, true) => Some(RawLocation::Text("Online Event".to_string())),
        (None, false) => None,
    };

    // Organizer name first; description text is the fallback the listing
    // shows when the name field is empty
    let organizer = event.organizer.map(|o| {
        let name = o
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| o.description.and_then(|d| d.text));
        RawOrganizer::One(RawOrganizerEntry { name })
    });

    RawEventDescriptor {
        name,
        description,
        start_date: event.start.and_then(|t| t.utc),
        end_date: event.end.and_then(|t| t.utc),
        location,
        organizer,
        image: event.logo.and_then(|l| l.url).map(RawImage::One),
        url: None,
    }
}
