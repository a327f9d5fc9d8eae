//! Location and city resolution.
//!
//! Two-path design: rule-based extraction first (free, deterministic), AI
//! inference only for the long tail, gated by a confidence threshold so a
//! low-confidence hallucinated city can never pollute the location filters.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::ai::AiCapability;
use crate::constants::{
    CITY_CONFIDENCE_THRESHOLD, CITY_INFERENCE_DESCRIPTION_LIMIT, INTERNATIONAL_CITIES, ONLINE,
    PLACEHOLDER_LOCATION_PHRASES, TBD, UK_CITIES,
};
use crate::types::{RawAddress, RawLocation, RawStructuredAddress};

/// Outcome of a resolution. Confidence and the review flag are explicit
/// parts of the result: a rule-derived city carries confidence 1.0, a failed
/// resolution carries 0.0 and is flagged for manual confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationResolution {
    pub location: String,
    pub city: String,
    pub confidence: f32,
    pub needs_confirmation: bool,
}

impl LocationResolution {
    fn resolved(location: String, city: String, confidence: f32) -> Self {
        Self {
            location,
            city,
            confidence,
            needs_confirmation: false,
        }
    }

    fn unresolved(location: String, confidence: f32) -> Self {
        Self {
            location,
            city: TBD.to_string(),
            confidence,
            needs_confirmation: true,
        }
    }
}

pub struct LocationResolver {
    ai: Option<Arc<dyn AiCapability>>,
}

impl LocationResolver {
    pub fn new(ai: Option<Arc<dyn AiCapability>>) -> Self {
        Self { ai }
    }

    /// Turns a raw location value plus the event's title/description into a
    /// final `(location, city, confidence)` tuple. Never fails: the worst
    /// case is city "TBD" with the confirmation flag set.
    pub async fn resolve(
        &self,
        raw: Option<&RawLocation>,
        title: &str,
        description: &str,
    ) -> LocationResolution {
        let location = display_location(raw);

        // Virtual events resolve immediately
        if is_virtual(&location) || title_mentions_virtual(title) {
            return LocationResolution::resolved(location, ONLINE.to_string(), 1.0);
        }

        // Structured address fields are the most reliable source
        if let Some(city) = structured_city(raw) {
            return LocationResolution::resolved(location, city, 1.0);
        }

        // Rule-based extraction from the location string
        if !is_placeholder(&location) {
            if let Some(city) = city_from_string(&location) {
                debug!("Rule-based city extraction: \"{location}\" -> \"{city}\"");
                return LocationResolution::resolved(location, city, 1.0);
            }
        }

        // Rule-based extraction from the title
        if let Some(city) = city_from_title(title) {
            debug!("Rule-based title city extraction: \"{title}\" -> \"{city}\"");
            return LocationResolution::resolved(location, city, 1.0);
        }

        // AI fallback, confidence-gated against the whitelist
        if let Some(ai) = &self.ai {
            let truncated: String = description
                .chars()
                .take(CITY_INFERENCE_DESCRIPTION_LIMIT)
                .collect();
            match ai.infer_city(title, &truncated).await {
                Ok(inference) => {
                    let city = inference.city.trim();
                    let accepted = inference.confidence >= CITY_CONFIDENCE_THRESHOLD
                        && (city.eq_ignore_ascii_case(ONLINE) || canonical_uk_city(city).is_some());
                    if accepted {
                        let city = if city.eq_ignore_ascii_case(ONLINE) {
                            ONLINE.to_string()
                        } else {
                            canonical_uk_city(city).unwrap()
                        };
                        return LocationResolution::resolved(location, city, inference.confidence);
                    }
                    debug!(
                        city = %inference.city,
                        confidence = inference.confidence,
                        "AI city inference below threshold or off-whitelist, keeping TBD"
                    );
                    return LocationResolution::unresolved(location, inference.confidence);
                }
                Err(e) => warn!("AI city inference failed: {e}"),
            }
        }

        LocationResolution::unresolved(location, 0.0)
    }
}

/// Free-text display string for the venue. Prefers a structured venue name
/// plus address parts; never blanked even when city resolution fails.
fn display_location(raw: Option<&RawLocation>) -> String {
    match raw {
        None => TBD.to_string(),
        Some(RawLocation::Text(s)) if s.trim().is_empty() => TBD.to_string(),
        Some(RawLocation::Text(s)) => s.trim().to_string(),
        Some(RawLocation::Venue(venue)) => {
            if venue
                .location_type
                .as_deref()
                .is_some_and(|t| t == "VirtualLocation")
            {
                return "Online Event".to_string();
            }
            let mut parts: Vec<String> = Vec::new();
            if let Some(name) = venue.name.as_deref().filter(|n| !n.trim().is_empty()) {
                parts.push(name.trim().to_string());
            }
            match &venue.address {
                Some(RawAddress::Text(addr)) if !addr.trim().is_empty() => {
                    parts.push(addr.trim().to_string());
                }
                Some(RawAddress::Structured(addr)) => {
                    for field in [
                        addr.street_address.as_deref(),
                        addr.address_locality.as_deref(),
                        addr.address_region.as_deref(),
                        addr.postal_code.as_deref(),
                    ]
                    .into_iter()
                    .flatten()
                    {
                        if !field.trim().is_empty() {
                            parts.push(field.trim().to_string());
                        }
                    }
                }
                _ => {}
            }
            // drop duplicate segments so "Location, London, London" collapses
            let mut unique: Vec<String> = Vec::new();
            for part in parts {
                if !unique.iter().any(|u| u.eq_ignore_ascii_case(&part)) {
                    unique.push(part);
                }
            }
            if unique.is_empty() {
                TBD.to_string()
            } else {
                unique.join(", ")
            }
        }
    }
}

/// City straight out of a structured address, in order of reliability.
fn structured_city(raw: Option<&RawLocation>) -> Option<String> {
    let Some(RawLocation::Venue(venue)) = raw else {
        return None;
    };
    let Some(RawAddress::Structured(addr)) = &venue.address else {
        return None;
    };
    let RawStructuredAddress {
        address_locality,
        city,
        address_region,
        ..
    } = addr;
    for candidate in [address_locality, city, address_region].into_iter().flatten() {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !is_placeholder(candidate) {
            return Some(candidate.to_string());
        }
    }
    None
}

/// True for location strings that carry no venue information ("TBD",
/// "register to see address", ...). A placeholder is never a city candidate.
pub fn is_placeholder(location: &str) -> bool {
    if location.trim().is_empty() {
        return true;
    }
    let normalized = location.to_lowercase();
    PLACEHOLDER_LOCATION_PHRASES
        .iter()
        .any(|phrase| normalized.contains(phrase))
}

fn is_virtual(location: &str) -> bool {
    let normalized = location.to_lowercase();
    normalized.contains("online") || normalized.contains("virtual")
}

fn title_mentions_virtual(title: &str) -> bool {
    let normalized = title.to_lowercase();
    normalized.contains("online") || normalized.contains("virtual") || normalized.contains("remote")
}

static UK_POSTCODE_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    // ", <City> <outward-code> [inward-code]" address tails
    Regex::new(r",\s*([A-Za-z][A-Za-z' ]{2,19})\s+[A-Z]{1,2}[0-9][0-9A-Z]?(?:\s*[0-9][A-Z]{2})?\b")
        .unwrap()
});

/// Rule-based city extraction from a free-form location string.
pub fn city_from_string(location: &str) -> Option<String> {
    if is_placeholder(location) {
        return None;
    }

    // direct whitelist substring match
    let normalized = location.to_lowercase();
    for city in UK_CITIES {
        if normalized.contains(&city.to_lowercase()) {
            return Some((*city).to_string());
        }
    }

    // ", <City> <postcode>" address segment
    if let Some(caps) = UK_POSTCODE_SEGMENT.captures(location) {
        let candidate = caps[1].trim().to_string();
        if !candidate.is_empty() {
            return Some(candidate);
        }
    }

    // comma-segment heuristic: prefer a middle-length segment that is not
    // purely numeric and not street-like
    let parts: Vec<String> = location
        .split(',')
        .map(|p| {
            p.chars()
                .filter(|c| c.is_alphanumeric() || c.is_whitespace())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect();

    for part in &parts {
        if (3..=20).contains(&part.len())
            && !part.chars().all(|c| c.is_ascii_digit())
            && !part.contains("Street")
            && !part.contains("Road")
        {
            return Some(part.clone());
        }
    }

    parts
        .into_iter()
        .filter(|p| (3..=20).contains(&p.len()) && !p.chars().all(|c| c.is_ascii_digit()))
        .last()
}

static UK_TITLE_CITY: Lazy<Regex> = Lazy::new(|| city_alternation(UK_CITIES));
static INTL_TITLE_CITY: Lazy<Regex> = Lazy::new(|| city_alternation(INTERNATIONAL_CITIES));

fn city_alternation(cities: &[&str]) -> Regex {
    let alternation = cities
        .iter()
        .map(|c| regex::escape(c).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b({alternation})\b"))
        .case_insensitive(true)
        .build()
        .unwrap()
}

/// Rule-based city extraction from an event title: whole-word whitelist
/// matches only, to avoid false positives from venue-like words.
pub fn city_from_title(title: &str) -> Option<String> {
    if title.trim().is_empty() {
        return None;
    }
    if title_mentions_virtual(title) {
        return Some(ONLINE.to_string());
    }
    if let Some(m) = UK_TITLE_CITY.find(title) {
        return canonical_uk_city(m.as_str());
    }
    if let Some(m) = INTL_TITLE_CITY.find(title) {
        let matched = collapse_spaces(m.as_str());
        return INTERNATIONAL_CITIES
            .iter()
            .find(|c| c.eq_ignore_ascii_case(&matched))
            .map(|c| (*c).to_string());
    }
    None
}

/// First whole-word UK city mention anywhere in a blob of text. Used to
/// salvage a city from pages that hide their structured location data.
pub fn find_uk_city_mention(text: &str) -> Option<String> {
    UK_TITLE_CITY
        .find(text)
        .and_then(|m| canonical_uk_city(m.as_str()))
}

/// Canonical capitalization for a whitelisted UK city, or `None` when the
/// candidate is off-whitelist.
pub fn canonical_uk_city(candidate: &str) -> Option<String> {
    let candidate = collapse_spaces(candidate);
    UK_CITIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(&candidate))
        .map(|c| (*c).to_string())
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLACEHOLDER_LOCATION_PHRASES;

    #[test]
    fn placeholders_are_never_cities() {
        for phrase in PLACEHOLDER_LOCATION_PHRASES {
            assert!(is_placeholder(phrase), "{phrase} should be a placeholder");
            assert_eq!(city_from_string(phrase), None);
        }
    }

    #[test]
    fn whitelist_substring_match_wins() {
        assert_eq!(
            city_from_string("Science Creates, Bristol"),
            Some("Bristol".to_string())
        );
        assert_eq!(
            city_from_string("The Royal Society, London"),
            Some("London".to_string())
        );
    }

    #[test]
    fn postcode_segment_yields_city() {
        assert_eq!(
            city_from_string("Unit 5, Hamsterley Yard, Ouseburn NE1 2BE"),
            Some("Ouseburn".to_string())
        );
    }

    #[test]
    fn comma_heuristic_skips_numbers_and_streets() {
        assert_eq!(
            city_from_string("12345, High Street, Altrincham"),
            Some("Altrincham".to_string())
        );
    }

    #[test]
    fn title_extraction_is_whole_word() {
        assert_eq!(
            city_from_title("Nucleate Manchester Info Session"),
            Some("Manchester".to_string())
        );
        assert_eq!(city_from_title("Innovation Workshop"), None);
    }

    #[test]
    fn virtual_titles_resolve_online() {
        assert_eq!(
            city_from_title("Future of Healthcare (Online)"),
            Some("Online".to_string())
        );
    }

    #[test]
    fn international_titles_recognized() {
        assert_eq!(
            city_from_title("New York BioTech Mixer"),
            Some("New York".to_string())
        );
    }
}
