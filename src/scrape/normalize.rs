//! Uniform normalization of raw event descriptors, regardless of which
//! strategy produced them. This is the single translation layer out of the
//! untyped upstream boundary.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Europe::London;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{CATEGORY_IMPORTED, CATEGORY_SCRAPED, ORGANIZATION_SUFFIXES, TBD};
use crate::pipeline::location::LocationResolver;
use crate::platform::Platform;
use crate::types::{NormalizedEventDraft, RawEventDescriptor, RawOrganizer};

/// Which path produced the raw data; drives provenance categories and the
/// platform tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Api,
    Scraped,
}

/// Maps a raw descriptor into a normalized draft. Location/city resolution
/// runs as part of the mapping; it never fails the import.
pub async fn to_draft(
    descriptor: &RawEventDescriptor,
    event_url: &str,
    platform: Platform,
    provenance: Provenance,
    resolver: &LocationResolver,
) -> NormalizedEventDraft {
    let title = descriptor
        .name
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled Event")
        .to_string();
    let description = descriptor
        .description
        .as_deref()
        .map(clean_description)
        .unwrap_or_default();

    let (date, time) = derive_date_time(
        descriptor.start_date.as_deref(),
        descriptor.end_date.as_deref(),
    );

    let resolution = resolver
        .resolve(descriptor.location.as_ref(), &title, &description)
        .await;

    let organizer = derive_organizer(descriptor, &description, platform, provenance);

    let (platform_tag, categories) = match provenance {
        Provenance::Api => (platform.api_tag(), vec![CATEGORY_IMPORTED.to_string()]),
        Provenance::Scraped => (platform.scraped_tag(), vec![CATEGORY_SCRAPED.to_string()]),
    };

    NormalizedEventDraft {
        title,
        description,
        date,
        time,
        location: resolution.location,
        city: resolution.city,
        city_confidence: resolution.confidence,
        needs_city_confirmation: resolution.needs_confirmation,
        organizer,
        url: event_url.to_string(),
        image_url: descriptor
            .image
            .as_ref()
            .and_then(|i| i.first())
            .map(|s| s.to_string()),
        categories,
        platform_id: None,
        platform_tag: platform_tag.to_string(),
    }
}

/// Derives the ISO calendar date and a display time range in UK time.
///
/// Falls back to today's date and "TBD" when the start timestamp is missing
/// or unparseable, keeping the draft's date invariant.
pub fn derive_date_time(start: Option<&str>, end: Option<&str>) -> (NaiveDate, String) {
    let start_local = start.and_then(parse_timestamp);
    let end_local = end.and_then(parse_timestamp);

    match start_local {
        Some(start_dt) => {
            let date = start_dt.date_naive();
            let time = match end_local {
                Some(end_dt) => format!("{} - {}", format_time(&start_dt), format_time(&end_dt)),
                None => format_time(&start_dt),
            };
            (date, time)
        }
        None => (Utc::now().with_timezone(&London).date_naive(), TBD.to_string()),
    }
}

/// Parses an upstream timestamp into UK local time. RFC 3339 first;
/// offset-less timestamps are treated as UK wall time; a bare date renders
/// as midnight.
fn parse_timestamp(raw: &str) -> Option<DateTime<chrono_tz::Tz>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&London));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return London.from_local_datetime(&naive).single();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return London
            .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .single();
    }
    None
}

fn format_time(dt: &DateTime<chrono_tz::Tz>) -> String {
    // 12-hour clock without a leading zero: "7:00 PM"
    dt.format("%-I:%M %p").to_string()
}

static ORGANIZED_BY: Lazy<Regex> = Lazy::new(|| {
    // verb is case-insensitive, the captured name must stay capitalized
    Regex::new(
        r"(?i:organi[sz]ed|hosted|presented)\s+(?i:by)[:\s]+([A-Z][\w&'’-]*(?:\s+(?:[A-Z][\w&'’-]*|of|the|and|for)){0,5})",
    )
    .unwrap()
});

static ORG_SUFFIX_PHRASE: Lazy<Regex> = Lazy::new(|| {
    let suffixes = ORGANIZATION_SUFFIXES.join("|");
    Regex::new(&format!(r"\b((?:[A-Z][\w&'’-]*\s+){{1,4}}(?:{suffixes}))\b")).unwrap()
});

/// Connector words allowed mid-name but meaningless at the end.
const TRAILING_CONNECTORS: &[&str] = &["of", "the", "and", "for"];

/// Organizer derivation: explicit structured names first, free-text pattern
/// mining second, platform placeholder last.
fn derive_organizer(
    descriptor: &RawEventDescriptor,
    description: &str,
    platform: Platform,
    provenance: Provenance,
) -> String {
    if let Some(name) = structured_organizer(descriptor.organizer.as_ref()) {
        return name;
    }
    if let Some(name) = organizer_from_text(description) {
        return name;
    }
    match (platform, provenance) {
        (Platform::Luma, Provenance::Scraped) => "Luma Event".to_string(),
        (Platform::Eventbrite, _) => "Eventbrite Event".to_string(),
        _ => "Organising Team".to_string(),
    }
}

fn structured_organizer(organizer: Option<&RawOrganizer>) -> Option<String> {
    let joined = match organizer? {
        RawOrganizer::Text(name) => name.trim().to_string(),
        RawOrganizer::One(entry) => entry.name.as_deref().unwrap_or("").trim().to_string(),
        RawOrganizer::Many(entries) => entries
            .iter()
            .filter_map(|e| e.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    };
    (!joined.is_empty()).then_some(joined)
}

/// Mines an organizer name out of free text: "hosted by X" patterns, then
/// capitalized phrases ending in an organisation-type word.
pub fn organizer_from_text(text: &str) -> Option<String> {
    if let Some(caps) = ORGANIZED_BY.captures(text) {
        let name = strip_trailing_connectors(caps[1].trim().trim_end_matches(['.', ',']));
        if name.len() > 2 {
            return Some(name);
        }
    }
    if let Some(caps) = ORG_SUFFIX_PHRASE.captures(text) {
        let name = caps[1].trim().to_string();
        if name.len() > 2 {
            return Some(name);
        }
    }
    None
}

fn strip_trailing_connectors(name: &str) -> String {
    let mut words: Vec<&str> = name.split_whitespace().collect();
    while let Some(last) = words.last() {
        if TRAILING_CONNECTORS.contains(&last.to_lowercase().as_str()) {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ")
}

/// Strips markup from descriptions that arrive as HTML and decodes the
/// common entities.
fn clean_description(raw: &str) -> String {
    if !raw.contains('<') {
        return raw.trim().to_string();
    }
    static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
    static BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(?:br\s*/?|/p)>").unwrap());
    let text = BREAK.replace_all(raw, "\n");
    let text = TAG.replace_all(&text, "");
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_uk_time_range() {
        let (date, time) = derive_date_time(
            Some("2025-06-12T18:00:00+01:00"),
            Some("2025-06-12T21:30:00+01:00"),
        );
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());
        assert_eq!(time, "6:00 PM - 9:30 PM");
    }

    #[test]
    fn utc_timestamps_render_in_london_time() {
        // 18:00 UTC in June is 19:00 in London
        let (_, time) = derive_date_time(Some("2025-06-12T18:00:00Z"), None);
        assert_eq!(time, "7:00 PM");
    }

    #[test]
    fn missing_start_defaults_to_today_and_tbd() {
        let (date, time) = derive_date_time(None, None);
        assert_eq!(date, Utc::now().with_timezone(&London).date_naive());
        assert_eq!(time, "TBD");
        let (_, time) = derive_date_time(Some("sometime soon"), None);
        assert_eq!(time, "TBD");
    }

    #[test]
    fn mines_hosted_by_pattern() {
        assert_eq!(
            organizer_from_text("An evening of talks hosted by Nucleate Manchester. Doors at 6."),
            Some("Nucleate Manchester".to_string())
        );
        assert_eq!(
            organizer_from_text("Organised by The Alan Turing Institute for everyone."),
            Some("The Alan Turing Institute".to_string())
        );
    }

    #[test]
    fn mines_organization_suffix_phrase() {
        assert_eq!(
            organizer_from_text("Come along and meet the Oxford Biotech Network at our mixer."),
            Some("Oxford Biotech Network".to_string())
        );
    }

    #[test]
    fn no_organizer_in_plain_text() {
        assert_eq!(organizer_from_text("Just a fun evening of talks."), None);
    }

    #[test]
    fn strips_html_descriptions() {
        let cleaned = clean_description("<p>First line</p><p>Second &amp; third</p>");
        assert!(cleaned.contains("First line"));
        assert!(cleaned.contains("Second & third"));
        assert!(!cleaned.contains('<'));
    }
}
