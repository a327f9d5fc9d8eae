//! DOM-selector scraping for platforms without structured data.
//!
//! Fields are pulled through a prioritized list of CSS selector candidates;
//! the first non-empty, plausible match wins. Plausibility is a minimum text
//! length plus an exclusion list of known boilerplate ("Get on the list",
//! cookie banners, host-contact links).

use scraper::{Html, Selector};
use tracing::debug;

use crate::constants::SCRAPE_BOILERPLATE_PHRASES;
use crate::platform::Platform;
use crate::types::{RawEventDescriptor, RawLocation, RawOrganizer};

/// Prioritized selector candidates per field.
struct SelectorSet {
    title: &'static [&'static str],
    location: &'static [&'static str],
    description: &'static [&'static str],
    organizer: &'static [&'static str],
}

/// Partiful markup carries no JSON-LD; these selectors track its page
/// structure and fall back to generic patterns.
static PARTIFUL_SELECTORS: SelectorSet = SelectorSet {
    title: &["h1 span", "h1", "[class*='EventName']", "title"],
    location: &["[class*='location']", "[class*='venue']", "address"],
    description: &[
        "[class*='description']",
        "[class*='about']",
        "section p",
        "main p",
    ],
    organizer: &["[class*='HostName']", "[class*='host'] [class*='name']", "[class*='host']"],
};

/// Generic selectors used when scraping is the last resort on platforms that
/// normally carry structured data (e.g. private Luma events).
static GENERIC_SELECTORS: SelectorSet = SelectorSet {
    title: &["h1", "[class*='title']", "title"],
    location: &["[class*='location']", "[class*='address']", "address"],
    description: &[
        "[class*='description']",
        "[class*='about']",
        "section p",
        "main p",
    ],
    organizer: &["[class*='host-name']", "[class*='organizer']", "[class*='host']"],
};

const MIN_TITLE_LEN: usize = 3;
const MIN_LOCATION_LEN: usize = 5;
const MIN_DESCRIPTION_LEN: usize = 50;
const MIN_ORGANIZER_LEN: usize = 3;

/// Extracts a raw descriptor from rendered HTML via per-field selector
/// candidates. `None` means not even a plausible title was found.
pub fn scrape(html: &str, platform: Platform) -> Option<RawEventDescriptor> {
    let document = Html::parse_document(html);
    let set = match platform {
        Platform::Partiful => &PARTIFUL_SELECTORS,
        _ => &GENERIC_SELECTORS,
    };

    let title = first_match(&document, set.title, MIN_TITLE_LEN)?;
    let description = first_match(&document, set.description, MIN_DESCRIPTION_LEN);
    let location = first_match(&document, set.location, MIN_LOCATION_LEN);
    let organizer = first_match(&document, set.organizer, MIN_ORGANIZER_LEN);
    let start_date = datetime_attribute(&document);

    debug!(
        title = %title,
        has_location = location.is_some(),
        has_start = start_date.is_some(),
        "DOM scrape produced a descriptor"
    );

    Some(RawEventDescriptor {
        name: Some(title),
        description,
        start_date,
        end_date: None,
        location: location.map(RawLocation::Text),
        organizer: organizer.map(RawOrganizer::Text),
        image: None,
        url: None,
    })
}

fn first_match(document: &Html, selectors: &[&str], min_len: usize) -> Option<String> {
    for selector_str in selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(_) => continue,
        };
        for element in document.select(&selector) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if plausible(&text, min_len) {
                return Some(text);
            }
        }
    }
    None
}

/// Machine-readable timestamps survive rendering as `datetime`/`data-date`
/// attributes even when the visible text is styled beyond recognition.
fn datetime_attribute(document: &Html) -> Option<String> {
    for selector_str in ["time[datetime]", "[data-date]"] {
        let selector = Selector::parse(selector_str).ok()?;
        for element in document.select(&selector) {
            let attr = element
                .value()
                .attr("datetime")
                .or_else(|| element.value().attr("data-date"));
            if let Some(value) = attr {
                if !value.trim().is_empty() {
                    return Some(value.trim().to_string());
                }
            }
        }
    }
    None
}

fn plausible(text: &str, min_len: usize) -> bool {
    if text.len() < min_len {
        return false;
    }
    let lowered = text.to_lowercase();
    !SCRAPE_BOILERPLATE_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrapes_partiful_style_page() {
        let html = r#"<html><body>
            <h1><span>Rooftop Synth Night</span></h1>
            <time datetime="2025-07-19T19:00:00.000Z">Sat, Jul 19</time>
            <div class="location-row">The Old Crown, Birmingham</div>
            <div class="description">Join us for an evening of modular synthesis,
            live patching and ambient sets from local artists. Doors at seven.</div>
            </body></html>"#;

        let descriptor = scrape(html, Platform::Partiful).expect("descriptor");
        assert_eq!(descriptor.name.as_deref(), Some("Rooftop Synth Night"));
        assert_eq!(
            descriptor.start_date.as_deref(),
            Some("2025-07-19T19:00:00.000Z")
        );
        assert!(matches!(
            descriptor.location,
            Some(RawLocation::Text(ref l)) if l.contains("Birmingham")
        ));
    }

    #[test]
    fn rejects_boilerplate_candidates() {
        let html = r#"<html><body>
            <h1>Get on the list</h1>
            <h1>Actual Event Name</h1>
            </body></html>"#;
        let descriptor = scrape(html, Platform::Partiful).expect("descriptor");
        assert_eq!(descriptor.name.as_deref(), Some("Actual Event Name"));
    }

    #[test]
    fn page_without_title_yields_none() {
        assert!(scrape("<html><body><p>hi</p></body></html>", Platform::Partiful).is_none());
    }
}
