//! Policy constants shared across the import pipeline.
//!
//! The city whitelists and the confidence threshold are deliberate policy
//! choices, not tuning knobs: tests assert on the exact values.

/// Minimum confidence at which an AI-inferred city is accepted. Anything
/// below leaves the city as "TBD" and flags the record for manual review.
pub const CITY_CONFIDENCE_THRESHOLD: f32 = 0.90;

/// Maximum number of description characters forwarded to the AI city
/// inference call.
pub const CITY_INFERENCE_DESCRIPTION_LIMIT: usize = 1200;

/// Sentinel for unknown cities, dates-to-be-announced times, and venues.
pub const TBD: &str = "TBD";

/// City value for virtual events.
pub const ONLINE: &str = "Online";

/// Fallback excitement hook used until (or in place of) AI summarization.
pub const DEFAULT_EXCITEMENT_HOOK: &str = "Join us for this exciting event";

/// UK cities recognized by the rule-based resolver and used to validate
/// AI-inferred results.
pub const UK_CITIES: &[&str] = &[
    "London",
    "Manchester",
    "Birmingham",
    "Leeds",
    "Liverpool",
    "Sheffield",
    "Bristol",
    "Glasgow",
    "Edinburgh",
    "Cardiff",
    "Newcastle",
    "Belfast",
    "Nottingham",
    "Southampton",
    "Oxford",
    "Cambridge",
    "Brighton",
    "Bath",
    "York",
    "Leicester",
    "Coventry",
    "Bradford",
    "Stoke-on-Trent",
    "Wolverhampton",
    "Plymouth",
    "Derby",
    "Reading",
    "Dudley",
    "Newport",
    "Preston",
    "Sunderland",
    "Norwich",
    "Walsall",
    "Bournemouth",
    "Southend",
    "Swindon",
    "Huddersfield",
    "Poole",
    "Middlesbrough",
    "Blackpool",
    "Oldham",
    "Bolton",
    "Ipswich",
    "West Bromwich",
    "Peterborough",
    "Stockport",
    "Gloucester",
    "Exeter",
    "Canterbury",
    "Lancaster",
    "Durham",
    "Chelmsford",
    "Chester",
    "St Albans",
    "Winchester",
    "Worcester",
    "Lincoln",
];

/// International cities recognized in event titles only. Title mentions are
/// reliable enough for these; free-form location strings are not.
pub const INTERNATIONAL_CITIES: &[&str] = &[
    "New York",
    "San Francisco",
    "Los Angeles",
    "Chicago",
    "Boston",
    "Seattle",
    "Toronto",
    "Vancouver",
    "Montreal",
    "Paris",
    "Berlin",
    "Amsterdam",
    "Dublin",
    "Copenhagen",
    "Stockholm",
    "Oslo",
    "Helsinki",
    "Zurich",
    "Geneva",
    "Milan",
    "Rome",
    "Madrid",
    "Barcelona",
    "Lisbon",
    "Vienna",
    "Prague",
    "Budapest",
    "Warsaw",
    "Brussels",
    "Luxembourg",
    "Singapore",
    "Hong Kong",
    "Tokyo",
    "Sydney",
    "Melbourne",
    "Auckland",
];

/// Location strings that carry no venue information. Matched
/// case-insensitively as substrings; a placeholder location is treated as
/// absent, never as a city candidate.
pub const PLACEHOLDER_LOCATION_PHRASES: &[&str] = &[
    "register to see",
    "register for details",
    "tbd",
    "to be determined",
    "to be announced",
    "coming soon",
    "details to follow",
    "venue tba",
    "location tba",
];

/// Boilerplate phrases that disqualify a DOM-scraped text candidate.
pub const SCRAPE_BOILERPLATE_PHRASES: &[&str] = &[
    "get on the list",
    "sign in",
    "log in",
    "cookie",
    "contact the host",
    "report event",
];

/// Suffix words that mark a capitalized phrase as an organisation name when
/// mining organizers out of free-text descriptions.
pub const ORGANIZATION_SUFFIXES: &[&str] = &[
    "Network",
    "Foundation",
    "Society",
    "Institute",
    "Association",
    "University",
    "Lab",
    "Labs",
    "Group",
    "Community",
];

/// Event types the AI classifier may return. Anything else is coerced to
/// "Other".
pub const EVENT_TYPES: &[&str] = &[
    "Meetup / Mixer",
    "Workshop",
    "Conference",
    "Lecture",
    "Panel Discussion",
    "Fireside Chat",
    "Webinar",
    "Hackathon",
    "Other",
];

/// Interest areas the AI classifier may return; unknown areas are dropped.
pub const INTEREST_AREAS: &[&str] = &[
    "Biotechnology & Synthetic Biology",
    "Genetics & Genomics",
    "Healthcare & Medicine",
    "Longevity & Aging",
    "Biosecurity & Biodefense",
    "Neuroscience",
    "Materials Science & Engineering",
    "Quantum Computing",
    "Robotics & AI",
    "Nanotechnology",
    "Space & Astronomy",
    "Neurotechnology",
    "Climate & Atmospheric Science",
    "Renewable Energy",
    "Ocean & Marine Science",
    "Conservation Biology",
    "Agriculture & Food Systems",
    "Environmental Health",
    "Artificial Intelligence",
    "Machine Learning",
    "Bioinformatics",
    "Chemoinformatics",
    "High-Performance Computing",
    "Data Analytics",
    "Natural Language Processing",
    "Biochemistry",
    "Chemistry",
    "Physics",
    "Biology",
    "Mathematics",
    "Photonics",
    "Computer Vision",
];

/// Provenance category for records that came through a scraping strategy.
pub const CATEGORY_SCRAPED: &str = "Scraped";
/// Provenance category for records that came through a platform API.
pub const CATEGORY_IMPORTED: &str = "Imported";
