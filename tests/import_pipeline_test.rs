use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use event_importer::ai::{AiCapability, CityInference, Classification, Summary};
use event_importer::error::{ImportError, Result};
use event_importer::pipeline::enrich::EnrichmentOrchestrator;
use event_importer::pipeline::{ImportCoordinator, LocationResolver};
use event_importer::scrape::fetch::PageFetcher;
use event_importer::scrape::render::PageRenderer;
use event_importer::scrape::FetchStrategyChain;
use event_importer::storage::{EventStore, InMemoryEventStore};
use event_importer::types::{ImportRequest, StoredEvent};
use event_importer::Platform;

/// Serves canned HTML per URL; errors for anything unknown.
struct FakeFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ImportError::Api {
                message: format!("no canned page for {url}"),
            })
    }
}

/// Canned renderer; defaults to "no browser available".
struct FakeRenderer {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ImportError::Render("no browser available".to_string()))
    }
}

/// Configurable AI fake that counts calls per capability.
#[derive(Default)]
struct FakeAi {
    city: Option<(String, f32)>,
    classify_fails: bool,
    infer_city_calls: AtomicUsize,
    classify_calls: AtomicUsize,
}

#[async_trait]
impl AiCapability for FakeAi {
    async fn classify(&self, _title: &str, _description: &str) -> Result<Classification> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        if self.classify_fails {
            return Err(ImportError::Api {
                message: "model unavailable".to_string(),
            });
        }
        Ok(Classification {
            event_type: "Workshop".to_string(),
            interest_areas: vec!["Artificial Intelligence".to_string()],
        })
    }

    async fn summarize(&self, _title: &str, description: &str) -> Result<Summary> {
        Ok(Summary {
            summary: format!("Summary: {}", &description[..description.len().min(40)]),
            technical_keywords: vec!["synthetic biology".to_string()],
            excitement_hook: "A night not to miss".to_string(),
        })
    }

    async fn infer_city(&self, _title: &str, _description: &str) -> Result<CityInference> {
        self.infer_city_calls.fetch_add(1, Ordering::SeqCst);
        match &self.city {
            Some((city, confidence)) => Ok(CityInference {
                city: city.clone(),
                confidence: *confidence,
            }),
            None => Err(ImportError::Api {
                message: "no inference configured".to_string(),
            }),
        }
    }
}

fn luma_jsonld_page() -> String {
    r#"<html><head><script type="application/ld+json">
    {"@context":"https://schema.org","@type":"Event","name":"Bristol BioTech Social",
     "startDate":"2025-09-04T18:00:00+01:00","endDate":"2025-09-04T21:00:00+01:00",
     "description":"An evening of talks and demos from local founders.",
     "location":{"@type":"Place","name":"Science Creates",
       "address":{"@type":"PostalAddress","streetAddress":"Albert Road",
                  "addressLocality":"Bristol","postalCode":"BS2 0XJ"}},
     "organizer":[{"@type":"Organization","name":"Science Creates"}],
     "image":["https://img.example/cover.jpg"]}
    </script></head><body></body></html>"#
        .to_string()
}

fn coordinator_with(
    fetch_pages: HashMap<String, String>,
    render_pages: HashMap<String, String>,
    ai: Option<Arc<dyn AiCapability>>,
) -> (Arc<InMemoryEventStore>, ImportCoordinator) {
    let store = Arc::new(InMemoryEventStore::new());
    let store_dyn: Arc<dyn EventStore> = store.clone();

    let chain = FetchStrategyChain::with_parts(
        None,
        None,
        Arc::new(FakeFetcher { pages: fetch_pages }),
        Arc::new(FakeRenderer {
            pages: render_pages,
        }),
        LocationResolver::new(ai.clone()),
    );
    let enricher = Arc::new(EnrichmentOrchestrator::new(store_dyn.clone(), ai));
    let coordinator = ImportCoordinator::new(store_dyn, chain, enricher);
    (store, coordinator)
}

fn request(url: &str) -> ImportRequest {
    ImportRequest {
        url: url.to_string(),
        force_update: false,
    }
}

#[tokio::test]
async fn imports_luma_event_from_json_ld() {
    let url = "https://lu.ma/abc123";
    let pages = HashMap::from([(url.to_string(), luma_jsonld_page())]);
    let (store, coordinator) = coordinator_with(pages, HashMap::new(), None);

    let outcome = coordinator
        .import_progressive(request(url))
        .await
        .expect("import should succeed");

    let event = outcome.event;
    assert_eq!(event.title, "Bristol BioTech Social");
    assert_eq!(event.city, "Bristol");
    assert_eq!(event.platform, "luma-scraped");
    assert_eq!(event.luma_id.as_deref(), Some("abc123"));
    assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 9, 4).unwrap());
    assert_eq!(event.time, "6:00 PM - 9:00 PM");
    assert_eq!(event.organizer, "Science Creates");
    assert_eq!(event.categories, vec!["Scraped".to_string()]);
    assert_eq!(event.image_url.as_deref(), Some("https://img.example/cover.jpg"));
    assert!(!event.needs_city_confirmation);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn extracts_eventbrite_id_from_ticket_url() {
    let url = "https://www.eventbrite.com/e/ai-safety-summit-tickets-123456789";
    let page = r#"<script type="application/ld+json">
        {"@type":"Event","name":"AI Safety Summit","startDate":"2025-10-01T09:00:00+01:00",
         "location":{"@type":"Place","name":"The Exchange",
           "address":{"@type":"PostalAddress","addressLocality":"Manchester"}}}
        </script>"#;
    let pages = HashMap::from([(url.to_string(), page.to_string())]);
    let (_, coordinator) = coordinator_with(pages, HashMap::new(), None);

    let outcome = coordinator
        .import_progressive(request(url))
        .await
        .expect("import should succeed");

    assert_eq!(outcome.event.eventbrite_id.as_deref(), Some("123456789"));
    assert_eq!(outcome.event.platform, "eventbrite-scraped");
    assert_eq!(outcome.event.city, "Manchester");
}

#[tokio::test]
async fn second_import_is_rejected_as_duplicate() {
    let url = "https://lu.ma/abc123";
    let pages = HashMap::from([(url.to_string(), luma_jsonld_page())]);
    let (store, coordinator) = coordinator_with(pages, HashMap::new(), None);

    coordinator
        .import_progressive(request(url))
        .await
        .expect("first import should succeed");

    let err = coordinator
        .import_progressive(request(url))
        .await
        .expect_err("second import should fail");

    match &err {
        ImportError::AlreadyImported { title } => assert_eq!(title, "Bristol BioTech Social"),
        other => panic!("expected AlreadyImported, got {other:?}"),
    }
    assert!(err.user_message().contains("already been imported"));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn force_update_preserves_identity_and_counters() {
    let url = "https://lu.ma/abc123";
    let pages = HashMap::from([(url.to_string(), luma_jsonld_page())]);
    let (store, coordinator) = coordinator_with(pages, HashMap::new(), None);

    let first = coordinator
        .import_progressive(request(url))
        .await
        .expect("first import should succeed");
    let id = first.event.id.expect("persisted id");

    // simulate accumulated engagement before the re-import
    let mut engaged = store.get_event(id).await.unwrap().unwrap();
    engaged.view_count = 7;
    engaged.click_count = 3;
    store.update_event(&engaged).await.unwrap();

    let second = coordinator
        .import_progressive(ImportRequest {
            url: url.to_string(),
            force_update: true,
        })
        .await
        .expect("force update should succeed");

    assert_eq!(second.event.id, Some(id));
    assert_eq!(second.event.view_count, 7);
    assert_eq!(second.event.click_count, 3);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn low_confidence_city_inference_is_rejected() {
    let url = "https://lu.ma/mystery";
    // placeholder location and a cityless title force the AI fallback
    let page = r#"<script type="application/ld+json">
        {"@type":"Event","name":"Quarterly Community Gathering",
         "startDate":"2025-11-12T18:30:00Z","location":"Venue TBA",
         "description":"An evening for members across the region."}
        </script>"#;
    let pages = HashMap::from([(url.to_string(), page.to_string())]);

    let ai = Arc::new(FakeAi {
        city: Some(("Bristol".to_string(), 0.85)),
        ..Default::default()
    });
    let (_, coordinator) = coordinator_with(pages.clone(), HashMap::new(), Some(ai));

    let outcome = coordinator
        .import_progressive(request(url))
        .await
        .expect("import should succeed");
    assert_eq!(outcome.event.city, "TBD");
    assert!(outcome.event.needs_city_confirmation);
    assert!((outcome.event.city_confidence - 0.85).abs() < f32::EPSILON);

    // same page, confident inference: the whitelisted city is accepted
    let ai = Arc::new(FakeAi {
        city: Some(("Bristol".to_string(), 0.95)),
        ..Default::default()
    });
    let (_, coordinator) = coordinator_with(pages, HashMap::new(), Some(ai));

    let outcome = coordinator
        .import_progressive(request(url))
        .await
        .expect("import should succeed");
    assert_eq!(outcome.event.city, "Bristol");
    assert!(!outcome.event.needs_city_confirmation);
}

#[tokio::test]
async fn title_city_extraction_never_calls_ai() {
    let url = "https://lu.ma/nucleate";
    let page = r#"<script type="application/ld+json">
        {"@type":"Event","name":"Nucleate Manchester Info Session",
         "startDate":"2025-10-20T18:00:00+01:00",
         "description":"Learn about the programme and meet the team."}
        </script>"#;
    let pages = HashMap::from([(url.to_string(), page.to_string())]);

    let ai = Arc::new(FakeAi {
        city: Some(("London".to_string(), 0.99)),
        ..Default::default()
    });
    let (_, coordinator) = coordinator_with(pages, HashMap::new(), Some(ai.clone()));

    let outcome = coordinator
        .import_progressive(request(url))
        .await
        .expect("import should succeed");

    assert_eq!(outcome.event.city, "Manchester");
    assert_eq!(ai.infer_city_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn partiful_events_are_scraped_from_rendered_dom() {
    let url = "https://partiful.com/e/xyz789";
    let rendered = r#"<html><body>
        <h1><span>Rooftop Synth Night</span></h1>
        <time datetime="2025-07-19T19:00:00.000Z">Sat, Jul 19</time>
        <div class="location-row">The Old Crown, Birmingham</div>
        <div class="description">An evening of modular synthesis, live patching
        and ambient sets from local artists. Doors at seven sharp.</div>
        </body></html>"#;
    let render_pages = HashMap::from([(url.to_string(), rendered.to_string())]);
    let (_, coordinator) = coordinator_with(HashMap::new(), render_pages, None);

    let outcome = coordinator
        .import_progressive(request(url))
        .await
        .expect("import should succeed");

    assert_eq!(outcome.event.title, "Rooftop Synth Night");
    assert_eq!(outcome.event.platform, "partiful-scraped");
    assert_eq!(outcome.event.city, "Birmingham");
    assert_eq!(
        outcome.event.date,
        NaiveDate::from_ymd_opt(2025, 7, 19).unwrap()
    );
}

#[tokio::test]
async fn unsupported_and_invalid_urls_fail_distinctly() {
    let (_, coordinator) = coordinator_with(HashMap::new(), HashMap::new(), None);

    let unsupported = coordinator
        .import_progressive(request("https://example.com/events/1"))
        .await
        .expect_err("unknown host should fail");
    assert!(matches!(unsupported, ImportError::UnsupportedPlatform { .. }));
    assert!(unsupported.user_message().contains("Unsupported URL"));

    let invalid = coordinator
        .import_progressive(request("https://www.eventbrite.com/d/"))
        .await
        .expect_err("missing id should fail");
    assert!(matches!(invalid, ImportError::InvalidUrlFormat { .. }));
    assert!(invalid.user_message().contains("Invalid Eventbrite URL"));
}

#[tokio::test]
async fn exhausted_strategies_surface_user_safe_failure() {
    let (store, coordinator) = coordinator_with(HashMap::new(), HashMap::new(), None);

    let err = coordinator
        .import_progressive(request("https://lu.ma/ghost"))
        .await
        .expect_err("all strategies should fail");

    assert!(matches!(err, ImportError::FetchExhausted { .. }));
    let message = err.user_message();
    assert!(message.contains("Both API and scraper methods failed"));
    assert!(!message.contains("no canned page"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn categorization_degrades_gracefully_when_ai_throws() {
    let store = Arc::new(InMemoryEventStore::new());
    let store_dyn: Arc<dyn EventStore> = store.clone();

    let draft = event_importer::types::NormalizedEventDraft {
        title: "Genomics Workshop".to_string(),
        description: "Hands-on sequencing session.".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
        time: "6:00 PM".to_string(),
        location: "The Lab".to_string(),
        city: "Leeds".to_string(),
        city_confidence: 1.0,
        needs_city_confirmation: false,
        organizer: "Organising Team".to_string(),
        url: "https://lu.ma/genomics".to_string(),
        image_url: None,
        categories: vec!["Scraped".to_string()],
        platform_id: Some("genomics".to_string()),
        platform_tag: "luma-scraped".to_string(),
    };
    let mut event = StoredEvent::from_draft(&draft, Platform::Luma);
    let id = store.insert_event(&mut event).await.unwrap();

    let ai = Arc::new(FakeAi {
        classify_fails: true,
        ..Default::default()
    });
    let orchestrator = EnrichmentOrchestrator::new(store_dyn, Some(ai));

    let categorized = orchestrator
        .categorize(id)
        .await
        .expect("categorize must not propagate AI errors");

    assert_eq!(categorized.ai.ai_event_type, "Other");
    assert!(categorized.ai.ai_interest_areas.is_empty());
    assert!(!categorized.ai.ai_categorized);
    assert!(categorized.ai.ai_categorized_at.is_some());
}

#[tokio::test]
async fn enrichment_stages_are_independently_persistable() {
    let store = Arc::new(InMemoryEventStore::new());
    let store_dyn: Arc<dyn EventStore> = store.clone();

    let draft = event_importer::types::NormalizedEventDraft {
        title: "Quantum Computing Evening".to_string(),
        description: "Talks on error correction and photonic hardware.".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 9, 4).unwrap(),
        time: "6:00 PM - 9:00 PM".to_string(),
        location: "Science Creates, Bristol".to_string(),
        city: "Bristol".to_string(),
        city_confidence: 1.0,
        needs_city_confirmation: false,
        organizer: "Science Creates".to_string(),
        url: "https://lu.ma/quantum".to_string(),
        image_url: None,
        categories: vec!["Scraped".to_string()],
        platform_id: Some("quantum".to_string()),
        platform_tag: "luma-scraped".to_string(),
    };
    let mut event = StoredEvent::from_draft(&draft, Platform::Luma);
    let id = store.insert_event(&mut event).await.unwrap();

    let ai = Arc::new(FakeAi::default());
    let enricher = EnrichmentOrchestrator::new(store_dyn, Some(ai));

    // stage 1 only
    let after_stage1 = enricher.categorize(id).await.unwrap();
    assert!(after_stage1.ai.ai_categorized);
    assert!(!after_stage1.ai.ai_summarized);
    assert_eq!(after_stage1.ai.ai_event_type, "Workshop");

    // stage 2 persists independently on top
    let after_stage2 = enricher.summarize(id).await.unwrap();
    assert!(after_stage2.ai.ai_categorized);
    assert!(after_stage2.ai.ai_summarized);
    assert!(after_stage2.ai.ai_summary.starts_with("Summary:"));
    assert_eq!(after_stage2.ai.ai_excitement_hook, "A night not to miss");
}
