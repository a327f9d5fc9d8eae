//! Import pipeline: coordinator, location resolution, and AI enrichment.

pub mod enrich;
pub mod import;
pub mod location;

pub use enrich::EnrichmentOrchestrator;
pub use import::{ImportCoordinator, ImportOutcome};
pub use location::{LocationResolution, LocationResolver};
