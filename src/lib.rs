pub mod ai;
pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod platform;
pub mod scrape;
pub mod server;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ImportError, Result};
pub use pipeline::{ImportCoordinator, ImportOutcome};
pub use platform::Platform;
pub use storage::{EventStore, InMemoryEventStore};
pub use types::{ImportRequest, NormalizedEventDraft, StoredEvent};
