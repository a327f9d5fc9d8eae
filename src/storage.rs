use crate::error::{ImportError, Result};
use crate::types::StoredEvent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Storage trait for persisted event records.
///
/// The production deployment backs this with a hosted database; tests and
/// local runs use [`InMemoryEventStore`]. Duplicate lookup is an
/// OR-combination across URL and platform-id equality, matching the
/// `url == url OR luma_id == id OR eventbrite_id == id` filter the
/// duplicate guard needs.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: &mut StoredEvent) -> Result<Uuid>;
    async fn update_event(&self, event: &StoredEvent) -> Result<()>;
    async fn get_event(&self, id: Uuid) -> Result<Option<StoredEvent>>;
    async fn find_duplicate(
        &self,
        url: &str,
        platform_id: Option<&str>,
    ) -> Result<Option<StoredEvent>>;
}

/// In-memory storage implementation for development/testing.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Arc<Mutex<HashMap<Uuid, StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert_event(&self, event: &mut StoredEvent) -> Result<Uuid> {
        let id = Uuid::new_v4();
        event.id = Some(id);

        let mut events = self.events.lock().unwrap();
        events.insert(id, event.clone());

        debug!("Created event: {} with id {}", event.title, id);
        Ok(id)
    }

    async fn update_event(&self, event: &StoredEvent) -> Result<()> {
        let id = event
            .id
            .ok_or_else(|| ImportError::Store("cannot update an event without an id".into()))?;

        let mut events = self.events.lock().unwrap();
        if !events.contains_key(&id) {
            return Err(ImportError::Store(format!("no event with id {id}")));
        }
        events.insert(id, event.clone());

        debug!("Updated event: {} with id {}", event.title, id);
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<StoredEvent>> {
        let events = self.events.lock().unwrap();
        Ok(events.get(&id).cloned())
    }

    async fn find_duplicate(
        &self,
        url: &str,
        platform_id: Option<&str>,
    ) -> Result<Option<StoredEvent>> {
        let events = self.events.lock().unwrap();
        let found = events
            .values()
            .find(|e| {
                e.url == url
                    || (platform_id.is_some()
                        && (e.luma_id.as_deref() == platform_id
                            || e.eventbrite_id.as_deref() == platform_id))
            })
            .cloned();
        Ok(found)
    }
}
