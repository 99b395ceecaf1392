use super::KeyValueStore;
use crate::components::calendar::models::CalendarEvent;
use crate::error::{CalendarResult, Error};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Load/save boundary for the event collection.
///
/// The whole collection lives as one JSON array under a single key.
#[derive(Clone)]
pub struct EventPersistence {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl EventPersistence {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key an unreadable blob is moved aside to
    pub fn corrupt_key(&self) -> String {
        format!("{}.corrupt", self.key)
    }

    /// Restore the collection. Never fails: an absent, unreadable or
    /// unparseable blob yields an empty collection.
    pub async fn load(&self) -> Vec<CalendarEvent> {
        let raw = match self.kv.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No saved events under '{}', starting empty", self.key);
                return Vec::new();
            }
            Err(Error::CorruptData(reason)) => {
                warn!("Saved events under '{}' are unreadable, starting empty: {}", self.key, reason);
                self.set_aside().await;
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read saved events, starting empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CalendarEvent>>(&raw) {
            Ok(events) => {
                info!("Loaded {} events from '{}'", events.len(), self.key);
                events
            }
            Err(e) => {
                warn!("Saved events under '{}' are corrupt, starting empty: {}", self.key, e);
                self.set_aside().await;
                Vec::new()
            }
        }
    }

    /// Move the raw blob to the corrupt key so the next save does not destroy it
    async fn set_aside(&self) {
        let corrupt_key = self.corrupt_key();
        match self.kv.rename(&self.key, &corrupt_key).await {
            Ok(()) => info!("Kept the unreadable blob under '{}'", corrupt_key),
            Err(e) => error!("Failed to preserve corrupt event blob: {}", e),
        }
    }

    /// Replace the stored collection
    pub async fn save(&self, events: &[CalendarEvent]) -> CalendarResult<()> {
        let blob = serde_json::to_string(events)?;
        self.kv.set(&self.key, &blob).await
    }
}
