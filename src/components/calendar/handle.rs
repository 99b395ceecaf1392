use super::actor::{CalendarActor, CalendarActorHandle};
use super::models::CalendarEvent;
use super::store::EventStore;
use crate::components::storage::EventPersistence;
use crate::error::{invalid_event_error, CalendarResult};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the calendar actor
#[derive(Clone)]
pub struct CalendarHandle {
    actor_handle: CalendarActorHandle,
    tz: Tz,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Restore the saved collection and spawn the actor that owns it
    pub async fn load(persistence: EventPersistence, tz: Tz) -> Self {
        let events = persistence.load().await;
        Self::spawn(EventStore::from_events(events, tz), persistence)
    }

    /// Spawn the actor around an already built store
    pub fn spawn(store: EventStore, persistence: EventPersistence) -> Self {
        let tz = *store.timezone();
        let (mut actor, handle) = CalendarActor::new(store, persistence);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            tz,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Timezone the calendar's local dates are computed in
    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub async fn create(&self, event: CalendarEvent) -> CalendarResult<CalendarEvent> {
        self.actor_handle.create(event).await
    }

    pub async fn update(&self, event: CalendarEvent) -> CalendarResult<bool> {
        self.actor_handle.update(event).await
    }

    pub async fn delete(&self, id: &str) -> CalendarResult<bool> {
        self.actor_handle.delete(id).await
    }

    pub async fn get(&self, id: &str) -> CalendarResult<Option<CalendarEvent>> {
        self.actor_handle.get(id).await
    }

    /// Events starting on `date`, earliest first
    pub async fn events_on(&self, date: NaiveDate) -> CalendarResult<Vec<CalendarEvent>> {
        self.actor_handle.events_on(date).await
    }

    /// Copy of every event in insertion order
    pub async fn snapshot(&self) -> CalendarResult<Vec<CalendarEvent>> {
        self.actor_handle.snapshot().await
    }

    /// Find the one event whose id is `id` or starts with it
    pub async fn resolve_id(&self, id: &str) -> CalendarResult<CalendarEvent> {
        let id = id.trim();
        if id.is_empty() {
            return Err(invalid_event_error("Event id must not be empty"));
        }
        if let Some(event) = self.get(id).await? {
            return Ok(event);
        }

        let mut matches: Vec<CalendarEvent> = self
            .snapshot()
            .await?
            .into_iter()
            .filter(|event| event.id.starts_with(id))
            .collect();
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(invalid_event_error(&format!("No event with id {}", id))),
            n => Err(invalid_event_error(&format!("Id prefix {} matches {} events", id, n))),
        }
    }

    /// Shutdown the actor once queued work is flushed
    pub async fn shutdown(&self) -> CalendarResult<()> {
        self.actor_handle.shutdown().await
    }
}
