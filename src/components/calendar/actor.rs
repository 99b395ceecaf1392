use super::models::CalendarEvent;
use super::store::EventStore;
use crate::components::storage::EventPersistence;
use crate::error::{actor_error, CalendarResult};
use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// The calendar actor: sole owner and writer of the event store
pub struct CalendarActor {
    store: EventStore,
    persistence: EventPersistence,
    command_rx: mpsc::Receiver<CalendarCommand>,
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    Create(CalendarEvent, mpsc::Sender<CalendarResult<CalendarEvent>>),
    Update(CalendarEvent, mpsc::Sender<CalendarResult<bool>>),
    Delete(String, mpsc::Sender<CalendarResult<bool>>),
    Get(String, mpsc::Sender<Option<CalendarEvent>>),
    EventsOn(NaiveDate, mpsc::Sender<Vec<CalendarEvent>>),
    Snapshot(mpsc::Sender<Vec<CalendarEvent>>),
    /// Acknowledged after everything queued before it was handled
    Shutdown(mpsc::Sender<()>),
}

/// Handle for communicating with the calendar actor
#[derive(Clone)]
pub struct CalendarActorHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
}

impl CalendarActorHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<T>) -> CalendarCommand,
    ) -> CalendarResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|e| actor_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| actor_error("Response channel closed"))
    }

    /// Add an event, returning it as stored
    pub async fn create(&self, event: CalendarEvent) -> CalendarResult<CalendarEvent> {
        self.request(|tx| CalendarCommand::Create(event, tx)).await?
    }

    /// Replace an event by identity, `false` when the id is unknown
    pub async fn update(&self, event: CalendarEvent) -> CalendarResult<bool> {
        self.request(|tx| CalendarCommand::Update(event, tx)).await?
    }

    /// Delete an event by identity, `false` when the id is unknown
    pub async fn delete(&self, id: &str) -> CalendarResult<bool> {
        let id = id.to_string();
        self.request(|tx| CalendarCommand::Delete(id, tx)).await?
    }

    pub async fn get(&self, id: &str) -> CalendarResult<Option<CalendarEvent>> {
        let id = id.to_string();
        self.request(|tx| CalendarCommand::Get(id, tx)).await
    }

    pub async fn events_on(&self, date: NaiveDate) -> CalendarResult<Vec<CalendarEvent>> {
        self.request(|tx| CalendarCommand::EventsOn(date, tx)).await
    }

    pub async fn snapshot(&self) -> CalendarResult<Vec<CalendarEvent>> {
        self.request(CalendarCommand::Snapshot).await
    }

    /// Shutdown the actor and wait until it stopped.
    /// An actor that is already gone counts as shut down.
    pub async fn shutdown(&self) -> CalendarResult<()> {
        if let Err(e) = self.request(CalendarCommand::Shutdown).await {
            debug!("Calendar actor already stopped: {}", e);
        }
        Ok(())
    }
}

impl CalendarActor {
    /// Create a new actor and return its handle
    pub fn new(store: EventStore, persistence: EventPersistence) -> (Self, CalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            store,
            persistence,
            command_rx,
        };

        let handle = CalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Calendar actor started with {} events", self.store.len());

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CalendarCommand::Create(event, response_tx) => {
                    let id = self.store.create(event);
                    let result = match self.flush().await {
                        Ok(()) => self
                            .store
                            .get(&id)
                            .cloned()
                            .ok_or_else(|| actor_error("Created event vanished")),
                        Err(e) => Err(e),
                    };
                    let _ = response_tx.send(result).await;
                }
                CalendarCommand::Update(event, response_tx) => {
                    let result = if self.store.update(event) {
                        self.flush().await.map(|_| true)
                    } else {
                        Ok(false)
                    };
                    let _ = response_tx.send(result).await;
                }
                CalendarCommand::Delete(id, response_tx) => {
                    let result = if self.store.delete(&id) {
                        self.flush().await.map(|_| true)
                    } else {
                        Ok(false)
                    };
                    let _ = response_tx.send(result).await;
                }
                CalendarCommand::Get(id, response_tx) => {
                    let _ = response_tx.send(self.store.get(&id).cloned()).await;
                }
                CalendarCommand::EventsOn(date, response_tx) => {
                    let events = self.store.events_on(date).into_iter().cloned().collect();
                    let _ = response_tx.send(events).await;
                }
                CalendarCommand::Snapshot(response_tx) => {
                    let _ = response_tx.send(self.store.events().to_vec()).await;
                }
                CalendarCommand::Shutdown(response_tx) => {
                    info!("Calendar actor shutting down");
                    let _ = response_tx.send(()).await;
                    break;
                }
            }
        }

        info!("Calendar actor shut down");
    }

    /// Persist the whole collection after a mutation
    async fn flush(&self) -> CalendarResult<()> {
        self.persistence.save(self.store.events()).await.map_err(|e| {
            error!("Failed to persist events: {}", e);
            e
        })
    }
}
