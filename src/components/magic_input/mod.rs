pub mod models;
pub mod oracle;
pub mod parser;

pub use models::{AiMagicResponse, OracleRequest};
pub use oracle::{DisabledOracle, EventOracle};
#[cfg(feature = "gemini")]
pub use oracle::GeminiOracle;

use crate::components::calendar::{CalendarEvent, CalendarHandle};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

/// Why a magic input submission produced no event
#[derive(Debug, Error)]
pub enum MagicError {
    #[error("Nothing to interpret")]
    EmptyInput,

    #[error("Already interpreting this input")]
    Busy,

    /// Oracle unreachable, erroring, or replying with something unusable
    #[error("Could not understand the request")]
    NotUnderstood,

    #[error(transparent)]
    Calendar(#[from] crate::error::Error),
}

/// Natural-language event entry backed by an oracle.
///
/// The same text cannot be submitted again while its oracle call is pending.
pub struct MagicInput {
    oracle: Arc<dyn EventOracle>,
    tz: Tz,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Releases an in-flight entry when the submission finishes, however it ends
struct InFlightGuard {
    key: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.in_flight.lock() {
            pending.remove(&self.key);
        }
    }
}

impl MagicInput {
    pub fn new(oracle: Arc<dyn EventOracle>, tz: Tz) -> Self {
        Self {
            oracle,
            tz,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether `text` is currently being interpreted
    pub fn is_pending(&self, text: &str) -> bool {
        self.in_flight
            .lock()
            .map(|pending| pending.contains(text.trim()))
            .unwrap_or(false)
    }

    fn acquire(&self, key: &str) -> Result<InFlightGuard, MagicError> {
        let mut pending = self.in_flight.lock().map_err(|_| MagicError::Busy)?;
        if !pending.insert(key.to_string()) {
            return Err(MagicError::Busy);
        }
        Ok(InFlightGuard {
            key: key.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Turn free text into an event, resolving relative dates against `reference`
    pub async fn interpret(&self, text: &str, reference: DateTime<Utc>) -> Result<CalendarEvent, MagicError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MagicError::EmptyInput);
        }
        let _guard = self.acquire(text)?;

        let request = OracleRequest::new(text, reference, self.tz);
        let reply = match self.oracle.interpret(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Oracle call failed: {}", e);
                return Err(MagicError::NotUnderstood);
            }
        };

        let event = parser::parse_magic_response(&reply)
            .and_then(|response| parser::into_event(response, &self.tz))
            .map_err(|e| {
                warn!("Oracle reply was not a usable event: {}", e);
                MagicError::NotUnderstood
            })?;

        info!("Interpreted {:?} as {} at {}", text, event.title, event.start_time);
        Ok(event)
    }

    /// Interpret `text` and add the result to the calendar
    pub async fn submit(
        &self,
        calendar: &CalendarHandle,
        text: &str,
        reference: DateTime<Utc>,
    ) -> Result<CalendarEvent, MagicError> {
        let event = self.interpret(text, reference).await?;
        Ok(calendar.create(event).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{oracle_error, CalendarResult};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct FakeOracle {
        response: Result<String, String>,
        calls: AtomicUsize,
    }

    impl FakeOracle {
        fn new(response: Result<&str, &str>) -> Self {
            Self {
                response: response.map(str::to_string).map_err(str::to_string),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EventOracle for FakeOracle {
        async fn interpret(&self, _request: &OracleRequest) -> CalendarResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(err) => Err(oracle_error(err)),
            }
        }
    }

    /// Oracle that blocks until released
    struct GatedOracle {
        release: Notify,
    }

    #[async_trait]
    impl EventOracle for GatedOracle {
        async fn interpret(&self, _request: &OracleRequest) -> CalendarResult<String> {
            self.release.notified().await;
            Ok(r#"{"title":"Sync","startTime":"2024-03-05T10:00:00Z","endTime":"2024-03-05T11:00:00Z"}"#.to_string())
        }
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_blank_input_skips_oracle() {
        let oracle = Arc::new(FakeOracle::new(Ok("{}")));
        let magic = MagicInput::new(oracle.clone(), Tz::UTC);
        assert!(matches!(magic.interpret("   ", reference()).await, Err(MagicError::EmptyInput)));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_and_parse_failures_look_the_same() {
        let down = MagicInput::new(Arc::new(FakeOracle::new(Err("503"))), Tz::UTC);
        assert!(matches!(down.interpret("lunch", reference()).await, Err(MagicError::NotUnderstood)));

        let garbage = MagicInput::new(Arc::new(FakeOracle::new(Ok("no idea"))), Tz::UTC);
        assert!(matches!(garbage.interpret("lunch", reference()).await, Err(MagicError::NotUnderstood)));

        // The guard is released after a failure
        assert!(!down.is_pending("lunch"));
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_busy_while_pending() {
        let oracle = Arc::new(GatedOracle { release: Notify::new() });
        let magic = Arc::new(MagicInput::new(oracle.clone(), Tz::UTC));

        let first = {
            let magic = Arc::clone(&magic);
            tokio::spawn(async move { magic.interpret("team sync", reference()).await })
        };
        while !magic.is_pending("team sync") {
            tokio::task::yield_now().await;
        }

        assert!(matches!(magic.interpret(" team sync ", reference()).await, Err(MagicError::Busy)));

        oracle.release.notify_one();
        let event = first.await.unwrap().unwrap();
        assert_eq!(event.title, "Sync");
        assert!(!magic.is_pending("team sync"));
    }
}
