use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use chronocal::components::calendar::{CalendarHandle, EventColor};
use chronocal::components::magic_input::{DisabledOracle, EventOracle, MagicError, MagicInput, OracleRequest};
use chronocal::components::storage::{EventPersistence, MemoryKeyValueStore};
use chronocal::error::{oracle_error, CalendarResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Oracle that replays scripted replies and records what it was asked
#[derive(Default)]
struct ScriptedOracle {
    replies: Mutex<VecDeque<CalendarResult<String>>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    fn with_replies(replies: Vec<CalendarResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventOracle for ScriptedOracle {
    async fn interpret(&self, request: &OracleRequest) -> CalendarResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(oracle_error("script exhausted")))
    }
}

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

fn lunch_reply(color: &str) -> CalendarResult<String> {
    Ok(format!(
        r#"{{"title":"Lunch","startTime":"2024-03-05T13:00:00Z","endTime":"2024-03-05T14:00:00Z","colorSuggestion":"{}"}}"#,
        color
    ))
}

async fn calendar() -> CalendarHandle {
    let kv = Arc::new(MemoryKeyValueStore::new());
    CalendarHandle::load(EventPersistence::new(kv, "chrono_events"), Tz::UTC).await
}

/// "Lunch tomorrow at 1pm" lands on the next day as a one hour event
#[tokio::test]
async fn test_lunch_tomorrow_is_created() {
    let oracle = ScriptedOracle::with_replies(vec![lunch_reply("GREEN")]);
    let magic = MagicInput::new(oracle.clone(), Tz::UTC);
    let calendar = calendar().await;

    let event = magic
        .submit(&calendar, "Lunch tomorrow at 1pm", reference())
        .await
        .unwrap();
    assert_eq!(event.title, "Lunch");
    assert_eq!(event.start_time, Utc.with_ymd_and_hms(2024, 3, 5, 13, 0, 0).unwrap());
    assert_eq!(event.end_time, Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap());
    assert_eq!(event.color, EventColor::Green);

    let day = calendar
        .events_on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        .await
        .unwrap();
    assert_eq!(day, vec![event]);

    let requests = oracle.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].text, "Lunch tomorrow at 1pm");
    assert_eq!(requests[0].reference, reference());
    assert!(requests[0].prompt().contains("2024-03-04T00:00:00.000Z"));
}

/// Colors outside the palette fall back to blue
#[tokio::test]
async fn test_unknown_color_suggestion_defaults_to_blue() {
    let oracle = ScriptedOracle::with_replies(vec![lunch_reply("MAGENTA")]);
    let magic = MagicInput::new(oracle, Tz::UTC);
    let event = magic.interpret("Lunch tomorrow at 1pm", reference()).await.unwrap();
    assert_eq!(event.color, EventColor::Blue);
}

/// Failed interpretations leave the calendar untouched
#[tokio::test]
async fn test_failures_create_nothing() {
    let oracle = ScriptedOracle::with_replies(vec![
        Err(oracle_error("quota exceeded")),
        Ok("Sorry, I can't help with that.".to_string()),
        Ok(r#"{"title":"Lunch","startTime":"soon","endTime":"later"}"#.to_string()),
    ]);
    let magic = MagicInput::new(oracle.clone(), Tz::UTC);
    let calendar = calendar().await;

    for _ in 0..3 {
        let result = magic.submit(&calendar, "Lunch tomorrow", reference()).await;
        assert!(matches!(result, Err(MagicError::NotUnderstood)));
    }
    assert!(matches!(
        magic.submit(&calendar, "   ", reference()).await,
        Err(MagicError::EmptyInput)
    ));
    assert_eq!(oracle.requests().len(), 3);
    assert!(calendar.snapshot().await.unwrap().is_empty());
}

/// Without a configured oracle nothing is understood
#[tokio::test]
async fn test_disabled_oracle() {
    let magic = MagicInput::new(Arc::new(DisabledOracle), Tz::UTC);
    let result = magic.interpret("Lunch tomorrow at 1pm", reference()).await;
    assert!(matches!(result, Err(MagicError::NotUnderstood)));
}

/// Oracle replies in the user's offset are stored as instants
#[tokio::test]
async fn test_offsets_in_reply_are_respected() {
    let tz: Tz = "Europe/Helsinki".parse().unwrap();
    let oracle = ScriptedOracle::with_replies(vec![Ok(
        r#"```json
{"title":"Sauna","startTime":"2024-03-05T19:00:00+02:00","endTime":"2024-03-05T21:00:00+02:00","location":"Löyly"}
```"#
            .to_string(),
    )]);
    let magic = MagicInput::new(oracle.clone(), tz);

    let event = magic.interpret("Sauna tomorrow 7pm for two hours", reference()).await.unwrap();
    assert_eq!(event.start_time, Utc.with_ymd_and_hms(2024, 3, 5, 17, 0, 0).unwrap());
    assert_eq!(event.location.as_deref(), Some("Löyly"));
    assert_eq!(oracle.requests()[0].timezone, tz);
}

/// Replies without an offset are read in the user's timezone
#[tokio::test]
async fn test_offsetless_reply_uses_configured_timezone() {
    let tz: Tz = "Europe/Helsinki".parse().unwrap();
    let oracle = ScriptedOracle::with_replies(vec![Ok(
        r#"{"title":"Lunch","startTime":"2024-03-05T13:00:00","endTime":"2024-03-05T14:00:00"}"#.to_string(),
    )]);
    let magic = MagicInput::new(oracle, tz);

    let event = magic.interpret("Lunch tomorrow at 1pm", reference()).await.unwrap();
    assert_eq!(event.start_time, Utc.with_ymd_and_hms(2024, 3, 5, 11, 0, 0).unwrap());
    assert_eq!(event.end_time, Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap());
}
