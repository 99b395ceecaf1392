use super::models::{new_event_id, CalendarEvent};
use crate::utils::time::local_date;
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::debug;

/// Events whose start falls on `date` in `tz`, earliest first
pub fn events_on<'a>(events: &'a [CalendarEvent], date: NaiveDate, tz: &Tz) -> Vec<&'a CalendarEvent> {
    let mut day: Vec<&CalendarEvent> = events
        .iter()
        .filter(|event| local_date(&event.start_time, tz) == date)
        .collect();
    // Stable sort keeps insertion order for equal start times
    day.sort_by_key(|event| event.start_time);
    day
}

/// In-memory ordered collection of events.
///
/// Persistence is not done here; the owner loads the collection once and
/// flushes [`EventStore::events`] after every mutation.
#[derive(Debug, Clone)]
pub struct EventStore {
    events: Vec<CalendarEvent>,
    tz: Tz,
}

impl EventStore {
    pub fn new(tz: Tz) -> Self {
        Self::from_events(Vec::new(), tz)
    }

    pub fn from_events(events: Vec<CalendarEvent>, tz: Tz) -> Self {
        Self { events, tz }
    }

    /// All events in insertion order
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Append an event and return its identity.
    /// A blank or already used id is replaced with a fresh one.
    pub fn create(&mut self, mut event: CalendarEvent) -> String {
        if event.id.trim().is_empty() || self.get(&event.id).is_some() {
            event.id = new_event_id();
        }
        debug!("Creating event {} ({})", event.id, event.title);
        let id = event.id.clone();
        self.events.push(event);
        id
    }

    /// Replace the record with the same id. Unknown ids are a no-op.
    pub fn update(&mut self, event: CalendarEvent) -> bool {
        match self.events.iter_mut().find(|existing| existing.id == event.id) {
            Some(existing) => {
                debug!("Updating event {}", event.id);
                *existing = event;
                true
            }
            None => {
                debug!("Ignoring update of unknown event {}", event.id);
                false
            }
        }
    }

    /// Remove the record with the given id. Unknown ids are a no-op.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        let removed = self.events.len() != before;
        if removed {
            debug!("Deleted event {}", id);
        }
        removed
    }

    /// Events starting on `date` in the store's timezone, earliest first
    pub fn events_on(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        events_on(&self.events, date, &self.tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::calendar::models::EventColor;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, title: &str, (d, h): (u32, u32)) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 3, d, h + 1, 0, 0).unwrap(),
            color: EventColor::Blue,
            location: None,
        }
    }

    fn store() -> EventStore {
        EventStore::from_events(
            vec![
                event("a", "Gym", (5, 17)),
                event("b", "Standup", (5, 9)),
                event("c", "Dentist", (6, 11)),
            ],
            Tz::UTC,
        )
    }

    #[test]
    fn test_events_on_sorts_and_filters() {
        let store = store();
        let day = store.events_on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        let titles: Vec<_> = day.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Standup", "Gym"]);
        assert!(store.events_on(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()).is_empty());
    }

    #[test]
    fn test_events_on_uses_local_date() {
        // 23:00 UTC on the 5th is already the 6th in Helsinki
        let tz: Tz = "Europe/Helsinki".parse().unwrap();
        let store = EventStore::from_events(vec![event("late", "Late call", (5, 22))], tz);
        assert!(store.events_on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()).is_empty());
        assert_eq!(store.events_on(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()).len(), 1);
    }

    #[test]
    fn test_create_generates_identity_when_needed() {
        let mut store = store();
        let blank = store.create(event("", "No id", (8, 10)));
        assert!(!blank.is_empty());
        let duplicate = store.create(event("a", "Clash", (8, 12)));
        assert_ne!(duplicate, "a");
        let kept = store.create(event("own-id", "Own id", (8, 14)));
        assert_eq!(kept, "own-id");
        assert_eq!(store.len(), 6);
        assert_eq!(store.events().last().unwrap().id, "own-id");
    }

    #[test]
    fn test_update_replaces_exactly_one_record() {
        let mut store = store();
        let mut changed = event("b", "Standup (moved)", (5, 10));
        changed.color = EventColor::Red;
        assert!(store.update(changed.clone()));
        assert_eq!(store.get("b"), Some(&changed));
        assert_eq!(store.get("a").unwrap().title, "Gym");
        assert_eq!(store.get("c").unwrap().title, "Dentist");
        // Position in the collection is preserved
        assert_eq!(store.events()[1].id, "b");
    }

    #[test]
    fn test_update_of_unknown_id_is_noop() {
        let mut store = store();
        let before = store.events().to_vec();
        assert!(!store.update(event("zzz", "Ghost", (5, 9))));
        assert_eq!(store.events(), before.as_slice());
    }

    #[test]
    fn test_delete() {
        let mut store = store();
        assert!(store.delete("a"));
        assert_eq!(store.len(), 2);
        assert!(!store.delete("a"));
        assert!(!store.delete("missing"));
        assert_eq!(store.len(), 2);
    }
}
