use super::models::{new_event_id, CalendarEvent, EventColor};
use crate::error::{invalid_event_error, CalendarResult};
use crate::utils::time::{format_time, local_date, local_datetime, parse_time};
use chrono::NaiveDate;
use chrono_tz::Tz;

pub const DEFAULT_START: &str = "09:00";
pub const DEFAULT_END: &str = "10:00";

/// Fields of the create/edit event form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventForm {
    /// Identity of the event being edited, `None` when creating
    pub existing_id: Option<String>,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    /// Local HH:MM
    pub start: String,
    /// Local HH:MM
    pub end: String,
    pub color: EventColor,
    pub location: Option<String>,
}

impl EventForm {
    /// Blank form for a new event on `date`
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            existing_id: None,
            title: String::new(),
            description: String::new(),
            date,
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
            color: EventColor::default(),
            location: None,
        }
    }

    /// Form prefilled from an existing event, times shown in `tz`
    pub fn from_event(event: &CalendarEvent, tz: &Tz) -> Self {
        Self {
            existing_id: Some(event.id.clone()),
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            date: local_date(&event.start_time, tz),
            start: format_time(&event.start_time, tz),
            end: format_time(&event.end_time, tz),
            color: event.color,
            location: event.location.clone(),
        }
    }

    /// Validate the form and build the event it describes.
    /// Start and end share the form's date.
    pub fn submit(&self, tz: &Tz) -> CalendarResult<CalendarEvent> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(invalid_event_error("Title must not be empty"));
        }

        let (start_hour, start_minute) = parse_time(&self.start)
            .ok_or_else(|| invalid_event_error(&format!("Invalid start time: {}", self.start)))?;
        let (end_hour, end_minute) = parse_time(&self.end)
            .ok_or_else(|| invalid_event_error(&format!("Invalid end time: {}", self.end)))?;

        let start_time = local_datetime(self.date, start_hour, start_minute, tz)?;
        let end_time = local_datetime(self.date, end_hour, end_minute, tz)?;
        if end_time <= start_time {
            return Err(invalid_event_error("End time must be after start time"));
        }

        let description = self.description.trim();
        Ok(CalendarEvent {
            id: self.existing_id.clone().unwrap_or_else(new_event_id),
            title: title.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            start_time,
            end_time,
            color: self.color,
            location: self.location.clone(),
        })
    }
}
