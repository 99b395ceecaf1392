use crate::utils::time::iso_millis;
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Display color of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventColor {
    #[default]
    #[serde(alias = "bg-blue-100 text-blue-700 border-blue-200")]
    Blue,
    #[serde(alias = "bg-red-100 text-red-700 border-red-200")]
    Red,
    #[serde(alias = "bg-green-100 text-green-700 border-green-200")]
    Green,
    #[serde(alias = "bg-purple-100 text-purple-700 border-purple-200")]
    Purple,
    #[serde(alias = "bg-orange-100 text-orange-700 border-orange-200")]
    Orange,
    #[serde(alias = "bg-gray-100 text-gray-700 border-gray-200")]
    Gray,
}

impl EventColor {
    pub const ALL: [EventColor; 6] = [
        EventColor::Blue,
        EventColor::Red,
        EventColor::Green,
        EventColor::Purple,
        EventColor::Orange,
        EventColor::Gray,
    ];

    /// Upper-case token used on the wire
    pub fn token(&self) -> &'static str {
        match self {
            EventColor::Blue => "BLUE",
            EventColor::Red => "RED",
            EventColor::Green => "GREEN",
            EventColor::Purple => "PURPLE",
            EventColor::Orange => "ORANGE",
            EventColor::Gray => "GRAY",
        }
    }

    /// Tailwind classes the web front end styles event chips with
    pub fn style_classes(&self) -> &'static str {
        match self {
            EventColor::Blue => "bg-blue-100 text-blue-700 border-blue-200",
            EventColor::Red => "bg-red-100 text-red-700 border-red-200",
            EventColor::Green => "bg-green-100 text-green-700 border-green-200",
            EventColor::Purple => "bg-purple-100 text-purple-700 border-purple-200",
            EventColor::Orange => "bg-orange-100 text-orange-700 border-orange-200",
            EventColor::Gray => "bg-gray-100 text-gray-700 border-gray-200",
        }
    }

    /// Map a token from free text, case-insensitively
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        EventColor::ALL
            .into_iter()
            .find(|color| color.token().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for EventColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventColor::from_token(s).ok_or_else(|| format!("Unknown color: {}", s))
    }
}

/// A calendar entry with a time range, title and display color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "iso_millis")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub color: EventColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CalendarEvent {
    /// Create an event with a fresh identity
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>, color: EventColor) -> Self {
        Self {
            id: new_event_id(),
            title: title.into(),
            description: None,
            start_time,
            end_time,
            color,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Fresh opaque event identity
pub fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}

/// One of the 42 cells of a month page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateGridItem {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
}
