use crate::components::calendar::models::EventColor;
use crate::utils::time::to_iso_string;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Event fields as the oracle returns them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiMagicResponse {
    /// Short title of the event
    pub title: String,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Start time, ISO 8601 format with offset
    pub start_time: String,
    /// End time, ISO 8601 format with offset
    pub end_time: String,
    /// Where the event takes place
    #[serde(default)]
    pub location: Option<String>,
    /// Color matching the nature of the event
    #[serde(default)]
    #[schemars(with = "Option<EventColor>")]
    pub color_suggestion: Option<String>,
}

/// Everything the oracle is told about one magic input submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// Verbatim user text
    pub text: String,
    /// "Now" that relative expressions resolve against
    pub reference: DateTime<Utc>,
    /// Timezone the user's wall-clock times are in
    pub timezone: Tz,
}

impl OracleRequest {
    pub fn new(text: impl Into<String>, reference: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            text: text.into(),
            reference,
            timezone,
        }
    }

    /// JSON schema the reply has to follow
    pub fn response_schema() -> String {
        let schema = schemars::schema_for!(AiMagicResponse);
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    }

    /// User prompt sent to the model
    pub fn prompt(&self) -> String {
        USER_PROMPT_TEMPLATE
            .replace("{now}", &to_iso_string(&self.reference))
            .replace("{timezone}", self.timezone.name())
            .replace("{schema}", &Self::response_schema())
            .replace("{text}", &self.text)
    }
}

pub const SYSTEM_PROMPT: &str = "You are a calendar assistant that turns natural language into calendar events. \
Always answer with a single JSON object that follows the given schema, with no markdown and no extra text. \
When the user gives no date, use the next occurrence of the mentioned time or day after the current date. \
Pick a colorSuggestion that matches the nature of the event: RED for urgent or work, GREEN for leisure, \
PURPLE for parties, ORANGE for errands, GRAY for chores, BLUE otherwise.";

const USER_PROMPT_TEMPLATE: &str = "Current date and time: {now}
User timezone: {timezone}

Create a calendar event from the user request below.
- Interpret times in the user timezone and write startTime and endTime as ISO 8601 with the matching offset.
- If no duration is given, the event lasts one hour.
- If no date is given, assume the next future occurrence relative to the current date and time.
- colorSuggestion must be one of BLUE, RED, GREEN, PURPLE, ORANGE, GRAY.

Reply with JSON matching this schema:
{schema}

User request: \"{text}\"";
