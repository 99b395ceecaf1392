use super::models::AiMagicResponse;
use crate::components::calendar::models::{new_event_id, CalendarEvent, EventColor};
use crate::error::{oracle_error, CalendarResult};
use crate::utils::time::parse_iso_in;
use chrono::Duration;
use chrono_tz::Tz;
use serde_json::from_str;
use tracing::{debug, warn};

/// Attempt to parse the event object from the model response
pub fn parse_magic_response(response: &str) -> CalendarResult<AiMagicResponse> {
    // Replies sometimes wrap the object in prose or code fences
    if let (Some(json_start), Some(json_end)) = (response.find('{'), response.rfind('}')) {
        if json_start < json_end {
            let json_str = &response[json_start..=json_end];
            match from_str::<AiMagicResponse>(json_str) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => debug!("Failed to parse extracted JSON object: {}", e),
            }
        }
    }

    from_str::<AiMagicResponse>(response.trim()).map_err(|e| {
        warn!("Could not extract an event from response: {}", response);
        oracle_error(&format!("Unparseable oracle response: {}", e))
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate the oracle's fields and shape them into a new event.
/// Timestamps without an offset are wall-clock times in `tz`.
pub fn into_event(response: AiMagicResponse, tz: &Tz) -> CalendarResult<CalendarEvent> {
    let title = response.title.trim();
    if title.is_empty() {
        return Err(oracle_error("Oracle returned an empty title"));
    }

    let start_time = parse_iso_in(&response.start_time, tz)
        .ok_or_else(|| oracle_error(&format!("Invalid startTime: {}", response.start_time)))?;
    let mut end_time = parse_iso_in(&response.end_time, tz)
        .ok_or_else(|| oracle_error(&format!("Invalid endTime: {}", response.end_time)))?;
    if end_time <= start_time {
        warn!(
            "Oracle returned end {} not after start {}, using one hour",
            response.end_time, response.start_time
        );
        end_time = start_time + Duration::hours(1);
    }

    let color = match response.color_suggestion.as_deref() {
        Some(token) => EventColor::from_token(token).unwrap_or_else(|| {
            debug!("Ignoring unknown color suggestion {}", token);
            EventColor::default()
        }),
        None => EventColor::default(),
    };

    Ok(CalendarEvent {
        id: new_event_id(),
        title: title.to_string(),
        description: non_blank(response.description),
        start_time,
        end_time,
        color,
        location: non_blank(response.location),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn response(color: Option<&str>) -> AiMagicResponse {
        AiMagicResponse {
            title: "Lunch".to_string(),
            description: None,
            start_time: "2024-03-05T13:00:00Z".to_string(),
            end_time: "2024-03-05T14:00:00Z".to_string(),
            location: None,
            color_suggestion: color.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_plain_and_wrapped_json() {
        let plain = r#"{"title":"Lunch","startTime":"2024-03-05T13:00:00Z","endTime":"2024-03-05T14:00:00Z"}"#;
        assert_eq!(parse_magic_response(plain).unwrap().title, "Lunch");

        let fenced = format!("Sure! Here it is:\n```json\n{}\n```", plain);
        assert_eq!(parse_magic_response(&fenced).unwrap(), parse_magic_response(plain).unwrap());
    }

    #[test]
    fn test_parse_rejects_missing_required_fields() {
        assert!(parse_magic_response(r#"{"title":"Lunch"}"#).is_err());
        assert!(parse_magic_response("I could not understand that").is_err());
        assert!(parse_magic_response("").is_err());
    }

    #[test]
    fn test_unknown_color_falls_back_to_default() {
        let event = into_event(response(Some("MAGENTA")), &Tz::UTC).unwrap();
        assert_eq!(event.color, EventColor::Blue);
        let event = into_event(response(Some("GREEN")), &Tz::UTC).unwrap();
        assert_eq!(event.color, EventColor::Green);
        let event = into_event(response(None), &Tz::UTC).unwrap();
        assert_eq!(event.color, EventColor::Blue);
    }

    #[test]
    fn test_into_event_converts_offsets_and_blanks() {
        let mut raw = response(None);
        raw.start_time = "2024-03-05T13:00:00+02:00".to_string();
        raw.end_time = "2024-03-05T14:00:00+02:00".to_string();
        raw.description = Some("   ".to_string());
        raw.location = Some(" Cafe ".to_string());

        let event = into_event(raw, &Tz::UTC).unwrap();
        assert_eq!(event.start_time, Utc.with_ymd_and_hms(2024, 3, 5, 11, 0, 0).unwrap());
        assert_eq!(event.description, None);
        assert_eq!(event.location.as_deref(), Some("Cafe"));
        assert!(!event.id.is_empty());
    }

    #[test]
    fn test_into_event_validation() {
        let mut blank = response(None);
        blank.title = "  ".to_string();
        assert!(into_event(blank, &Tz::UTC).is_err());

        let mut bad_time = response(None);
        bad_time.start_time = "tomorrow at 1pm".to_string();
        assert!(into_event(bad_time, &Tz::UTC).is_err());

        let mut backwards = response(None);
        backwards.end_time = "2024-03-05T12:00:00Z".to_string();
        let event = into_event(backwards, &Tz::UTC).unwrap();
        assert_eq!(event.end_time, Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_offsetless_times_are_local_to_the_user() {
        let reply = r#"{"title":"Lunch","startTime":"2024-03-05T13:00:00","endTime":"2024-03-05T14:00:00"}"#;
        let tz: Tz = "America/New_York".parse().unwrap();

        let event = into_event(parse_magic_response(reply).unwrap(), &tz).unwrap();
        assert_eq!(event.start_time, Utc.with_ymd_and_hms(2024, 3, 5, 18, 0, 0).unwrap());
        assert_eq!(event.end_time, Utc.with_ymd_and_hms(2024, 3, 5, 19, 0, 0).unwrap());

        let event = into_event(parse_magic_response(reply).unwrap(), &Tz::UTC).unwrap();
        assert_eq!(event.start_time, Utc.with_ymd_and_hms(2024, 3, 5, 13, 0, 0).unwrap());
    }
}
