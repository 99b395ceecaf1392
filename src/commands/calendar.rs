use super::{CommandContext, FormArgs};
use crate::components::calendar::grid::WEEKDAY_NAMES;
use crate::components::calendar::store::events_on;
use crate::components::calendar::{CalendarEvent, DateGridItem, EventForm, MonthCursor};
use crate::components::magic_input::MagicError;
use crate::error::CalendarResult;
use crate::utils::time::{format_date, format_time, local_date, local_datetime};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_i18n::t;
use std::sync::Arc;
use tracing::{debug, warn};

const CELL_WIDTH: usize = 14;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

/// Lines shown inside one grid cell
fn cell_lines(cell: &DateGridItem, events: &[&CalendarEvent], tz: &Tz, max_events: usize) -> Vec<String> {
    let day = cell.date.day();
    let mut lines = vec![if cell.is_today {
        format!("[{}]", day)
    } else if cell.is_current_month {
        format!(" {}", day)
    } else {
        format!(" ({})", day)
    }];

    for event in events.iter().take(max_events) {
        lines.push(format!("{} {}", format_time(&event.start_time, tz), event.title));
    }
    if events.len() > max_events {
        let hidden = events.len() - max_events;
        lines.push(t!("more_events", count = hidden).to_string());
    }
    lines
}

/// Render a 6x7 month page with up to `max_events` per cell
pub fn render_month(
    cursor: MonthCursor,
    grid: &[DateGridItem],
    events: &[CalendarEvent],
    tz: &Tz,
    max_events: usize,
) -> String {
    let mut message = format!("{}\n", cursor.title());
    for name in WEEKDAY_NAMES {
        message.push_str(&format!("{:<width$}", name, width = CELL_WIDTH));
    }
    message.push('\n');

    for week in grid.chunks(7) {
        let cells: Vec<Vec<String>> = week
            .iter()
            .map(|cell| cell_lines(cell, &events_on(events, cell.date, tz), tz, max_events))
            .collect();
        let height = cells.iter().map(Vec::len).max().unwrap_or(1);

        message.push_str(&"-".repeat(CELL_WIDTH * 7));
        message.push('\n');
        for row in 0..height {
            let line: String = cells
                .iter()
                .map(|lines| {
                    let text = lines.get(row).map(String::as_str).unwrap_or("");
                    format!("{:<width$}", truncate(text, CELL_WIDTH - 1), width = CELL_WIDTH)
                })
                .collect();
            message.push_str(line.trim_end());
            message.push('\n');
        }
    }
    message
}

/// Render one day's events with their ids
pub fn render_day(date: NaiveDate, events: &[CalendarEvent], tz: &Tz) -> String {
    let mut message = format!("{}\n", format_date(date));
    if events.is_empty() {
        message.push_str(&t!("day_no_events"));
        message.push('\n');
        return message;
    }

    for event in events {
        message.push_str(&format!(
            "  {}-{}  {}  [{}]  {}\n",
            format_time(&event.start_time, tz),
            format_time(&event.end_time, tz),
            event.title,
            event.color,
            event.id
        ));
        if let Some(location) = &event.location {
            message.push_str(&format!("      @ {}\n", location));
        }
        if let Some(description) = &event.description {
            message.push_str(&format!("      {}\n", description));
        }
    }
    message
}

pub async fn show_month(ctx: &CommandContext) -> CalendarResult<String> {
    let tz = *ctx.calendar.timezone();
    let grid = ctx.cursor.grid(&tz);
    let events = ctx.calendar.snapshot().await?;
    Ok(render_month(ctx.cursor, &grid, &events, &tz, ctx.max_events_per_cell))
}

pub async fn show_day(ctx: &CommandContext, date: NaiveDate) -> CalendarResult<String> {
    let events = ctx.calendar.events_on(date).await?;
    Ok(render_day(date, &events, ctx.calendar.timezone()))
}

fn apply_args(form: &mut EventForm, args: FormArgs) {
    form.date = args.date;
    form.start = args.start;
    form.end = args.end;
    form.title = args.title;
    if let Some(color) = args.color {
        form.color = color;
    }
}

pub async fn add_event(ctx: &mut CommandContext, args: FormArgs) -> CalendarResult<String> {
    let tz = *ctx.calendar.timezone();
    let mut form = EventForm::for_date(args.date);
    apply_args(&mut form, args);

    let event = ctx.calendar.create(form.submit(&tz)?).await?;
    ctx.cursor = MonthCursor::containing(local_date(&event.start_time, &tz));
    Ok(t!("event_created", title = event.title, id = event.id).to_string())
}

pub async fn edit_event(ctx: &mut CommandContext, id: &str, args: FormArgs) -> CalendarResult<String> {
    let tz = *ctx.calendar.timezone();
    let existing = ctx.calendar.resolve_id(id).await?;
    let mut form = EventForm::from_event(&existing, &tz);
    apply_args(&mut form, args);

    let event = form.submit(&tz)?;
    if ctx.calendar.update(event.clone()).await? {
        ctx.cursor = MonthCursor::containing(local_date(&event.start_time, &tz));
        Ok(t!("event_updated", title = event.title).to_string())
    } else {
        Ok(t!("event_vanished", id = event.id).to_string())
    }
}

pub async fn delete_event(ctx: &mut CommandContext, id: &str) -> CalendarResult<String> {
    let existing = ctx.calendar.resolve_id(id).await?;
    if ctx.calendar.delete(&existing.id).await? {
        Ok(t!("event_deleted", title = existing.title).to_string())
    } else {
        Ok(t!("event_vanished", id = existing.id).to_string())
    }
}

/// Reference "now" for magic input: the wall clock while the current month is
/// shown, otherwise local midnight on the first day of the displayed month
pub fn magic_reference(cursor: MonthCursor, tz: &Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    if MonthCursor::containing(local_date(&now, tz)) == cursor {
        return now;
    }
    NaiveDate::from_ymd_opt(cursor.year, cursor.month + 1, 1)
        .and_then(|first| local_datetime(first, 0, 0, tz).ok())
        .unwrap_or(now)
}

/// Start interpreting `text` in the background; the outcome arrives as a notice
pub fn magic(ctx: &CommandContext, text: String) -> String {
    let text = text.trim().to_string();
    if text.is_empty() {
        return t!("magic_empty").to_string();
    }
    if ctx.magic.is_pending(&text) {
        return t!("magic_busy", text = text).to_string();
    }

    let magic = Arc::clone(&ctx.magic);
    let calendar = ctx.calendar.clone();
    let notices = ctx.notices.clone();
    let reply = t!("magic_thinking", text = text).to_string();
    let reference = magic_reference(ctx.cursor, ctx.calendar.timezone(), Utc::now());

    tokio::spawn(async move {
        let tz = *calendar.timezone();
        let notice = match magic.submit(&calendar, &text, reference).await {
            Ok(event) => t!(
                "magic_created",
                title = event.title,
                date = format_date(local_date(&event.start_time, &tz)),
                time = format_time(&event.start_time, &tz)
            )
            .to_string(),
            Err(MagicError::Busy) => t!("magic_busy", text = text).to_string(),
            Err(MagicError::EmptyInput) => t!("magic_empty").to_string(),
            Err(MagicError::NotUnderstood) => t!("magic_not_understood").to_string(),
            Err(MagicError::Calendar(e)) => {
                warn!("Failed to store interpreted event: {}", e);
                t!("command_error", error = e.to_string()).to_string()
            }
        };
        if notices.send(notice).await.is_err() {
            debug!("Notice receiver closed before magic input finished");
        }
    });

    reply
}
