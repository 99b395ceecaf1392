use crate::components::calendar::{CalendarHandle, EventColor, MonthCursor};
use crate::components::MagicInput;
use crate::error::{command_error, CalendarResult};
use crate::utils::time::parse_date;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::mpsc;

// Export submodules
pub mod calendar;
pub mod util;

/// A parsed line of terminal input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Show,
    Prev,
    Next,
    Today,
    Day(NaiveDate),
    Add(FormArgs),
    Edit { id: String, args: FormArgs },
    Delete(String),
    Magic(String),
    Quit,
}

/// Arguments shared by `add` and `edit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormArgs {
    pub date: NaiveDate,
    pub start: String,
    pub end: String,
    pub color: Option<EventColor>,
    pub title: String,
}

const ADD_USAGE: &str = "add <YYYY-MM-DD> <HH:MM> <HH:MM> [COLOR] <title>";
const EDIT_USAGE: &str = "edit <id> <YYYY-MM-DD> <HH:MM> <HH:MM> [COLOR] <title>";

fn parse_day(value: Option<&str>, usage: &str) -> CalendarResult<NaiveDate> {
    let value = value.ok_or_else(|| command_error(&format!("usage: {}", usage)))?;
    parse_date(value).ok_or_else(|| command_error(&format!("invalid date {}, expected YYYY-MM-DD", value)))
}

fn parse_form_args(args: &[&str], usage: &str) -> CalendarResult<FormArgs> {
    if args.len() < 4 {
        return Err(command_error(&format!("usage: {}", usage)));
    }
    let date = parse_day(args.first().copied(), usage)?;
    let (color, title_words) = match EventColor::from_token(args[3]) {
        Some(color) if args.len() > 4 => (Some(color), &args[4..]),
        _ => (None, &args[3..]),
    };

    Ok(FormArgs {
        date,
        start: args[1].to_string(),
        end: args[2].to_string(),
        color,
        title: title_words.join(" "),
    })
}

impl Command {
    /// Parse one input line; `None` for a blank line
    pub fn parse(line: &str) -> CalendarResult<Option<Command>> {
        let line = line.trim();
        let Some((name, rest)) = line
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .or_else(|| (!line.is_empty()).then_some((line, "")))
        else {
            return Ok(None);
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "show" | "month" => Command::Show,
            "prev" => Command::Prev,
            "next" => Command::Next,
            "today" => Command::Today,
            "day" => Command::Day(parse_day(args.first().copied(), "day <YYYY-MM-DD>")?),
            "add" => Command::Add(parse_form_args(&args, ADD_USAGE)?),
            "edit" => {
                let Some((id, form_args)) = args.split_first() else {
                    return Err(command_error(&format!("usage: {}", EDIT_USAGE)));
                };
                Command::Edit {
                    id: id.to_string(),
                    args: parse_form_args(form_args, EDIT_USAGE)?,
                }
            }
            "delete" | "del" | "rm" => match args.as_slice() {
                [id] => Command::Delete(id.to_string()),
                _ => return Err(command_error("usage: delete <id>")),
            },
            "magic" => Command::Magic(rest.to_string()),
            "quit" | "exit" => Command::Quit,
            other => return Err(command_error(&format!("unknown command {}", other))),
        };
        Ok(Some(command))
    }
}

/// What the terminal loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// Shared state for all commands
pub struct CommandContext {
    pub calendar: CalendarHandle,
    pub magic: Arc<MagicInput>,
    pub cursor: MonthCursor,
    pub max_events_per_cell: usize,
    /// Messages from background work, such as finished magic input
    pub notices: mpsc::Sender<String>,
}

impl CommandContext {
    /// Create a new command context showing the current month
    pub fn new(
        calendar: CalendarHandle,
        magic: Arc<MagicInput>,
        max_events_per_cell: usize,
        notices: mpsc::Sender<String>,
    ) -> Self {
        let cursor = MonthCursor::today(calendar.timezone());
        Self {
            calendar,
            magic,
            cursor,
            max_events_per_cell,
            notices,
        }
    }

    /// Show a different month
    pub fn with_cursor(mut self, cursor: MonthCursor) -> Self {
        self.cursor = cursor;
        self
    }

    /// Run a command against the calendar
    pub async fn execute(&mut self, command: Command) -> CalendarResult<Reply> {
        let text = match command {
            Command::Help => util::help(),
            Command::Show => calendar::show_month(self).await?,
            Command::Prev => {
                self.cursor = self.cursor.prev();
                calendar::show_month(self).await?
            }
            Command::Next => {
                self.cursor = self.cursor.next();
                calendar::show_month(self).await?
            }
            Command::Today => {
                self.cursor = MonthCursor::today(self.calendar.timezone());
                calendar::show_month(self).await?
            }
            Command::Day(date) => calendar::show_day(self, date).await?,
            Command::Add(args) => calendar::add_event(self, args).await?,
            Command::Edit { id, args } => calendar::edit_event(self, &id, args).await?,
            Command::Delete(id) => calendar::delete_event(self, &id).await?,
            Command::Magic(text) => calendar::magic(self, text),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("  ").unwrap(), None);
        assert_eq!(Command::parse("HELP").unwrap(), Some(Command::Help));
        assert_eq!(Command::parse("next").unwrap(), Some(Command::Next));
        assert_eq!(Command::parse("day 2024-03-05").unwrap(), Some(Command::Day(date(2024, 3, 5))));
        assert_eq!(Command::parse("delete abc").unwrap(), Some(Command::Delete("abc".to_string())));
        assert_eq!(
            Command::parse("magic  Lunch tomorrow at 1pm ").unwrap(),
            Some(Command::Magic("Lunch tomorrow at 1pm".to_string()))
        );
    }

    #[test]
    fn test_parse_add_with_and_without_color() {
        let with_color = Command::parse("add 2024-03-05 13:00 14:00 green Lunch with Sam").unwrap();
        assert_eq!(
            with_color,
            Some(Command::Add(FormArgs {
                date: date(2024, 3, 5),
                start: "13:00".to_string(),
                end: "14:00".to_string(),
                color: Some(EventColor::Green),
                title: "Lunch with Sam".to_string(),
            }))
        );

        // A lone color word is the title
        let Some(Command::Add(args)) = Command::parse("add 2024-03-05 13:00 14:00 Orange").unwrap() else {
            panic!("expected add");
        };
        assert_eq!(args.color, None);
        assert_eq!(args.title, "Orange");
    }

    #[test]
    fn test_parse_edit() {
        let Some(Command::Edit { id, args }) = Command::parse("edit 1a2b 2024-03-05 09:00 09:30 Standup").unwrap() else {
            panic!("expected edit");
        };
        assert_eq!(id, "1a2b");
        assert_eq!(args.title, "Standup");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("frobnicate").is_err());
        assert!(Command::parse("day tomorrow").is_err());
        assert!(Command::parse("add 2024-03-05 13:00").is_err());
        assert!(Command::parse("edit").is_err());
        assert!(Command::parse("delete").is_err());
    }
}
