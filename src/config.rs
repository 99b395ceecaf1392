use crate::error::{config_error, CalendarResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Storage key the event blob lives under
pub const DEFAULT_STORAGE_KEY: &str = "chrono_events";

/// Gemini model used when none is configured
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// How many events a grid cell lists before collapsing into "+N more"
pub const DEFAULT_MAX_EVENTS_PER_CELL: usize = 3;

const DEFAULT_CONFIG_PATH: &str = "config/calendar.toml";

/// Main configuration structure for the calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key, magic input is disabled without it
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Timezone used for "local" dates and times
    pub timezone: String,
    /// Directory holding the key-value store files
    pub data_dir: PathBuf,
    /// Key the event collection is stored under
    pub storage_key: String,
    /// Locale for terminal messages
    pub locale: String,
    /// Events listed per grid cell
    pub max_events_per_cell: usize,
}

/// Optional settings read from the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
struct FileSettings {
    gemini_model: Option<String>,
    timezone: Option<String>,
    data_dir: Option<PathBuf>,
    storage_key: Option<String>,
    locale: Option<String>,
    max_events_per_cell: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            timezone: String::from("UTC"),
            data_dir: PathBuf::from("./data"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            locale: String::from("en"),
            max_events_per_cell: DEFAULT_MAX_EVENTS_PER_CELL,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> CalendarResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let path = env::var("CALENDAR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file_contents = match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(_) => {
                debug!("No config file at {}, using defaults", path);
                None
            }
        };

        Self::from_sources(|key| env::var(key).ok(), file_contents.as_deref())
    }

    /// Build configuration from a variable lookup and optional TOML contents.
    /// Environment values win over file values.
    pub fn from_sources<F>(lookup: F, file_contents: Option<&str>) -> CalendarResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileSettings = match file_contents {
            Some(content) => toml::from_str(content)?,
            None => FileSettings::default(),
        };
        let defaults = Config::default();

        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty());
        let gemini_model = lookup("GEMINI_MODEL")
            .or(file.gemini_model)
            .unwrap_or(defaults.gemini_model);
        let timezone = lookup("TIMEZONE")
            .or(file.timezone)
            .unwrap_or(defaults.timezone);
        let data_dir = lookup("CALENDAR_DATA_DIR")
            .map(PathBuf::from)
            .or(file.data_dir)
            .unwrap_or(defaults.data_dir);
        let locale = lookup("CALENDAR_LOCALE")
            .or(file.locale)
            .unwrap_or(defaults.locale);

        let storage_key = file.storage_key.unwrap_or(defaults.storage_key);
        if storage_key.trim().is_empty() {
            return Err(config_error("storage_key must not be empty"));
        }

        let max_events_per_cell = file
            .max_events_per_cell
            .unwrap_or(defaults.max_events_per_cell);

        let config = Config {
            gemini_api_key,
            gemini_model,
            timezone,
            data_dir,
            storage_key,
            locale,
            max_events_per_cell,
        };

        // Fail early on a timezone chrono-tz does not know
        config.tz()?;

        Ok(config)
    }

    /// Parsed timezone
    pub fn tz(&self) -> CalendarResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Invalid timezone: {}", self.timezone)))
    }
}
