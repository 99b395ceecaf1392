use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(chronocal::config))]
    Config(String),

    #[error("Storage error: {0}")]
    #[diagnostic(code(chronocal::storage))]
    Storage(String),

    #[error("Corrupt data: {0}")]
    #[diagnostic(code(chronocal::corrupt_data))]
    CorruptData(String),

    #[error("Oracle error: {0}")]
    #[diagnostic(code(chronocal::oracle))]
    Oracle(String),

    #[error("Invalid event: {0}")]
    #[diagnostic(code(chronocal::invalid_event), help("times use HH:MM and dates YYYY-MM-DD"))]
    InvalidEvent(String),

    #[error("Invalid command: {0}")]
    #[diagnostic(code(chronocal::command), help("type 'help' for the list of commands"))]
    Command(String),

    #[error("Calendar actor error: {0}")]
    #[diagnostic(code(chronocal::actor))]
    Actor(String),

    #[error(transparent)]
    #[diagnostic(code(chronocal::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(chronocal::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(chronocal::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type CalendarResult<T> = Result<T, Error>;

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create storage errors
pub fn storage_error(message: &str) -> Error {
    Error::Storage(message.to_string())
}

/// Helper for stored values that cannot be decoded
pub fn corrupt_data_error(message: &str) -> Error {
    Error::CorruptData(message.to_string())
}

/// Helper to create oracle errors
pub fn oracle_error(message: &str) -> Error {
    Error::Oracle(message.to_string())
}

/// Helper to create event validation errors
pub fn invalid_event_error(message: &str) -> Error {
    Error::InvalidEvent(message.to_string())
}

/// Helper to create command parsing errors
pub fn command_error(message: &str) -> Error {
    Error::Command(message.to_string())
}

/// Helper to create actor mailbox errors
pub fn actor_error(message: &str) -> Error {
    Error::Actor(message.to_string())
}
