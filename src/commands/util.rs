use rust_i18n::t;

/// List of available commands
pub fn help() -> String {
    t!("help_text").trim_end().to_string()
}
