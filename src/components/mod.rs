pub mod calendar;
pub mod magic_input;
pub mod storage;

pub use calendar::CalendarHandle;
pub use magic_input::MagicInput;
