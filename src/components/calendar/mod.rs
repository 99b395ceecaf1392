mod actor;
pub mod form;
pub mod grid;
mod handle;
pub mod models;
pub mod store;

pub use form::EventForm;
pub use grid::{month_grid, month_grid_now, MonthCursor};
pub use handle::CalendarHandle;
pub use models::{CalendarEvent, DateGridItem, EventColor};
pub use store::EventStore;
