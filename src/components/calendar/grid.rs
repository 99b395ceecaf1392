use super::models::DateGridItem;
use crate::utils::time;
use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::warn;

/// Cells in a month page: 6 rows of 7 days
pub const GRID_CELLS: usize = 42;

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Normalize a (year, zero-based month) pair whose month may over- or underflow
fn normalize(year: i32, month: i32) -> (i32, u32) {
    (year + month.div_euclid(12), month.rem_euclid(12) as u32)
}

/// Build the 42-cell page for `month` (zero-based) of `year`.
///
/// Leading cells come from the previous month and trailing cells from the
/// next one so the page always starts on a Sunday. Only cells of the displayed
/// month can be flagged as today.
pub fn month_grid(year: i32, month: i32, today: NaiveDate) -> Vec<DateGridItem> {
    let (year, month0) = normalize(year, month);
    let Some(first) = NaiveDate::from_ymd_opt(year, month0 + 1, 1) else {
        warn!("Year {} is outside the supported calendar range", year);
        return Vec::new();
    };

    let offset = first.weekday().num_days_from_sunday() as i64;
    let Some(page_start) = first.checked_sub_signed(Duration::days(offset)) else {
        warn!("Month {}-{} has no representable previous month", year, month0 + 1);
        return Vec::new();
    };

    page_start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| {
            let is_current_month = date.year() == year && date.month0() == month0;
            DateGridItem {
                date,
                is_current_month,
                is_today: is_current_month && date == today,
            }
        })
        .collect()
}

/// Build the page with "today" taken from the wall clock in `tz`
pub fn month_grid_now(year: i32, month: i32, tz: &Tz) -> Vec<DateGridItem> {
    month_grid(year, month, time::today(tz))
}

/// The month currently on display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    /// Zero-based month index
    pub month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: i32) -> Self {
        let (year, month) = normalize(year, month);
        Self { year, month }
    }

    /// Month containing the given date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    /// Month containing today in `tz`
    pub fn today(tz: &Tz) -> Self {
        Self::containing(time::today(tz))
    }

    pub fn prev(&self) -> Self {
        Self::new(self.year, self.month as i32 - 1)
    }

    pub fn next(&self) -> Self {
        Self::new(self.year, self.month as i32 + 1)
    }

    /// Header text such as "March 2024"
    pub fn title(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month as usize % 12], self.year)
    }

    /// Page for this month with today's flag taken from the wall clock in `tz`
    pub fn grid(&self, tz: &Tz) -> Vec<DateGridItem> {
        month_grid_now(self.year, self.month as i32, tz)
    }
}
