//! Upcoming-birthday window.
//!
//! Birthdays recur annually, so the window is a set of calendar month/day
//! pairs rather than a date range. The window starting 2024-01-28 and
//! spanning seven days covers 01-28 through 02-04, rolling into February;
//! a window crossing new year wraps into January the same way.
//!
//! People born on 29 February are observed on 28 February in years
//! without a leap day.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

/// Window length used when the caller does not choose one.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Longest accepted window; a year covers every birthday.
pub const MAX_WINDOW_DAYS: u32 = 365;

/// Error raised for an unusable window length.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("days must be between 0 and {MAX_WINDOW_DAYS}, got {days}")]
pub struct BirthdayWindowError {
    pub days: u32,
}

/// Year-less calendar day, rendered as `MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Month/day of `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    const LEAP_DAY: Self = Self { month: 2, day: 29 };
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// The days `start..=start + days`, compared by month and day only.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use contacts_backend::domain::BirthdayWindow;
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 28).unwrap();
/// let window = BirthdayWindow::new(today, 7).unwrap();
/// assert!(window.contains(NaiveDate::from_ymd_opt(1990, 2, 3).unwrap()));
/// assert!(!window.contains(NaiveDate::from_ymd_opt(1990, 2, 5).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthdayWindow {
    start: NaiveDate,
    days: u32,
}

impl BirthdayWindow {
    /// Build a window starting on `today` and spanning `days` further days.
    pub fn new(today: NaiveDate, days: u32) -> Result<Self, BirthdayWindowError> {
        if days > MAX_WINDOW_DAYS {
            return Err(BirthdayWindowError { days });
        }
        Ok(Self { start: today, days })
    }

    /// First day of the window.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Number of days after the start that the window covers.
    #[must_use]
    pub const fn days(&self) -> u32 {
        self.days
    }

    /// Month/day keys covered by the window, sorted and de-duplicated.
    #[must_use]
    pub fn month_days(&self) -> Vec<MonthDay> {
        let mut keys = BTreeSet::new();
        for offset in 0..=self.days {
            let Some(date) = self.start.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            keys.insert(MonthDay::of(date));
            if date.month() == 2 && date.day() == 28 && !has_leap_day(date.year()) {
                keys.insert(MonthDay::LEAP_DAY);
            }
        }
        keys.into_iter().collect()
    }

    /// Whether a birthday falls within the window.
    pub fn contains(&self, birthday: NaiveDate) -> bool {
        self.month_days().contains(&MonthDay::of(birthday))
    }
}

fn has_leap_day(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}
