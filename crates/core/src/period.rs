use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Smallest range covering every date in the slice, or None when empty.
    pub fn spanning(dates: &[NaiveDate]) -> Option<Self> {
        let start = *dates.iter().min()?;
        let end = *dates.iter().max()?;
        Some(DateRange { start, end })
    }
}

/// Month bucket label, `YYYY-MM`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Converts a Modified Julian Day number (days since 1858-11-17) to a date.
pub fn date_from_mjd(mjd: i64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1858, 11, 17)?;
    epoch.checked_add_signed(TimeDelta::days(mjd))
}
