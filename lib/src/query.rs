use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use humantime_serde::re::humantime;
use thiserror::Error;

use crate::Reading;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("bad period {0:?} (use YYYY-MM)")]
    BadPeriod(String),
    #[error("bad timestamp {0:?} (use RFC 3339, e.g. 2023-04-01T12:00:00Z)")]
    BadTimestamp(String),
    #[error("window starts at {start} but ends earlier at {end}")]
    InvertedWindow { start: String, end: String },
}

/// A calendar month in UTC, e.g. `2023-04`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: u16,
    month: u8,
}

impl Period {
    const FIRST: Period = Period {
        year: 1970,
        month: 1,
    };
    const LAST: Period = Period {
        year: 9998,
        month: 12,
    };

    pub fn new(year: u16, month: u8) -> Result<Self, QueryError> {
        if !(1970..=9998).contains(&year) || !(1..=12).contains(&month) {
            return Err(QueryError::BadPeriod(format!("{:04}-{:02}", year, month)));
        }
        Ok(Period { year, month })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// The period `t` falls in. Instants before 1970 map to January 1970 and
    /// instants after 9998 map to December 9998.
    pub fn containing(t: SystemTime) -> Self {
        let t = t.clamp(UNIX_EPOCH, Window::from_period(Period::LAST).end);
        // Always starts with "YYYY-MM-".
        let stamp = humantime::format_rfc3339_seconds(t).to_string();
        stamp[..7].parse().unwrap_or(Period::FIRST)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First instant of the month.
    pub fn start(&self) -> SystemTime {
        let stamp = format!("{}-01T00:00:00Z", self);
        // Year and month are validated on construction.
        humantime::parse_rfc3339(&stamp).unwrap_or(UNIX_EPOCH)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || QueryError::BadPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(bad)?;
        let digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !digits(year, 4) || !digits(month, 2) {
            return Err(bad());
        }
        let year = year.parse().map_err(|_| bad())?;
        let month = month.parse().map_err(|_| bad())?;
        Period::new(year, month).map_err(|_| bad())
    }
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: SystemTime,
    pub end: SystemTime,
}

impl Window {
    pub fn new(start: SystemTime, end: SystemTime) -> Result<Self, QueryError> {
        if start > end {
            return Err(QueryError::InvertedWindow {
                start: humantime::format_rfc3339(start).to_string(),
                end: humantime::format_rfc3339(end).to_string(),
            });
        }
        Ok(Window { start, end })
    }

    /// Every millisecond of `period`.
    pub fn from_period(period: Period) -> Self {
        let start = period.start();
        let end = period.next().start() - Duration::from_millis(1);
        Window { start, end }
    }

    /// The `span` leading up to `now`, e.g. the last 24 hours.
    pub fn last(span: Duration, now: SystemTime) -> Self {
        Window {
            start: now.checked_sub(span).unwrap_or(UNIX_EPOCH),
            end: now,
        }
    }

    pub fn contains(&self, t: SystemTime) -> bool {
        self.start <= t && t <= self.end
    }
}

pub fn parse_timestamp(s: &str) -> Result<SystemTime, QueryError> {
    humantime::parse_rfc3339_weak(s.trim()).map_err(|_| QueryError::BadTimestamp(s.to_string()))
}

/// Readings inside `window` (all of them when `None`), oldest first.
/// Readings with equal timestamps keep their input order.
pub fn select<I>(readings: I, window: Option<&Window>) -> Vec<Reading>
where
    I: IntoIterator<Item = Reading>,
{
    let mut selected: Vec<Reading> = readings
        .into_iter()
        .filter(|r| window.map_or(true, |w| w.contains(r.created_at)))
        .collect();
    selected.sort_by_key(|r| r.created_at);
    selected
}
