use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

/// Colors handed out to cohorts that do not pin their own, by registry position.
pub const COHORT_PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F06292", "#AED581", "#7986CB",
];
pub const DEFAULT_SESSION_START: &str = "09:00";
pub const DEFAULT_SESSION_END: &str = "17:00";

const CLOCK_FORMAT: &str = "%H:%M";

/// Validation failures raised while constructing domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("session on {date} ends at {end} which is not after its start at {start}")]
    SessionEndsBeforeStart {
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },
    #[error("invalid clock time '{0}' (expected HH:MM)")]
    InvalidClock(String),
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("invalid month '{0}' (expected YYYY-MM)")]
    InvalidMonth(String),
    #[error("cohort name cannot be empty")]
    EmptyCohortName,
    #[error("cohort '{0}' needs a positive monthly hour allotment")]
    ZeroAllotment(String),
    #[error("blackout range ends on {end} before it starts on {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Case-insensitive cohort name comparison used for lookups and uniqueness.
pub fn same_cohort_name(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

pub fn parse_clock(value: &str) -> Result<NaiveTime, ModelError> {
    NaiveTime::parse_from_str(value.trim(), CLOCK_FORMAT)
        .map_err(|_| ModelError::InvalidClock(value.to_string()))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ModelError::InvalidDate(value.to_string()))
}

/// A calendar month, anchored on its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ModelError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| Self { first })
            .ok_or_else(|| ModelError::InvalidMonth(format!("{year:04}-{month:02}")))
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.days().last().unwrap_or(self.first)
    }

    /// Every day of the month in calendar order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let month = self.first.month();
        self.first.iter_days().take_while(move |day| day.month() == month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// The following month, if representable.
    pub fn next(&self) -> Option<Self> {
        self.last_day().succ_opt().map(Self::of)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || ModelError::InvalidMonth(value.to_string());
        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

/// One meeting occurrence: a date with a same-day wall-clock window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Session {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl Session {
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, ModelError> {
        if end <= start {
            return Err(ModelError::SessionEndsBeforeStart { date, start, end });
        }
        Ok(Self { date, start, end })
    }

    /// Build a session from `HH:MM` clock strings.
    pub fn parse(date: NaiveDate, start: &str, end: &str) -> Result<Self, ModelError> {
        Self::new(date, parse_clock(start)?, parse_clock(end)?)
    }

    /// A 09:00-17:00 session on `date`.
    pub fn full_day(date: NaiveDate) -> Result<Self, ModelError> {
        Self::parse(date, DEFAULT_SESSION_START, DEFAULT_SESSION_END)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Length of the session in whole minutes.
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Length of the session in fractional hours.
    pub fn hours(&self) -> f64 {
        self.minutes() as f64 / 60.0
    }

    /// The `HH:MM-HH:MM` window of the session.
    pub fn window(&self) -> String {
        format!(
            "{}-{}",
            self.start.format(CLOCK_FORMAT),
            self.end.format(CLOCK_FORMAT)
        )
    }
}

/// A named group with a monthly training-hour budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cohort {
    name: String,
    monthly_hours: u32,
    color: String,
    #[serde(skip)]
    color_pinned: bool,
}

impl Cohort {
    pub fn new(name: &str, monthly_hours: u32) -> Result<Self, ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyCohortName);
        }
        if monthly_hours == 0 {
            return Err(ModelError::ZeroAllotment(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            monthly_hours,
            color: COHORT_PALETTE[0].to_string(),
            color_pinned: false,
        })
    }

    /// Pin a display color so registry reshuffles leave it alone.
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.trim().to_string();
        self.color_pinned = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn monthly_hours(&self) -> u32 {
        self.monthly_hours
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn is_named(&self, name: &str) -> bool {
        same_cohort_name(&self.name, name)
    }

    pub(crate) fn assign_palette_color(&mut self, index: usize) {
        if !self.color_pinned {
            self.color = COHORT_PALETTE[index % COHORT_PALETTE.len()].to_string();
        }
    }

    pub(crate) fn rename(&mut self, name: &str, monthly_hours: u32) -> Result<(), ModelError> {
        let replacement = Cohort::new(name, monthly_hours)?;
        self.name = replacement.name;
        self.monthly_hours = replacement.monthly_hours;
        Ok(())
    }
}

/// A titled run of sessions attended by one or more cohorts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub title: String,
    pub sessions: Vec<Session>,
    pub cohorts: Vec<String>,
}

impl Schedule {
    pub fn new(title: impl Into<String>, sessions: Vec<Session>, cohorts: Vec<String>) -> Self {
        Self {
            title: title.into(),
            sessions,
            cohorts,
        }
    }

    pub fn includes_cohort(&self, name: &str) -> bool {
        self.cohorts.iter().any(|cohort| same_cohort_name(cohort, name))
    }

    pub fn total_hours(&self) -> f64 {
        crate::budget::total_hours(&self.sessions)
    }

    pub fn sessions_in(&self, month: YearMonth) -> impl Iterator<Item = &Session> {
        self.sessions
            .iter()
            .filter(move |session| month.contains(session.date()))
    }

    pub fn session_on(&self, date: NaiveDate) -> Option<&Session> {
        self.sessions.iter().find(|session| session.date() == date)
    }

    pub fn meets_on(&self, date: NaiveDate) -> bool {
        self.session_on(date).is_some()
    }
}
