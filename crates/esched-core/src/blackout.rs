use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use tracing::debug;

use crate::model::{ModelError, YearMonth};

/// Days counted back from each quarter's last day (inclusive) for quarter-end freezes.
pub const QUARTER_END_BLACKOUT_DAYS: u64 = 14;

/// Days excluded from scheduling: explicit dates plus an optional weekend rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlackoutCalendar {
    exclude_weekends: bool,
    dates: BTreeSet<NaiveDate>,
}

impl Default for BlackoutCalendar {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BlackoutCalendar {
    pub fn new(exclude_weekends: bool) -> Self {
        Self {
            exclude_weekends,
            dates: BTreeSet::new(),
        }
    }

    pub fn excludes_weekends(&self) -> bool {
        self.exclude_weekends
    }

    pub fn add_date(&mut self, date: NaiveDate) {
        self.dates.insert(date);
    }

    /// Black out every day from `start` through `end`.
    pub fn add_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<usize, ModelError> {
        if end < start {
            return Err(ModelError::InvertedRange { start, end });
        }
        let before = self.dates.len();
        self.dates
            .extend(start.iter_days().take_while(|day| *day <= end));
        let added = self.dates.len() - before;
        debug!(%start, %end, added, "Added blackout range");
        Ok(added)
    }

    /// Black out the final two weeks of each quarter of `year`.
    pub fn add_quarter_ends(&mut self, year: i32) -> Result<usize, ModelError> {
        let mut added = 0;
        for quarter_end_month in [3, 6, 9, 12] {
            let end = YearMonth::new(year, quarter_end_month)?.last_day();
            let start = end
                .checked_sub_days(Days::new(QUARTER_END_BLACKOUT_DAYS - 1))
                .ok_or_else(|| ModelError::InvalidDate(end.to_string()))?;
            added += self.add_range(start, end)?;
        }
        Ok(added)
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_blackout(&self, date: NaiveDate) -> bool {
        (self.exclude_weekends && Self::is_weekend(date)) || self.dates.contains(&date)
    }

    /// Explicitly listed dates, excluding the weekend rule.
    pub fn explicit_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    /// Blacked-out days of `month` in calendar order.
    pub fn blackouts_in(&self, month: YearMonth) -> Vec<NaiveDate> {
        month.days().filter(|day| self.is_blackout(*day)).collect()
    }
}
