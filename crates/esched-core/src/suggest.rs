//! Alternative start dates for proposals that do not fit.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::blackout::BlackoutCalendar;
use crate::budget::{minutes_to_hours, remaining_minutes, total_minutes};
use crate::model::{Cohort, Schedule, Session, YearMonth};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;
/// Months scanned (target month included) when looking past an exhausted budget.
pub const DEFAULT_SUGGESTION_HORIZON: usize = 6;

/// What a proposed schedule needs: consecutive days, minutes and attending cohorts.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRequest {
    pub days_needed: usize,
    pub total_minutes: i64,
    pub cohorts: Vec<String>,
    pub limit: usize,
}

impl SuggestionRequest {
    pub fn per_day(days_needed: usize, hours_per_day: f64, cohorts: Vec<String>) -> Self {
        Self {
            days_needed,
            total_minutes: (days_needed as f64 * hours_per_day * 60.0).round() as i64,
            cohorts,
            limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    /// One day per proposed session, with the sessions' combined hours.
    pub fn for_sessions(sessions: &[Session], cohorts: Vec<String>) -> Self {
        Self {
            days_needed: sessions.len(),
            total_minutes: total_minutes(sessions),
            cohorts,
            limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn total_hours(&self) -> f64 {
        minutes_to_hours(self.total_minutes)
    }
}

/// Read-only view of the state a suggestion scan runs against.
#[derive(Debug, Clone, Copy)]
pub struct SchedulingContext<'a> {
    pub cohorts: &'a [Cohort],
    pub schedules: &'a [Schedule],
    pub blackouts: &'a BlackoutCalendar,
}

impl SchedulingContext<'_> {
    /// Days already claimed by any session of any schedule.
    pub fn is_booked(&self, date: NaiveDate) -> bool {
        self.schedules.iter().any(|schedule| schedule.meets_on(date))
    }

    /// Days of `month` that are neither blacked out nor booked.
    pub fn open_days(&self, month: YearMonth) -> BTreeSet<NaiveDate> {
        month
            .days()
            .filter(|day| !self.blackouts.is_blackout(*day) && !self.is_booked(*day))
            .collect()
    }

    fn budget_allows(&self, request: &SuggestionRequest, month: YearMonth) -> bool {
        request.cohorts.iter().all(|cohort| {
            let left = remaining_minutes(cohort, month, self.cohorts, self.schedules);
            request.total_minutes <= left
        })
    }
}

/// Earliest start dates in `month` whose whole run of days is open, in calendar order.
///
/// Every selected cohort must also be able to absorb the request's hours; the
/// budget does not depend on the start day, so a shortfall yields no dates at all.
pub fn find_suggestions(
    request: &SuggestionRequest,
    month: YearMonth,
    context: SchedulingContext<'_>,
) -> Vec<NaiveDate> {
    if request.days_needed == 0 || request.limit == 0 {
        return Vec::new();
    }

    if !context.budget_allows(request, month) {
        debug!(
            %month,
            total_hours = request.total_hours(),
            "No suggestions: selected cohorts lack budget"
        );
        return Vec::new();
    }

    let open = context.open_days(month);
    let span = (request.days_needed - 1) as u64;
    let last_day = month.last_day();

    let suggestions: Vec<NaiveDate> = open
        .iter()
        .copied()
        .filter(|start| {
            let Some(end) = start.checked_add_days(Days::new(span)) else {
                return false;
            };
            end <= last_day
                && start
                    .iter_days()
                    .take_while(|day| *day <= end)
                    .all(|day| open.contains(&day))
        })
        .take(request.limit)
        .collect();

    debug!(
        %month,
        days_needed = request.days_needed,
        open_days = open.len(),
        found = suggestions.len(),
        "Scanned month for start dates"
    );
    suggestions
}

/// Scan `months` consecutive months starting at `first`, each against its own budget.
///
/// Stops as soon as the request's limit is reached.
pub fn find_suggestions_across(
    request: &SuggestionRequest,
    first: YearMonth,
    months: usize,
    context: SchedulingContext<'_>,
) -> Vec<NaiveDate> {
    let mut found = Vec::new();
    let mut month = Some(first);
    for _ in 0..months {
        let Some(current) = month else {
            break;
        };
        let remaining = request.limit.saturating_sub(found.len());
        if remaining == 0 {
            break;
        }
        let scoped = SuggestionRequest {
            limit: remaining,
            ..request.clone()
        };
        found.extend(find_suggestions(&scoped, current, context));
        month = current.next();
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn october() -> YearMonth {
        YearMonth::new(2026, 10).unwrap()
    }

    fn alpha() -> Vec<Cohort> {
        vec![Cohort::new("Alpha", 40).unwrap()]
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_weekends_never_suggested() {
        let cohorts = alpha();
        let blackouts = BlackoutCalendar::default();
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &[],
            blackouts: &blackouts,
        };
        let request = SuggestionRequest::per_day(1, 8.0, names(&["Alpha"])).with_limit(31);

        let found = find_suggestions(&request, october(), context);

        assert_eq!(found.len(), 22);
        assert!(
            found
                .iter()
                .all(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        );
    }

    #[test]
    fn test_returns_three_earliest_in_order() {
        let cohorts = alpha();
        let blackouts = BlackoutCalendar::default();
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &[],
            blackouts: &blackouts,
        };
        let request = SuggestionRequest::per_day(2, 4.0, names(&["Alpha"]));

        let found = find_suggestions(&request, october(), context);

        // Oct 1 2026 is a Thursday; Friday the 2nd cannot start a two-day run.
        assert_eq!(found, vec![date(2026, 10, 1), date(2026, 10, 5), date(2026, 10, 6)]);
    }

    #[test]
    fn test_span_avoids_booked_days_and_blackouts() {
        let cohorts = alpha();
        let mut blackouts = BlackoutCalendar::default();
        blackouts.add_date(date(2026, 10, 7));
        let schedules = vec![Schedule::new(
            "Existing",
            vec![Session::parse(date(2026, 10, 13), "09:00", "10:00").unwrap()],
            names(&["Alpha"]),
        )];
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &schedules,
            blackouts: &blackouts,
        };
        let request = SuggestionRequest::per_day(3, 2.0, names(&["Alpha"])).with_limit(10);

        let found = find_suggestions(&request, october(), context);

        for start in &found {
            for offset in 0..3 {
                let day = *start + Days::new(offset);
                assert!(!blackouts.is_blackout(day), "{day} is blacked out");
                assert!(!context.is_booked(day), "{day} is booked");
                assert!(october().contains(day));
            }
        }
        assert_eq!(found.first(), Some(&date(2026, 10, 14)));
    }

    #[test]
    fn test_run_must_fit_inside_month() {
        let cohorts = alpha();
        let blackouts = BlackoutCalendar::new(false);
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &[],
            blackouts: &blackouts,
        };
        let request = SuggestionRequest::per_day(5, 1.0, Vec::new()).with_limit(100);

        let found = find_suggestions(&request, october(), context);

        assert_eq!(found.len(), 27);
        assert_eq!(found.last(), Some(&date(2026, 10, 27)));
    }

    #[test]
    fn test_insufficient_budget_yields_nothing() {
        let cohorts = vec![
            Cohort::new("Alpha", 40).unwrap(),
            Cohort::new("Beta", 8).unwrap(),
        ];
        let blackouts = BlackoutCalendar::default();
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &[],
            blackouts: &blackouts,
        };
        let request = SuggestionRequest::per_day(2, 8.0, names(&["Alpha", "Beta"]));

        assert!(find_suggestions(&request, october(), context).is_empty());
    }

    #[test]
    fn test_unknown_cohort_blocks_suggestions() {
        let cohorts = alpha();
        let blackouts = BlackoutCalendar::default();
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &[],
            blackouts: &blackouts,
        };
        let request = SuggestionRequest::per_day(1, 1.0, names(&["Gamma"]));

        assert!(find_suggestions(&request, october(), context).is_empty());
    }

    #[test]
    fn test_zero_days_yields_nothing() {
        let cohorts = alpha();
        let blackouts = BlackoutCalendar::default();
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &[],
            blackouts: &blackouts,
        };
        let request = SuggestionRequest::per_day(0, 8.0, names(&["Alpha"]));

        assert!(find_suggestions(&request, october(), context).is_empty());
    }

    #[test]
    fn test_search_moves_on_to_months_with_budget() {
        let cohorts = vec![Cohort::new("Alpha", 16).unwrap()];
        let blackouts = BlackoutCalendar::default();
        let schedules = vec![Schedule::new(
            "Booked",
            vec![Session::full_day(date(2026, 10, 5)).unwrap()],
            names(&["Alpha"]),
        )];
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &schedules,
            blackouts: &blackouts,
        };
        let request = SuggestionRequest::per_day(2, 8.0, names(&["Alpha"]));

        assert!(find_suggestions(&request, october(), context).is_empty());
        let found = find_suggestions_across(&request, october(), 3, context);
        assert_eq!(
            found,
            vec![date(2026, 11, 2), date(2026, 11, 3), date(2026, 11, 4)]
        );

        assert!(find_suggestions_across(&request, october(), 1, context).is_empty());
    }

    #[test]
    fn test_request_from_sessions() {
        let sessions = vec![
            Session::full_day(date(2026, 10, 5)).unwrap(),
            Session::parse(date(2026, 10, 6), "13:00", "15:30").unwrap(),
        ];
        let request = SuggestionRequest::for_sessions(&sessions, names(&["Alpha"]));
        assert_eq!(request.days_needed, 2);
        assert_eq!(request.total_minutes, 630);
        assert_eq!(request.total_hours(), 10.5);
        assert_eq!(request.limit, DEFAULT_SUGGESTION_LIMIT);
    }

    #[test]
    fn test_request_that_exactly_uses_the_budget_still_gets_dates() {
        let cohorts = vec![Cohort::new("Alpha", 2).unwrap()];
        let blackouts = BlackoutCalendar::default();
        let schedules = vec![Schedule::new(
            "Standups",
            vec![
                Session::parse(date(2026, 10, 1), "09:00", "09:01").unwrap(),
                Session::parse(date(2026, 10, 2), "09:00", "09:12").unwrap(),
            ],
            names(&["Alpha"]),
        )];
        let context = SchedulingContext {
            cohorts: &cohorts,
            schedules: &schedules,
            blackouts: &blackouts,
        };
        let sessions = vec![Session::parse(date(2026, 10, 5), "09:00", "10:47").unwrap()];
        let request = SuggestionRequest::for_sessions(&sessions, names(&["Alpha"]));

        let found = find_suggestions(&request, october(), context);

        assert_eq!(found, vec![date(2026, 10, 5), date(2026, 10, 6), date(2026, 10, 7)]);
    }

    #[test]
    fn test_per_day_hours_round_to_whole_minutes() {
        let request = SuggestionRequest::per_day(3, 0.1, names(&["Alpha"]));
        assert_eq!(request.total_minutes, 18);
    }
}
