//! Monthly hour budgets per cohort.
//!
//! All functions here are total: an unknown cohort simply has no budget left.
//! Bookings are summed in whole minutes and only turned into hours for output,
//! so a proposal that exactly uses up a budget is never flagged as an overrun.

use serde::Serialize;

use crate::model::{Cohort, Schedule, Session, YearMonth};

const MINUTES_PER_HOUR: i64 = 60;

pub fn minutes_to_hours(minutes: i64) -> f64 {
    minutes as f64 / MINUTES_PER_HOUR as f64
}

pub fn total_minutes(sessions: &[Session]) -> i64 {
    sessions.iter().map(Session::minutes).sum()
}

/// Sum of the session lengths in fractional hours.
pub fn total_hours(sessions: &[Session]) -> f64 {
    minutes_to_hours(total_minutes(sessions))
}

/// Minutes already booked for `cohort` by sessions dated inside `month`.
pub fn used_minutes(cohort: &str, month: YearMonth, schedules: &[Schedule]) -> i64 {
    schedules
        .iter()
        .filter(|schedule| schedule.includes_cohort(cohort))
        .flat_map(|schedule| schedule.sessions_in(month))
        .map(Session::minutes)
        .sum()
}

pub fn used_hours(cohort: &str, month: YearMonth, schedules: &[Schedule]) -> f64 {
    minutes_to_hours(used_minutes(cohort, month, schedules))
}

/// Minutes left in the cohort's allotment for `month`, never below zero.
pub fn remaining_minutes(
    cohort: &str,
    month: YearMonth,
    cohorts: &[Cohort],
    schedules: &[Schedule],
) -> i64 {
    let Some(found) = cohorts.iter().find(|candidate| candidate.is_named(cohort)) else {
        return 0;
    };
    let allotted = i64::from(found.monthly_hours()) * MINUTES_PER_HOUR;
    (allotted - used_minutes(found.name(), month, schedules)).max(0)
}

/// Hours left in the cohort's allotment for `month`, never below zero.
pub fn remaining_hours(
    cohort: &str,
    month: YearMonth,
    cohorts: &[Cohort],
    schedules: &[Schedule],
) -> f64 {
    minutes_to_hours(remaining_minutes(cohort, month, cohorts, schedules))
}

/// Budget standing of one cohort against a proposed set of sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortLimit {
    pub name: String,
    pub remaining_hours: f64,
    pub over_limit: bool,
    pub available_hours: f64,
}

/// Evaluate every selected cohort against the proposal's total hours.
pub fn check_cohort_limits(
    proposed: &[Session],
    selected: &[String],
    month: YearMonth,
    cohorts: &[Cohort],
    schedules: &[Schedule],
) -> Vec<CohortLimit> {
    let needed = total_minutes(proposed);
    selected
        .iter()
        .map(|name| {
            let remaining = remaining_minutes(name, month, cohorts, schedules);
            CohortLimit {
                name: name.clone(),
                remaining_hours: minutes_to_hours(remaining),
                over_limit: needed > remaining,
                available_hours: minutes_to_hours((remaining - needed).max(0)),
            }
        })
        .collect()
}
