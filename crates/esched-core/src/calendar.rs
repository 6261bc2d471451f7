use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::model::YearMonth;
use crate::planner::Planner;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub blackout: bool,
    /// Distinct colors of the cohorts meeting that day, first-seen order.
    pub colors: Vec<String>,
}

/// Month grid data: blank cells before the 1st (weeks start on Sunday) and one cell per day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub month: String,
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
}

/// One schedule meeting on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEntry {
    pub title: String,
    pub cohorts: Vec<String>,
    pub window: String,
}

impl MonthView {
    pub fn build(planner: &Planner, month: YearMonth) -> Self {
        let days = month
            .days()
            .map(|date| DayCell {
                date,
                blackout: planner.blackouts().is_blackout(date),
                colors: colors_on(planner, date),
            })
            .collect();

        Self {
            month: month.to_string(),
            leading_blanks: month.first_day().weekday().num_days_from_sunday(),
            days,
        }
    }
}

fn colors_on(planner: &Planner, date: NaiveDate) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    let cohorts = planner
        .schedules()
        .iter()
        .filter(|schedule| schedule.meets_on(date))
        .flat_map(|schedule| schedule.cohorts.iter());
    for name in cohorts {
        let Some(cohort) = planner.cohort(name) else {
            continue;
        };
        if !colors.iter().any(|color| color == cohort.color()) {
            colors.push(cohort.color().to_string());
        }
    }
    colors
}

/// Schedules meeting on `date`, with that day's session window.
pub fn schedules_on(planner: &Planner, date: NaiveDate) -> Vec<DayEntry> {
    planner
        .schedules()
        .iter()
        .filter_map(|schedule| {
            schedule.session_on(date).map(|session| DayEntry {
                title: schedule.title.clone(),
                cohorts: schedule.cohorts.clone(),
                window: session.window(),
            })
        })
        .collect()
}
