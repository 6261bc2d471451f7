use serde::Serialize;

use crate::budget::used_hours;
use crate::model::{Session, YearMonth};
use crate::planner::Planner;

/// A schedule trimmed to the sessions that fall inside the overview month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub title: String,
    pub cohorts: Vec<String>,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortBudget {
    pub name: String,
    pub color: String,
    pub monthly_hours: u32,
    pub used_hours: f64,
    pub remaining_hours: f64,
}

/// Everything booked in a month plus each cohort's standing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOverview {
    pub month: String,
    pub schedules: Vec<ScheduleSummary>,
    pub budgets: Vec<CohortBudget>,
}

impl MonthOverview {
    pub fn build(planner: &Planner, month: YearMonth) -> Self {
        let schedules = planner
            .schedules()
            .iter()
            .filter_map(|schedule| {
                let sessions: Vec<Session> = schedule.sessions_in(month).copied().collect();
                (!sessions.is_empty()).then(|| ScheduleSummary {
                    title: schedule.title.clone(),
                    cohorts: schedule.cohorts.clone(),
                    sessions,
                })
            })
            .collect();

        let budgets = planner
            .cohorts()
            .iter()
            .map(|cohort| CohortBudget {
                name: cohort.name().to_string(),
                color: cohort.color().to_string(),
                monthly_hours: cohort.monthly_hours(),
                used_hours: used_hours(cohort.name(), month, planner.schedules()),
                remaining_hours: planner.remaining_hours(cohort.name(), month),
            })
            .collect();

        Self {
            month: month.to_string(),
            schedules,
            budgets,
        }
    }
}
