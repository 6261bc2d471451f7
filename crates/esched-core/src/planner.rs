use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::blackout::BlackoutCalendar;
use crate::budget::{CohortLimit, check_cohort_limits, remaining_hours, total_hours};
use crate::model::{Cohort, ModelError, Schedule, YearMonth, same_cohort_name};
use crate::suggest::{
    DEFAULT_SUGGESTION_HORIZON, DEFAULT_SUGGESTION_LIMIT, SchedulingContext, SuggestionRequest,
    find_suggestions, find_suggestions_across,
};

/// Errors surfaced by planner state changes.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("a cohort named '{0}' already exists")]
    DuplicateCohort(String),
    #[error("cohort '{0}' not found")]
    UnknownCohort(String),
    #[error("schedule title cannot be empty")]
    EmptyTitle,
    #[error("schedule '{0}' has no sessions")]
    NoSessions(String),
    #[error("session on {0} falls on a blackout date")]
    BlackoutConflict(NaiveDate),
    /// Carries the rejected proposal's report, suggestions included.
    #[error("cohorts over their monthly hour limit: {}", over_limit_names(&.0.limits))]
    BudgetExceeded(ProposalReport),
}

fn over_limit_names(limits: &[CohortLimit]) -> String {
    limits
        .iter()
        .filter(|limit| limit.over_limit)
        .map(|limit| limit.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of checking a proposed schedule against the cohorts' budgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalReport {
    pub month: String,
    pub total_hours: f64,
    pub limits: Vec<CohortLimit>,
    /// Alternative start dates, only filled when some cohort is over its limit.
    /// The scan starts in the target month and continues into later ones.
    pub suggestions: Vec<NaiveDate>,
}

impl ProposalReport {
    pub fn is_over_limit(&self) -> bool {
        self.limits.iter().any(|limit| limit.over_limit)
    }
}

/// In-memory planning state: the cohort registry, recorded schedules and blackouts.
#[derive(Debug, Clone)]
pub struct Planner {
    cohorts: Vec<Cohort>,
    schedules: Vec<Schedule>,
    blackouts: BlackoutCalendar,
    suggestion_limit: usize,
    suggestion_horizon: usize,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(BlackoutCalendar::default())
    }
}

impl Planner {
    pub fn new(blackouts: BlackoutCalendar) -> Self {
        Self {
            cohorts: Vec::new(),
            schedules: Vec::new(),
            blackouts,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            suggestion_horizon: DEFAULT_SUGGESTION_HORIZON,
        }
    }

    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// Number of months (target month included) searched for alternatives.
    pub fn with_suggestion_horizon(mut self, months: usize) -> Self {
        self.suggestion_horizon = months;
        self
    }

    pub fn suggestion_limit(&self) -> usize {
        self.suggestion_limit
    }

    pub fn suggestion_horizon(&self) -> usize {
        self.suggestion_horizon
    }

    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn cohort(&self, name: &str) -> Option<&Cohort> {
        self.cohorts.iter().find(|cohort| cohort.is_named(name))
    }

    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn blackouts(&self) -> &BlackoutCalendar {
        &self.blackouts
    }

    pub fn context(&self) -> SchedulingContext<'_> {
        SchedulingContext {
            cohorts: &self.cohorts,
            schedules: &self.schedules,
            blackouts: &self.blackouts,
        }
    }

    /// Register a cohort; names are unique regardless of case.
    pub fn add_cohort(&mut self, cohort: Cohort) -> Result<&Cohort, PlannerError> {
        if self.cohort(cohort.name()).is_some() {
            return Err(PlannerError::DuplicateCohort(cohort.name().to_string()));
        }
        info!(
            cohort = cohort.name(),
            monthly_hours = cohort.monthly_hours(),
            "Cohort added"
        );
        let index = self.cohorts.len();
        self.cohorts.push(cohort);
        self.assign_colors();
        Ok(&self.cohorts[index])
    }

    /// Rename and/or re-budget a cohort. Schedules follow the new name.
    pub fn update_cohort(
        &mut self,
        original: &str,
        name: &str,
        monthly_hours: u32,
    ) -> Result<(), PlannerError> {
        let index = self
            .cohorts
            .iter()
            .position(|cohort| cohort.is_named(original))
            .ok_or_else(|| PlannerError::UnknownCohort(original.to_string()))?;

        let clash = self
            .cohorts
            .iter()
            .enumerate()
            .any(|(other, cohort)| other != index && cohort.is_named(name));
        if clash {
            return Err(PlannerError::DuplicateCohort(name.trim().to_string()));
        }

        let previous = self.cohorts[index].name().to_string();
        self.cohorts[index].rename(name, monthly_hours)?;
        let current = self.cohorts[index].name().to_string();

        if previous != current {
            for schedule in &mut self.schedules {
                for entry in &mut schedule.cohorts {
                    if same_cohort_name(entry, &previous) {
                        *entry = current.clone();
                    }
                }
            }
        }
        info!(from = %previous, to = %current, monthly_hours, "Cohort updated");
        Ok(())
    }

    fn assign_colors(&mut self) {
        for (index, cohort) in self.cohorts.iter_mut().enumerate() {
            cohort.assign_palette_color(index);
        }
    }

    pub fn remaining_hours(&self, cohort: &str, month: YearMonth) -> f64 {
        remaining_hours(cohort, month, &self.cohorts, &self.schedules)
    }

    pub fn suggest(&self, request: &SuggestionRequest, month: YearMonth) -> Vec<NaiveDate> {
        find_suggestions(request, month, self.context())
    }

    /// Check a proposal's hours against every selected cohort for `month`.
    pub fn evaluate(&self, proposal: &Schedule, month: YearMonth) -> ProposalReport {
        let limits = check_cohort_limits(
            &proposal.sessions,
            &proposal.cohorts,
            month,
            &self.cohorts,
            &self.schedules,
        );
        let mut report = ProposalReport {
            month: month.to_string(),
            total_hours: total_hours(&proposal.sessions),
            limits,
            suggestions: Vec::new(),
        };
        if report.is_over_limit() {
            let request =
                SuggestionRequest::for_sessions(&proposal.sessions, proposal.cohorts.clone())
                    .with_limit(self.suggestion_limit);
            report.suggestions =
                find_suggestions_across(&request, month, self.suggestion_horizon, self.context());
        }
        report
    }

    /// Record a new schedule if it avoids blackouts and fits every cohort's budget,
    /// returning the budget report it was accepted on.
    ///
    /// Nothing is recorded on failure; a budget overrun carries suggested start dates.
    pub fn create_schedule(
        &mut self,
        proposal: Schedule,
        month: YearMonth,
    ) -> Result<ProposalReport, PlannerError> {
        Self::validate_shape(&proposal)?;
        if let Some(session) = proposal
            .sessions
            .iter()
            .find(|session| self.blackouts.is_blackout(session.date()))
        {
            return Err(PlannerError::BlackoutConflict(session.date()));
        }

        let report = self.evaluate(&proposal, month);
        if report.is_over_limit() {
            warn!(
                title = %proposal.title,
                %month,
                over = %over_limit_names(&report.limits),
                suggestions = report.suggestions.len(),
                "Schedule exceeds monthly hour limits"
            );
            return Err(PlannerError::BudgetExceeded(report));
        }

        self.push_schedule(proposal);
        Ok(report)
    }

    /// Record an already-agreed schedule without budget or blackout checks.
    pub fn import_schedule(&mut self, schedule: Schedule) -> Result<&Schedule, PlannerError> {
        Self::validate_shape(&schedule)?;
        Ok(self.push_schedule(schedule))
    }

    fn push_schedule(&mut self, schedule: Schedule) -> &Schedule {
        info!(
            title = %schedule.title,
            sessions = schedule.sessions.len(),
            cohorts = %schedule.cohorts.join(", "),
            "Schedule recorded"
        );
        self.schedules.push(schedule);
        let last = self.schedules.len() - 1;
        &self.schedules[last]
    }

    fn validate_shape(schedule: &Schedule) -> Result<(), PlannerError> {
        if schedule.title.trim().is_empty() {
            return Err(PlannerError::EmptyTitle);
        }
        if schedule.sessions.is_empty() {
            return Err(PlannerError::NoSessions(schedule.title.clone()));
        }
        Ok(())
    }
}
