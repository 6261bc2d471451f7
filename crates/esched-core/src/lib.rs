//! Core library for the enablement scheduler: cohort hour budgets, blackout
//! calendars and start-date suggestions for multi-day training sessions.

pub mod blackout;
pub mod budget;
pub mod calendar;
pub mod config;
pub mod logging;
pub mod model;
pub mod overview;
pub mod plan;
pub mod planner;
pub mod suggest;

pub use blackout::BlackoutCalendar;
pub use budget::{
    CohortLimit, check_cohort_limits, remaining_hours, remaining_minutes, total_hours,
    total_minutes, used_hours, used_minutes,
};
pub use calendar::{DayCell, DayEntry, MonthView, schedules_on};
pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, FileConfig, RuntimeOverrides,
    apply_runtime_overrides, config_directory, config_path, load_config, save_config,
};
pub use logging::{
    LoggingDestination, LoggingError, current_log_path, init_logging, log_directory,
};
pub use model::{Cohort, ModelError, Schedule, Session, YearMonth};
pub use overview::MonthOverview;
pub use plan::{PlanDocument, PlanError, PlannerSettings, expand_plan_path, load_plan};
pub use planner::{Planner, PlannerError, ProposalReport};
pub use suggest::{SchedulingContext, SuggestionRequest, find_suggestions, find_suggestions_across};
