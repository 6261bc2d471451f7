//! TOML plan documents: cohorts, blackouts and already-agreed schedules.
//!
//! ```toml
//! [[cohorts]]
//! name = "Alpha"
//! monthly_hours = 40
//!
//! [blackouts]
//! quarter_ends = [2026]
//! ranges = [{ start = "2026-12-21", end = "2027-01-01" }]
//!
//! [[schedules]]
//! title = "Kickoff"
//! cohorts = ["Alpha"]
//! sessions = [{ date = "2026-10-05", start = "09:00", end = "12:00" }]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::blackout::BlackoutCalendar;
use crate::model::{
    Cohort, DEFAULT_SESSION_END, DEFAULT_SESSION_START, ModelError, Schedule, Session,
};
use crate::planner::{Planner, PlannerError};
use crate::suggest::{DEFAULT_SUGGESTION_HORIZON, DEFAULT_SUGGESTION_LIMIT};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse plan {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid plan: {0}")]
    Syntax(#[from] toml::de::Error),
    #[error("cohort '{name}': {source}")]
    Cohort { name: String, source: PlannerError },
    #[error("schedule '{title}': {source}")]
    Schedule { title: String, source: PlannerError },
    #[error("blackouts: {0}")]
    Blackout(#[from] ModelError),
}

/// Settings applied while turning a document into a [`Planner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerSettings {
    /// Used when the document does not say whether weekends are excluded.
    pub exclude_weekends: bool,
    /// Years whose quarter-end fortnights are blacked out in addition to the document's.
    pub quarter_end_years: Vec<i32>,
    pub suggestion_limit: usize,
    pub suggestion_horizon: usize,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            exclude_weekends: true,
            quarter_end_years: Vec::new(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            suggestion_horizon: DEFAULT_SUGGESTION_HORIZON,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub cohorts: Vec<CohortEntry>,
    #[serde(default)]
    pub blackouts: BlackoutEntry,
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortEntry {
    pub name: String,
    pub monthly_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlackoutEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekends: Option<bool>,
    #[serde(default)]
    pub quarter_ends: Vec<i32>,
    #[serde(default)]
    pub ranges: Vec<RangeEntry>,
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub title: String,
    #[serde(default)]
    pub cohorts: Vec<String>,
    #[serde(default)]
    pub sessions: Vec<SessionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub date: NaiveDate,
    #[serde(default = "SessionEntry::default_start")]
    pub start: String,
    #[serde(default = "SessionEntry::default_end")]
    pub end: String,
}

impl SessionEntry {
    fn default_start() -> String {
        DEFAULT_SESSION_START.to_string()
    }

    fn default_end() -> String {
        DEFAULT_SESSION_END.to_string()
    }
}

impl PlanDocument {
    pub fn from_toml_str(raw: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(raw)?)
    }

    /// Build the in-memory planner. Recorded schedules are imported as history,
    /// so only their shape and session times are validated.
    pub fn into_planner(self, settings: &PlannerSettings) -> Result<Planner, PlanError> {
        let mut blackouts = BlackoutCalendar::new(
            self.blackouts
                .weekends
                .unwrap_or(settings.exclude_weekends),
        );
        for year in settings
            .quarter_end_years
            .iter()
            .chain(self.blackouts.quarter_ends.iter())
        {
            blackouts.add_quarter_ends(*year)?;
        }
        for range in &self.blackouts.ranges {
            blackouts.add_range(range.start, range.end)?;
        }
        for date in &self.blackouts.dates {
            blackouts.add_date(*date);
        }

        let mut planner = Planner::new(blackouts)
            .with_suggestion_limit(settings.suggestion_limit)
            .with_suggestion_horizon(settings.suggestion_horizon);

        for entry in self.cohorts {
            let cohort = Cohort::new(&entry.name, entry.monthly_hours)
                .map(|cohort| match entry.color.as_deref() {
                    Some(color) if !color.trim().is_empty() => cohort.with_color(color),
                    _ => cohort,
                })
                .map_err(PlannerError::from)
                .and_then(|cohort| planner.add_cohort(cohort).map(|_| ()));
            if let Err(source) = cohort {
                return Err(PlanError::Cohort {
                    name: entry.name,
                    source,
                });
            }
        }

        for entry in self.schedules {
            let schedule = entry
                .to_schedule()
                .map_err(PlannerError::from)
                .and_then(|schedule| planner.import_schedule(schedule).map(|_| ()));
            if let Err(source) = schedule {
                return Err(PlanError::Schedule {
                    title: entry.title,
                    source,
                });
            }
        }

        Ok(planner)
    }
}

impl ScheduleEntry {
    pub fn to_schedule(&self) -> Result<Schedule, ModelError> {
        let sessions = self
            .sessions
            .iter()
            .map(|session| Session::parse(session.date, &session.start, &session.end))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Schedule::new(
            self.title.clone(),
            sessions,
            self.cohorts.clone(),
        ))
    }
}

/// Expand `~` in a user-supplied plan path.
pub fn expand_plan_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

pub fn load_plan(path: &Path) -> Result<PlanDocument, PlanError> {
    let raw = fs::read_to_string(path).map_err(|source| PlanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document = toml::from_str::<PlanDocument>(&raw).map_err(|source| PlanError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        cohorts = document.cohorts.len(),
        schedules = document.schedules.len(),
        "Loaded plan"
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::YearMonth;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const SAMPLE: &str = r##"
[[cohorts]]
name = "Alpha"
monthly_hours = 40

[[cohorts]]
name = "Beta"
monthly_hours = 16
color = "#123456"

[blackouts]
ranges = [{ start = "2026-10-12", end = "2026-10-14" }]
dates = ["2026-10-30"]

[[schedules]]
title = "Kickoff"
cohorts = ["Alpha", "Beta"]
sessions = [
    { date = "2026-10-05" },
    { date = "2026-10-06", start = "13:00", end = "15:00" },
]
"##;

    #[test]
    fn test_sample_plan_builds_planner() {
        let planner = PlanDocument::from_toml_str(SAMPLE)
            .unwrap()
            .into_planner(&PlannerSettings::default())
            .unwrap();

        let october = YearMonth::new(2026, 10).unwrap();
        assert_eq!(planner.cohorts().len(), 2);
        assert_eq!(planner.cohort("beta").unwrap().color(), "#123456");
        assert_eq!(planner.remaining_hours("Alpha", october), 30.0);
        assert_eq!(planner.remaining_hours("Beta", october), 6.0);
        assert!(planner.blackouts().is_blackout(date(2026, 10, 13)));
        assert!(planner.blackouts().is_blackout(date(2026, 10, 30)));
        assert!(planner.blackouts().is_blackout(date(2026, 10, 17)));
    }

    #[test]
    fn test_document_can_disable_weekends() {
        let raw = "[blackouts]\nweekends = false\n";
        let planner = PlanDocument::from_toml_str(raw)
            .unwrap()
            .into_planner(&PlannerSettings::default())
            .unwrap();
        assert!(!planner.blackouts().excludes_weekends());
    }

    #[test]
    fn test_settings_add_quarter_ends() {
        let settings = PlannerSettings {
            quarter_end_years: vec![2026],
            ..PlannerSettings::default()
        };
        let planner = PlanDocument::default().into_planner(&settings).unwrap();
        assert!(planner.blackouts().is_blackout(date(2026, 9, 17)));
    }

    #[test]
    fn test_duplicate_cohort_reports_name() {
        let raw = r#"
[[cohorts]]
name = "Alpha"
monthly_hours = 40

[[cohorts]]
name = "alpha"
monthly_hours = 10
"#;
        let err = PlanDocument::from_toml_str(raw)
            .unwrap()
            .into_planner(&PlannerSettings::default())
            .unwrap_err();
        assert!(matches!(err, PlanError::Cohort { ref name, .. } if name == "alpha"));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_bad_session_time_reports_schedule() {
        let raw = r#"
[[schedules]]
title = "Broken"
cohorts = ["Alpha"]
sessions = [{ date = "2026-10-05", start = "17:00", end = "09:00" }]
"#;
        let err = PlanDocument::from_toml_str(raw)
            .unwrap()
            .into_planner(&PlannerSettings::default())
            .unwrap_err();
        assert!(matches!(err, PlanError::Schedule { ref title, .. } if title == "Broken"));
    }

    #[test]
    fn test_inverted_blackout_range_rejected() {
        let raw = r#"
[blackouts]
ranges = [{ start = "2026-10-14", end = "2026-10-12" }]
"#;
        let err = PlanDocument::from_toml_str(raw)
            .unwrap()
            .into_planner(&PlannerSettings::default())
            .unwrap_err();
        assert!(matches!(err, PlanError::Blackout(ModelError::InvertedRange { .. })));
    }

    #[test]
    fn test_load_plan_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("plan.toml");
        fs::write(&path, SAMPLE).expect("write plan");

        let document = load_plan(&path).expect("load plan");
        assert_eq!(document.schedules[0].sessions[0].start, "09:00");

        let missing = load_plan(&temp.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, PlanError::Read { .. }));
    }
}
