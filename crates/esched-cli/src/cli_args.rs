use std::str::FromStr;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use esched_core::config::RuntimeOverrides;
use esched_core::model::{YearMonth, parse_clock, parse_date};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "esched", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show each cohort's remaining hours for a month.
    Remaining(RemainingArgs),
    /// List start dates where a multi-day session would fit.
    Suggest(SuggestArgs),
    /// Check a proposed schedule against blackouts and cohort budgets.
    Check(CheckArgs),
    /// Summarize a month's schedules and budgets.
    Overview(MonthArgs),
    /// Render a month grid, or list what meets on one day.
    Calendar(CalendarArgs),
    /// Manage config.toml.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Config management subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Write a config.toml with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Print the effective configuration after runtime overrides.
    Show,
}

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Args, Default)]
pub struct GlobalArgs {
    /// Treat Saturdays and Sundays as schedulable days.
    #[arg(long = "no-weekends", global = true, action = ArgAction::SetTrue)]
    pub no_weekends: bool,

    /// Black out Saturdays and Sundays (the default).
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub weekends: bool,

    /// Toggle quarter-end blackouts for the current year.
    #[arg(
        long = "quarter-ends",
        global = true,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub quarter_ends: Option<bool>,

    /// IANA timezone that decides the current month.
    #[arg(long, global = true, value_name = "TZ")]
    pub timezone: Option<String>,

    /// Maximum number of suggested start dates.
    #[arg(long, global = true, value_name = "N")]
    pub limit: Option<usize>,

    /// Months scanned for suggestions when a proposal is over budget.
    #[arg(long, global = true, value_name = "MONTHS")]
    pub horizon: Option<usize>,

    /// Mirror logs to stderr.
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub json: bool,
}

impl GlobalArgs {
    /// Returns true when no overrides were provided.
    pub fn is_empty(&self) -> bool {
        !self.no_weekends
            && !self.weekends
            && self.quarter_ends.is_none()
            && self.timezone.is_none()
            && self.limit.is_none()
            && self.horizon.is_none()
    }

    /// Convert CLI flags into runtime overrides plus any advisory warnings.
    pub fn to_runtime_overrides(&self) -> Result<(RuntimeOverrides, Vec<String>), String> {
        let mut overrides = RuntimeOverrides::default();
        let mut warnings = Vec::new();

        if self.no_weekends && self.weekends {
            return Err("Cannot combine --weekends with --no-weekends.".into());
        } else if self.no_weekends {
            overrides.exclude_weekends = Some(false);
        } else if self.weekends {
            overrides.exclude_weekends = Some(true);
        }

        overrides.quarter_end_blackouts = self.quarter_ends;

        if let Some(timezone) = self.timezone.as_deref() {
            match parse_optional_field(timezone) {
                Some(value) => overrides.timezone = Some(value),
                None => warnings.push("Ignoring empty --timezone value.".to_string()),
            }
        }

        if let Some(limit) = self.limit {
            if limit == 0 {
                return Err("--limit must be at least 1.".into());
            }
            overrides.suggestion_limit = Some(limit);
        }

        if let Some(months) = self.horizon {
            if months == 0 {
                return Err("--horizon must be at least 1 month.".into());
            }
            overrides.suggestion_horizon_months = Some(months);
        }

        Ok((overrides, warnings))
    }
}

/// Plan document and target month shared by the read-only queries.
#[derive(Debug, Clone, Args)]
pub struct MonthArgs {
    /// Plan document (TOML) with cohorts, blackouts and schedules.
    #[arg(short, long, value_hint = ValueHint::FilePath, value_name = "FILE")]
    pub plan: String,

    /// Month to inspect (YYYY-MM); defaults to the current month.
    #[arg(short, long, value_name = "YYYY-MM")]
    pub month: Option<YearMonth>,
}

#[derive(Debug, Clone, Args)]
pub struct RemainingArgs {
    #[command(flatten)]
    pub target: MonthArgs,

    /// Only report this cohort.
    #[arg(short, long, value_name = "NAME")]
    pub cohort: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub target: MonthArgs,

    /// Consecutive days the session runs.
    #[arg(long, value_name = "N")]
    pub days: usize,

    /// Hours each day consumes from every selected cohort.
    #[arg(long = "hours-per-day", value_name = "HOURS", default_value_t = 8.0)]
    pub hours_per_day: f64,

    /// Attending cohort; repeat for several.
    #[arg(short, long = "cohort", value_name = "NAME", required = true)]
    pub cohorts: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Plan document (TOML) with cohorts, blackouts and schedules.
    #[arg(short, long, value_hint = ValueHint::FilePath, value_name = "FILE")]
    pub plan: String,

    /// Budget month (YYYY-MM); defaults to the month of the first session.
    #[arg(short, long, value_name = "YYYY-MM")]
    pub month: Option<YearMonth>,

    #[arg(short, long)]
    pub title: String,

    /// Attending cohort; repeat for several.
    #[arg(short, long = "cohort", value_name = "NAME", required = true)]
    pub cohorts: Vec<String>,

    /// Session as DATE or DATE@HH:MM-HH:MM; repeat for several.
    #[arg(short, long = "session", value_name = "SESSION", required = true)]
    pub sessions: Vec<SessionSpec>,
}

#[derive(Debug, Clone, Args)]
pub struct CalendarArgs {
    #[command(flatten)]
    pub target: MonthArgs,

    /// List the schedules meeting on this day instead of the month grid.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub day: Option<NaiveDate>,
}

/// A `--session` value; a missing window falls back to the configured default times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub date: NaiveDate,
    pub window: Option<(String, String)>,
}

impl FromStr for SessionSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (date, window) = match value.split_once('@') {
            Some((date, window)) => (date, Some(window)),
            None => (value, None),
        };
        let date = parse_date(date).map_err(|err| err.to_string())?;
        let window = match window {
            None => None,
            Some(window) => {
                let (start, end) = window
                    .split_once('-')
                    .ok_or_else(|| format!("invalid session window '{window}' (expected HH:MM-HH:MM)"))?;
                parse_clock(start).map_err(|err| err.to_string())?;
                parse_clock(end).map_err(|err| err.to_string())?;
                Some((start.trim().to_string(), end.trim().to_string()))
            }
        };
        Ok(Self { date, window })
    }
}

fn parse_optional_field(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || matches!(
            trimmed.to_ascii_lowercase().as_str(),
            "none" | "null" | "unset"
        )
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}
