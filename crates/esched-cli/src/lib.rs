//! Command surface for the `esched` binary.

pub mod cli_args;
pub mod hints;
mod render;

use chrono::NaiveDate;
use cli_args::{
    CalendarArgs, CheckArgs, Cli, Command, ConfigCommand, GlobalArgs, MonthArgs, RemainingArgs,
    SessionSpec, SuggestArgs,
};
use esched_core::{
    ConfigSource, FileConfig, LoggingDestination, MonthOverview, MonthView, Planner,
    PlannerError, ProposalReport, Schedule, Session, SuggestionRequest, YearMonth,
    apply_runtime_overrides, config_path, expand_plan_path, init_logging, load_config, load_plan,
    save_config, schedules_on,
};
use serde::Serialize;
use tracing::debug;

use crate::hints::resolve_cohorts;

/// Run one parsed invocation. Errors are user-facing messages.
pub fn run(cli: Cli) -> Result<(), String> {
    if let Err(err) = init_logging(LoggingDestination::for_verbosity(cli.global.verbose)) {
        eprintln!("Warning: logging disabled: {err}");
    }

    dispatch(cli)
}

fn dispatch(cli: Cli) -> Result<(), String> {
    let global = cli.global;
    match cli.command {
        Command::Config(cmd) => handle_config_command(cmd, &global),
        Command::Remaining(args) => remaining(args, &global),
        Command::Suggest(args) => suggest(args, &global),
        Command::Check(args) => check(args, &global),
        Command::Overview(args) => overview(args, &global),
        Command::Calendar(args) => calendar(args, &global),
    }
}

/// Loaded configuration with CLI overrides layered on top; warnings go to stderr.
fn load_settings(global: &GlobalArgs) -> Result<(FileConfig, ConfigSource), String> {
    let load = load_config();
    let mut warnings = load.warnings;
    let mut config = load.config;

    let (overrides, mut override_warnings) = global.to_runtime_overrides()?;
    warnings.append(&mut override_warnings);
    apply_runtime_overrides(&mut config, &overrides, &mut warnings);

    for warning in warnings {
        eprintln!("Warning: {warning}");
    }
    Ok((config, load.source))
}

fn open_planner(plan: &str, config: &FileConfig, month: YearMonth) -> Result<Planner, String> {
    let path = expand_plan_path(plan);
    let document = load_plan(&path).map_err(|err| err.to_string())?;
    let planner = document
        .into_planner(&config.planner_settings(month))
        .map_err(|err| format!("{}: {err}", path.display()))?;
    debug!(
        plan = %path.display(),
        cohorts = planner.cohorts().len(),
        schedules = planner.schedules().len(),
        "Planner ready"
    );
    Ok(planner)
}

/// Planner and target month for the read-only queries.
fn prepare(
    plan: &str,
    month: Option<YearMonth>,
    global: &GlobalArgs,
) -> Result<(Planner, YearMonth), String> {
    let (config, _) = load_settings(global)?;
    let month = month.unwrap_or_else(|| config.current_month());
    let planner = open_planner(plan, &config, month)?;
    Ok((planner, month))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to encode JSON output: {err}"))?;
    println!("{rendered}");
    Ok(())
}

fn remaining(args: RemainingArgs, global: &GlobalArgs) -> Result<(), String> {
    let (planner, month) = prepare(&args.target.plan, args.target.month, global)?;
    let mut budgets = MonthOverview::build(&planner, month).budgets;
    if let Some(name) = args.cohort.as_ref() {
        let resolved = resolve_cohorts(&planner, std::slice::from_ref(name))?;
        budgets.retain(|budget| resolved.contains(&budget.name));
    }

    if global.json {
        return print_json(&budgets);
    }
    print!("{}", render::budgets(month, &budgets));
    Ok(())
}

#[derive(Debug, Serialize)]
struct SuggestOutput {
    month: String,
    days: usize,
    total_hours: f64,
    cohorts: Vec<String>,
    suggestions: Vec<NaiveDate>,
}

fn suggest(args: SuggestArgs, global: &GlobalArgs) -> Result<(), String> {
    if !args.hours_per_day.is_finite() || args.hours_per_day <= 0.0 {
        return Err("--hours-per-day must be a positive number.".into());
    }
    let (planner, month) = prepare(&args.target.plan, args.target.month, global)?;
    let cohorts = resolve_cohorts(&planner, &args.cohorts)?;

    let request = SuggestionRequest::per_day(args.days, args.hours_per_day, cohorts)
        .with_limit(planner.suggestion_limit());
    let suggestions = planner.suggest(&request, month);

    if global.json {
        return print_json(&SuggestOutput {
            month: month.to_string(),
            days: request.days_needed,
            total_hours: request.total_hours(),
            cohorts: request.cohorts,
            suggestions,
        });
    }

    if suggestions.is_empty() {
        println!(
            "No start dates in {month} fit {} day(s) for {}.",
            request.days_needed,
            request.cohorts.join(", ")
        );
        for name in &request.cohorts {
            let left = planner.remaining_hours(name, month);
            if left < request.total_hours() {
                println!(
                    "  {name} has {left:.1} h left but needs {:.1} h.",
                    request.total_hours()
                );
            }
        }
    } else {
        println!("Suggested start dates in {month}:");
        print!("{}", render::dates(&suggestions));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct CheckOutput<'a> {
    title: &'a str,
    accepted: bool,
    #[serde(flatten)]
    report: &'a ProposalReport,
}

fn check(args: CheckArgs, global: &GlobalArgs) -> Result<(), String> {
    let (config, _) = load_settings(global)?;
    check_proposal(&args, &config, global.json)
}

/// Try a proposal against the plan and print its budget report.
///
/// The proposal is evaluated once; an overrun reuses the report carried by
/// the planner error and turns into an `Err` naming the cohorts over budget.
pub fn check_proposal(args: &CheckArgs, config: &FileConfig, json: bool) -> Result<(), String> {
    let sessions = build_sessions(&args.sessions, config)?;
    let month = args
        .month
        .or_else(|| sessions.first().map(|session| YearMonth::of(session.date())))
        .unwrap_or_else(|| config.current_month());
    let mut planner = open_planner(&args.plan, config, month)?;
    let cohorts = resolve_cohorts(&planner, &args.cohorts)?;

    let proposal = Schedule::new(args.title.clone(), sessions, cohorts);
    let (accepted, report) = match planner.create_schedule(proposal, month) {
        Ok(report) => (true, report),
        Err(PlannerError::BudgetExceeded(report)) => (false, report),
        Err(err) => return Err(err.to_string()),
    };

    if json {
        print_json(&CheckOutput {
            title: &args.title,
            accepted,
            report: &report,
        })?;
    } else {
        print!("{}", render::proposal(&args.title, &report));
    }

    if accepted {
        return Ok(());
    }

    let over: Vec<&str> = report
        .limits
        .iter()
        .filter(|limit| limit.over_limit)
        .map(|limit| limit.name.as_str())
        .collect();
    if !json {
        eprintln!(
            "Warning: '{}' would exceed the {month} hour limit for {}.",
            args.title,
            over.join(", ")
        );
    }
    Err(format!(
        "Schedule '{}' does not fit the monthly budget of {}.",
        args.title,
        over.join(", ")
    ))
}

/// Resolve `--session` values, filling missing windows from the configured defaults.
pub fn build_sessions(specs: &[SessionSpec], config: &FileConfig) -> Result<Vec<Session>, String> {
    specs
        .iter()
        .map(|spec| {
            let (start, end) = match spec.window.as_ref() {
                Some((start, end)) => (start.as_str(), end.as_str()),
                None => (
                    config.planning.default_start.as_str(),
                    config.planning.default_end.as_str(),
                ),
            };
            Session::parse(spec.date, start, end).map_err(|err| err.to_string())
        })
        .collect()
}

fn overview(args: MonthArgs, global: &GlobalArgs) -> Result<(), String> {
    let (planner, month) = prepare(&args.plan, args.month, global)?;
    let overview = MonthOverview::build(&planner, month);

    if global.json {
        return print_json(&overview);
    }
    print!("{}", render::overview(month, &overview));
    Ok(())
}

fn calendar(args: CalendarArgs, global: &GlobalArgs) -> Result<(), String> {
    // A day listing needs that day's quarter-end freeze, whatever --month says.
    let target = args.day.map(YearMonth::of).or(args.target.month);
    let (planner, month) = prepare(&args.target.plan, target, global)?;

    if let Some(day) = args.day {
        let entries = schedules_on(&planner, day);
        if global.json {
            return print_json(&entries);
        }
        print!(
            "{}",
            render::day(day, planner.blackouts().is_blackout(day), &entries)
        );
        return Ok(());
    }

    let view = MonthView::build(&planner, month);
    if global.json {
        return print_json(&view);
    }
    print!("{}", render::month_grid(&view));
    Ok(())
}

fn handle_config_command(command: ConfigCommand, global: &GlobalArgs) -> Result<(), String> {
    match command {
        ConfigCommand::Init { force } => {
            if !global.is_empty() {
                return Err("Override flags cannot be combined with config init.".into());
            }
            let path = config_path();
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists. Pass --force to overwrite it.",
                    path.display()
                ));
            }
            let written = save_config(&FileConfig::default()).map_err(|err| err.to_string())?;
            println!("Wrote default configuration to {}", written.display());
            Ok(())
        }
        ConfigCommand::Show => {
            let (config, source) = load_settings(global)?;
            if global.json {
                return print_json(&config);
            }
            print!("{}", render::config(&config_path(), source, &config)?);
            Ok(())
        }
    }
}
