//! Plain-text output for the query commands.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use esched_core::overview::CohortBudget;
use esched_core::{
    ConfigSource, DayEntry, FileConfig, MonthOverview, MonthView, ProposalReport, YearMonth,
};

const WEEKDAY_HEADER: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const BLACKOUT_MARK: char = '#';
const SCHEDULED_MARK: char = '*';

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(str::len).max().unwrap_or(0)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d (%a)").to_string()
}

pub fn dates(dates: &[NaiveDate]) -> String {
    finish(
        dates
            .iter()
            .map(|date| format!("  {}", format_date(*date)))
            .collect(),
    )
}

pub fn budgets(month: YearMonth, budgets: &[CohortBudget]) -> String {
    if budgets.is_empty() {
        return format!("No cohorts defined for {month}.\n");
    }
    let width = name_width(budgets.iter().map(|budget| budget.name.as_str()));
    let mut lines = vec![format!("Remaining hours for {month}:")];
    lines.extend(budgets.iter().map(|budget| {
        format!(
            "  {:<width$}  {:>6.1} of {} h",
            budget.name, budget.remaining_hours, budget.monthly_hours
        )
    }));
    finish(lines)
}

pub fn proposal(title: &str, report: &ProposalReport) -> String {
    let width = name_width(report.limits.iter().map(|limit| limit.name.as_str()));
    let mut lines = vec![format!(
        "'{title}' needs {:.1} h in {}:",
        report.total_hours, report.month
    )];
    for limit in &report.limits {
        let status = if limit.over_limit {
            "over limit".to_string()
        } else {
            format!("{:.1} h after booking", limit.available_hours)
        };
        lines.push(format!(
            "  {:<width$}  {:>6.1} h left, {status}",
            limit.name, limit.remaining_hours
        ));
    }

    if report.is_over_limit() {
        if report.suggestions.is_empty() {
            lines.push("No alternative start dates found.".to_string());
        } else {
            lines.push("Suggested start dates:".to_string());
            lines.extend(
                report
                    .suggestions
                    .iter()
                    .map(|date| format!("  {}", format_date(*date))),
            );
        }
    }
    finish(lines)
}

pub fn overview(month: YearMonth, overview: &MonthOverview) -> String {
    let mut lines = vec![format!("Overview for {month}")];

    if overview.schedules.is_empty() {
        lines.push("No schedules this month.".to_string());
    } else {
        lines.push("Schedules:".to_string());
        for schedule in &overview.schedules {
            lines.push(format!(
                "  {} [{}]",
                schedule.title,
                schedule.cohorts.join(", ")
            ));
            lines.extend(schedule.sessions.iter().map(|session| {
                format!("    {}  {}", format_date(session.date()), session.window())
            }));
        }
    }

    let width = name_width(overview.budgets.iter().map(|budget| budget.name.as_str()));
    lines.push("Budgets:".to_string());
    lines.extend(overview.budgets.iter().map(|budget| {
        format!(
            "  {:<width$}  {:>6.1} used, {:>6.1} left of {} h",
            budget.name, budget.used_hours, budget.remaining_hours, budget.monthly_hours
        )
    }));
    finish(lines)
}

pub fn day(date: NaiveDate, blackout: bool, entries: &[DayEntry]) -> String {
    let mut heading = format_date(date);
    if blackout {
        heading.push_str(" [blackout]");
    }
    let mut lines = vec![heading];
    if entries.is_empty() {
        lines.push("  Nothing scheduled.".to_string());
    }
    lines.extend(entries.iter().map(|entry| {
        format!(
            "  {}  {} [{}]",
            entry.window,
            entry.title,
            entry.cohorts.join(", ")
        )
    }));
    finish(lines)
}

/// Sunday-first grid; `#` marks blackouts and `*` days with sessions.
pub fn month_grid(view: &MonthView) -> String {
    let mut lines = vec![
        view.month.clone(),
        WEEKDAY_HEADER
            .iter()
            .map(|name| format!("{name:>3} "))
            .collect::<String>()
            .trim_end()
            .to_string(),
    ];

    let mut row = "    ".repeat(view.leading_blanks as usize);
    let mut filled = view.leading_blanks;
    for cell in &view.days {
        let mark = if cell.blackout {
            BLACKOUT_MARK
        } else if !cell.colors.is_empty() {
            SCHEDULED_MARK
        } else {
            ' '
        };
        row.push_str(&format!("{:>3}{mark}", cell.date.day()));
        filled += 1;
        if filled % 7 == 0 {
            lines.push(row.trim_end().to_string());
            row.clear();
        }
    }
    if !row.is_empty() {
        lines.push(row.trim_end().to_string());
    }
    lines.push(format!("{BLACKOUT_MARK} blackout  {SCHEDULED_MARK} scheduled"));
    finish(lines)
}

pub fn config(path: &Path, source: ConfigSource, config: &FileConfig) -> Result<String, String> {
    let origin = match source {
        ConfigSource::File => format!("# loaded from {}", path.display()),
        ConfigSource::Default => format!("# defaults ({} not found)", path.display()),
    };
    let body = toml::to_string_pretty(config)
        .map_err(|err| format!("Failed to render configuration: {err}"))?;
    Ok(format!("{origin}\n{body}"))
}
