use std::fs;
use std::path::Path;

use clap::Parser;
use esched_cli::check_proposal;
use esched_cli::cli_args::{CheckArgs, Cli, Command};
use esched_core::FileConfig;
use tempfile::tempdir;

// `check` against a plan written to disk, with configuration passed in so the
// user's own config.toml never leaks into the result.

const PLAN: &str = r#"
[[cohorts]]
name = "Platform"
monthly_hours = 40

[[cohorts]]
name = "Support"
monthly_hours = 8

[[schedules]]
title = "Onboarding"
cohorts = ["Support"]
sessions = [{ date = "2026-10-01" }]
"#;

fn write_plan(dir: &Path) -> String {
    let path = dir.join("plan.toml");
    fs::write(&path, PLAN).expect("write plan");
    path.display().to_string()
}

fn check_args(plan: &str, cohort: &str, session: &str) -> CheckArgs {
    let cli = Cli::try_parse_from([
        "esched", "check", "--plan", plan, "--title", "Workshop", "--cohort", cohort,
        "--session", session,
    ])
    .expect("arguments should parse");
    match cli.command {
        Command::Check(args) => args,
        other => panic!("expected check command, got {other:?}"),
    }
}

#[test]
fn test_check_accepts_a_proposal_within_budget() {
    let dir = tempdir().unwrap();
    let plan = write_plan(dir.path());

    let args = check_args(&plan, "platform", "2026-10-05");
    assert_eq!(check_proposal(&args, &FileConfig::default(), false), Ok(()));
}

#[test]
fn test_check_rejects_a_cohort_over_its_monthly_hours() {
    let dir = tempdir().unwrap();
    let plan = write_plan(dir.path());

    // Onboarding already used all eight Support hours in October.
    let args = check_args(&plan, "Support", "2026-10-06@09:00-10:00");
    let err = check_proposal(&args, &FileConfig::default(), true).unwrap_err();
    assert!(err.contains("Support"), "unexpected error: {err}");
    assert!(err.contains("Workshop"), "unexpected error: {err}");
}

#[test]
fn test_check_refuses_a_weekend_session() {
    let dir = tempdir().unwrap();
    let plan = write_plan(dir.path());

    let args = check_args(&plan, "Platform", "2026-10-17");
    let err = check_proposal(&args, &FileConfig::default(), false).unwrap_err();
    assert_eq!(err, "session on 2026-10-17 falls on a blackout date");
}

#[test]
fn test_check_sees_the_quarter_end_freeze_of_the_session_year() {
    let dir = tempdir().unwrap();
    let plan = write_plan(dir.path());
    let mut config = FileConfig::default();
    config.blackouts.quarter_end_blackouts = true;

    // Monday 2027-03-22 sits inside the Q1 2027 freeze.
    let args = check_args(&plan, "Platform", "2027-03-22");
    let err = check_proposal(&args, &config, false).unwrap_err();
    assert!(err.contains("2027-03-22"), "unexpected error: {err}");

    let args = check_args(&plan, "Platform", "2027-03-15");
    assert_eq!(check_proposal(&args, &config, false), Ok(()));
}
