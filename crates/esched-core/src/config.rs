use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::model::{DEFAULT_SESSION_END, DEFAULT_SESSION_START, YearMonth, parse_clock};
use crate::plan::PlannerSettings;
use crate::suggest::{DEFAULT_SUGGESTION_HORIZON, DEFAULT_SUGGESTION_LIMIT};

const CONFIG_DIR_NAME: &str = "esched";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Ser(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {err}"),
            ConfigError::Ser(err) => write!(f, "TOML serialization error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Ser(value)
    }
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub planning: PlanningPreferences,
    #[serde(default)]
    pub blackouts: BlackoutPreferences,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            planning: PlanningPreferences::default(),
            blackouts: BlackoutPreferences::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }

    /// Timezone used to decide what "today" and "this month" are.
    pub fn timezone(&self) -> Tz {
        self.planning
            .timezone
            .parse::<Tz>()
            .unwrap_or(chrono_tz::America::New_York)
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone()).date_naive()
    }

    pub fn current_month(&self) -> YearMonth {
        YearMonth::of(self.today())
    }

    /// Planner settings for work targeting `month`.
    ///
    /// Quarter-end blackouts cover every year the suggestion horizon reaches,
    /// so a scan that runs into January still sees the March freeze.
    pub fn planner_settings(&self, month: YearMonth) -> PlannerSettings {
        let horizon = self.planning.suggestion_horizon_months;
        let quarter_end_years = if self.blackouts.quarter_end_blackouts {
            let last = (1..horizon.max(1))
                .try_fold(month, |current, _| current.next())
                .unwrap_or(month);
            (month.year()..=last.year()).collect()
        } else {
            Vec::new()
        };
        PlannerSettings {
            exclude_weekends: self.blackouts.exclude_weekends,
            quarter_end_years,
            suggestion_limit: self.planning.suggestion_limit,
            suggestion_horizon: horizon,
        }
    }
}

/// Preferences for proposals and suggestion scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningPreferences {
    #[serde(default = "PlanningPreferences::default_suggestion_limit")]
    pub suggestion_limit: usize,
    #[serde(default = "PlanningPreferences::default_suggestion_horizon")]
    pub suggestion_horizon_months: usize,
    #[serde(default = "PlanningPreferences::default_start")]
    pub default_start: String,
    #[serde(default = "PlanningPreferences::default_end")]
    pub default_end: String,
    #[serde(default = "PlanningPreferences::default_timezone")]
    pub timezone: String,
}

impl Default for PlanningPreferences {
    fn default() -> Self {
        Self {
            suggestion_limit: Self::default_suggestion_limit(),
            suggestion_horizon_months: Self::default_suggestion_horizon(),
            default_start: Self::default_start(),
            default_end: Self::default_end(),
            timezone: Self::default_timezone(),
        }
    }
}

impl PlanningPreferences {
    const fn default_suggestion_limit() -> usize {
        DEFAULT_SUGGESTION_LIMIT
    }

    const fn default_suggestion_horizon() -> usize {
        DEFAULT_SUGGESTION_HORIZON
    }

    fn default_start() -> String {
        DEFAULT_SESSION_START.to_string()
    }

    fn default_end() -> String {
        DEFAULT_SESSION_END.to_string()
    }

    fn default_timezone() -> String {
        DEFAULT_TIMEZONE.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackoutPreferences {
    #[serde(default = "BlackoutPreferences::default_exclude_weekends")]
    pub exclude_weekends: bool,
    #[serde(default)]
    pub quarter_end_blackouts: bool,
}

impl Default for BlackoutPreferences {
    fn default() -> Self {
        Self {
            exclude_weekends: true,
            quarter_end_blackouts: false,
        }
    }
}

impl BlackoutPreferences {
    const fn default_exclude_weekends() -> bool {
        true
    }
}

/// Represents overrides sourced from runtime inputs (CLI flags).
#[derive(Debug, Default, Clone)]
pub struct RuntimeOverrides {
    pub exclude_weekends: Option<bool>,
    pub quarter_end_blackouts: Option<bool>,
    pub suggestion_limit: Option<usize>,
    pub suggestion_horizon_months: Option<usize>,
    pub timezone: Option<String>,
}

impl RuntimeOverrides {
    pub fn is_empty(&self) -> bool {
        self.exclude_weekends.is_none()
            && self.quarter_end_blackouts.is_none()
            && self.suggestion_limit.is_none()
            && self.suggestion_horizon_months.is_none()
            && self.timezone.is_none()
    }
}

/// Layer runtime overrides on top of the loaded configuration.
pub fn apply_runtime_overrides(
    config: &mut FileConfig,
    overrides: &RuntimeOverrides,
    warnings: &mut Vec<String>,
) {
    if let Some(exclude) = overrides.exclude_weekends {
        config.blackouts.exclude_weekends = exclude;
    }
    if let Some(enabled) = overrides.quarter_end_blackouts {
        config.blackouts.quarter_end_blackouts = enabled;
    }
    if let Some(limit) = overrides.suggestion_limit {
        if limit == 0 {
            warnings.push("Suggestion limit must be at least 1. Keeping configured value.".into());
        } else {
            config.planning.suggestion_limit = limit;
        }
    }
    if let Some(months) = overrides.suggestion_horizon_months {
        if months == 0 {
            warnings
                .push("Suggestion horizon must be at least 1 month. Keeping configured value.".into());
        } else {
            config.planning.suggestion_horizon_months = months;
        }
    }
    if let Some(ref timezone) = overrides.timezone {
        if timezone.parse::<Tz>().is_ok() {
            config.planning.timezone = timezone.clone();
        } else {
            warnings.push(format!(
                "Unknown timezone '{}'. Keeping '{}'.",
                timezone, config.planning.timezone
            ));
        }
    }
}

/// Path to the configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration, falling back to defaults.
pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        CONFIG_FILE_NAME, err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    CONFIG_FILE_NAME, err
                ));
            }
        }
    }

    // Default fallback
    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to disk.
pub fn save_config(config: &FileConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &FileConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        return (FileConfig::default(), warnings);
    }

    let planning = &mut config.planning;
    if planning.suggestion_limit == 0 {
        warnings.push(format!(
            "suggestion_limit must be at least 1. Resetting to {}.",
            DEFAULT_SUGGESTION_LIMIT
        ));
        planning.suggestion_limit = DEFAULT_SUGGESTION_LIMIT;
    }
    if planning.suggestion_horizon_months == 0 {
        warnings.push(format!(
            "suggestion_horizon_months must be at least 1. Resetting to {}.",
            DEFAULT_SUGGESTION_HORIZON
        ));
        planning.suggestion_horizon_months = DEFAULT_SUGGESTION_HORIZON;
    }

    let window = parse_clock(&planning.default_start)
        .and_then(|start| parse_clock(&planning.default_end).map(|end| (start, end)));
    match window {
        Ok((start, end)) if end > start => {}
        _ => {
            warnings.push(format!(
                "Default session window {}-{} is invalid. Resetting to {}-{}.",
                planning.default_start,
                planning.default_end,
                DEFAULT_SESSION_START,
                DEFAULT_SESSION_END
            ));
            planning.default_start = DEFAULT_SESSION_START.to_string();
            planning.default_end = DEFAULT_SESSION_END.to_string();
        }
    }

    if planning.timezone.parse::<Tz>().is_err() {
        warnings.push(format!(
            "Unknown timezone '{}'. Resetting to '{}'.",
            planning.timezone, DEFAULT_TIMEZONE
        ));
        planning.timezone = DEFAULT_TIMEZONE.to_string();
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_clean() {
        let (sanitized, warnings) = sanitize_config(FileConfig::default());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(sanitized, FileConfig::default());
    }

    #[test]
    fn test_unknown_schema_resets_everything() {
        let mut config = FileConfig::default();
        config.schema_version = 99;
        config.planning.suggestion_limit = 7;

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized, FileConfig::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_invalid_values_reset_with_warnings() {
        let mut config = FileConfig::default();
        config.planning.suggestion_limit = 0;
        config.planning.suggestion_horizon_months = 0;
        config.planning.default_start = "18:00".to_string();
        config.planning.default_end = "08:00".to_string();
        config.planning.timezone = "Mars/Olympus_Mons".to_string();

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(warnings.len(), 4);
        assert_eq!(sanitized.planning, PlanningPreferences::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let raw = "[blackouts]\nquarter_end_blackouts = true\n";
        let config: FileConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.schema_version, CURRENT_SCHEMA_VERSION);
        assert!(config.blackouts.exclude_weekends);
        assert!(config.blackouts.quarter_end_blackouts);
        assert_eq!(config.planning.suggestion_limit, DEFAULT_SUGGESTION_LIMIT);
    }

    #[test]
    fn test_planner_settings_follow_the_target_month() {
        let mut config = FileConfig::default();
        let march = YearMonth::new(2027, 3).unwrap();
        assert!(config.planner_settings(march).quarter_end_years.is_empty());

        config.blackouts.quarter_end_blackouts = true;
        config.blackouts.exclude_weekends = false;
        let settings = config.planner_settings(march);
        assert_eq!(settings.quarter_end_years, vec![2027]);
        assert!(!settings.exclude_weekends);
    }

    #[test]
    fn test_planner_settings_cover_years_inside_the_horizon() {
        let mut config = FileConfig::default();
        config.blackouts.quarter_end_blackouts = true;

        // Six months from October 2026 runs through March 2027.
        let october = YearMonth::new(2026, 10).unwrap();
        assert_eq!(
            config.planner_settings(october).quarter_end_years,
            vec![2026, 2027]
        );

        config.planning.suggestion_horizon_months = 3;
        assert_eq!(config.planner_settings(october).quarter_end_years, vec![2026]);
    }

    #[test]
    fn test_apply_runtime_overrides() {
        let mut config = FileConfig::default();
        let mut warnings = Vec::new();
        let overrides = RuntimeOverrides {
            exclude_weekends: Some(false),
            suggestion_limit: Some(5),
            suggestion_horizon_months: Some(0),
            timezone: Some("Europe/Berlin".to_string()),
            ..RuntimeOverrides::default()
        };
        assert!(!overrides.is_empty());

        apply_runtime_overrides(&mut config, &overrides, &mut warnings);

        assert!(!config.blackouts.exclude_weekends);
        assert_eq!(config.planning.suggestion_limit, 5);
        assert_eq!(
            config.planning.suggestion_horizon_months,
            DEFAULT_SUGGESTION_HORIZON
        );
        assert_eq!(config.timezone(), chrono_tz::Europe::Berlin);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unknown_timezone_override_is_ignored() {
        let mut config = FileConfig::default();
        let mut warnings = Vec::new();
        let overrides = RuntimeOverrides {
            timezone: Some("Nowhere/Special".to_string()),
            ..RuntimeOverrides::default()
        };

        apply_runtime_overrides(&mut config, &overrides, &mut warnings);

        assert_eq!(config.planning.timezone, DEFAULT_TIMEZONE);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);
        let mut config = FileConfig::default();
        config.planning.suggestion_limit = 5;

        save_config_to(&config, &path).expect("save config");
        let loaded = load_config_from(&path);

        assert_eq!(loaded.source, ConfigSource::File);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.config.planning.suggestion_limit, 5);
    }

    #[test]
    fn test_unparseable_file_falls_back() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "planning = [").expect("write config");

        let loaded = load_config_from(&path);

        assert_eq!(loaded.source, ConfigSource::Default);
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.config, FileConfig::default());
    }
}
