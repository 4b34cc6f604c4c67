// Configuration loading and parsing (canasta.toml).
//
// Everything tunable lives here: the composite-rating weights, the trend
// window, the season calendar the weekly buckets are cut from, and the file
// paths the driver reads. The pipeline runs fine with no config file at all
// — every section has defaults matching the original tool.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::aggregate::FantasyWeek;
use crate::stats::{RatingWeights, TrendParams};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Raw file structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    rating: Option<RatingSection>,
    #[serde(default)]
    trend: Option<TrendSection>,
    #[serde(default)]
    season: Option<SeasonSection>,
    #[serde(default)]
    data: Option<DataSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct RatingSection {
    volume: f64,
    regularity: f64,
    activity: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct TrendSection {
    window: usize,
    min_observations: usize,
    threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct SeasonSection {
    start_date: NaiveDate,
    week_length_days: usize,
    num_weeks: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct DataSection {
    combined: Option<String>,
    roster: Option<String>,
    scores: Option<String>,
    state: Option<String>,
    export: Option<String>,
}

// ---------------------------------------------------------------------------
// Assembled public Config
// ---------------------------------------------------------------------------

/// The season calendar weekly buckets are generated from.
#[derive(Debug, Clone)]
pub struct SeasonConfig {
    /// Date of the first score column.
    pub start_date: NaiveDate,
    pub week_length_days: usize,
    pub num_weeks: usize,
}

/// Input/output paths for the driver binary.
#[derive(Debug, Clone, Default)]
pub struct DataPaths {
    pub combined: Option<String>,
    pub roster: Option<String>,
    pub scores: Option<String>,
    /// Where the filter/sort state blob is persisted between runs.
    pub state: String,
    pub export: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rating: RatingWeights,
    pub trend: TrendParams,
    pub season: SeasonConfig,
    pub data_paths: DataPaths,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rating: RatingWeights::default(),
            trend: TrendParams::default(),
            season: SeasonConfig {
                // First column of the 2023-24 exports.
                start_date: NaiveDate::from_ymd_opt(2023, 10, 21)
                    .unwrap_or(NaiveDate::MIN),
                week_length_days: 7,
                num_weeks: 8,
            },
            data_paths: DataPaths {
                combined: None,
                roster: None,
                scores: None,
                state: "canasta_state.json".into(),
                export: None,
            },
        }
    }
}

impl Config {
    /// Fantasy-week table cut from the season calendar, with the labels the
    /// chart axis and export header use: `"S1 (21/10 - 27/10)"`.
    pub fn fantasy_weeks(&self) -> Vec<FantasyWeek> {
        use chrono::{Datelike, Days};

        let len = self.season.week_length_days;
        (0..self.season.num_weeks)
            .map(|week| {
                let start = self
                    .season
                    .start_date
                    .checked_add_days(Days::new((week * len) as u64))
                    .unwrap_or(self.season.start_date);
                let end = start
                    .checked_add_days(Days::new(len.saturating_sub(1) as u64))
                    .unwrap_or(start);
                FantasyWeek {
                    label: format!(
                        "S{} ({:02}/{:02} - {:02}/{:02})",
                        week + 1,
                        start.day(),
                        start.month(),
                        end.day(),
                        end.month()
                    ),
                    start_day: week * len,
                    end_day: (week + 1) * len,
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from the given file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;

    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let defaults = Config::default();

    let rating = file
        .rating
        .map(|r| RatingWeights {
            volume: r.volume,
            regularity: r.regularity,
            activity: r.activity,
        })
        .unwrap_or(defaults.rating);

    let trend = file
        .trend
        .map(|t| TrendParams {
            window: t.window,
            min_observations: t.min_observations,
            threshold: t.threshold,
        })
        .unwrap_or(defaults.trend);

    let season = file
        .season
        .map(|s| SeasonConfig {
            start_date: s.start_date,
            week_length_days: s.week_length_days,
            num_weeks: s.num_weeks,
        })
        .unwrap_or(defaults.season);

    let data = file.data.unwrap_or_default();
    let data_paths = DataPaths {
        combined: data.combined,
        roster: data.roster,
        scores: data.scores,
        state: data.state.unwrap_or(defaults.data_paths.state),
        export: data.export,
    };

    let config = Config {
        rating,
        trend,
        season,
        data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads `canasta.toml` from the given directory, or
/// falls back to the built-in defaults when the file does not exist.
pub fn load_or_default(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("canasta.toml");
    if path.exists() {
        load_config_from(&path)
    } else {
        Ok(Config::default())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Tolerance for the rating-weight sum check.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

fn validate(config: &Config) -> Result<(), ConfigError> {
    let w = &config.rating;
    let weight_fields: &[(&str, f64)] = &[
        ("rating.volume", w.volume),
        ("rating.regularity", w.regularity),
        ("rating.activity", w.activity),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a finite number >= 0, got {val}"),
            });
        }
    }
    let sum = w.volume + w.regularity + w.activity;
    if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(ConfigError::ValidationError {
            field: "rating".into(),
            message: format!("weights must sum to 1.0, got {sum}"),
        });
    }

    if config.trend.window == 0 {
        return Err(ConfigError::ValidationError {
            field: "trend.window".into(),
            message: "must be > 0".into(),
        });
    }
    if config.trend.min_observations < config.trend.window + 1 {
        return Err(ConfigError::ValidationError {
            field: "trend.min_observations".into(),
            message: format!(
                "must leave at least one observation before the recent window \
                 (>= {})",
                config.trend.window + 1
            ),
        });
    }
    if !(config.trend.threshold.is_finite() && config.trend.threshold >= 0.0) {
        return Err(ConfigError::ValidationError {
            field: "trend.threshold".into(),
            message: format!("must be a finite number >= 0, got {}", config.trend.threshold),
        });
    }

    if config.season.week_length_days == 0 {
        return Err(ConfigError::ValidationError {
            field: "season.week_length_days".into(),
            message: "must be > 0".into(),
        });
    }
    if config.season.num_weeks == 0 {
        return Err(ConfigError::ValidationError {
            field: "season.num_weeks".into(),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
