use std::fs;
use std::path::{Path, PathBuf};

pub use pitchlens_core::{
    DEFAULT_MIN_INNINGS, DEFAULT_RANKING_MIN_PAIRS, DEFAULT_TARGET_METRIC,
    DEFAULT_TREND_END_YEAR, DEFAULT_TREND_START_YEAR,
};
use pitchlens_core::MetricCatalog;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PITCHLENS_DIR_NAME: &str = ".pitchlens";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_DATABASE_FILE: &str = "pitchlens.sqlite";

const CORRELATION_FLOOR: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PitchLensConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_min_innings")]
    pub min_innings: f64,
    #[serde(default = "default_ranking_min_pairs")]
    pub ranking_min_pairs: usize,
    #[serde(default = "default_trend_start_year")]
    pub trend_start_year: i32,
    #[serde(default = "default_trend_end_year")]
    pub trend_end_year: i32,
    #[serde(default = "default_target_metric")]
    pub default_target_metric: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_innings: default_min_innings(),
            ranking_min_pairs: default_ranking_min_pairs(),
            trend_start_year: default_trend_start_year(),
            trend_end_year: default_trend_end_year(),
            default_target_metric: default_target_metric(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub fn pitchlens_dir(workspace_root: impl AsRef<Path>) -> PathBuf {
    workspace_root.as_ref().join(PITCHLENS_DIR_NAME)
}

pub fn config_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    pitchlens_dir(workspace_root).join(CONFIG_FILE_NAME)
}

pub fn database_path(workspace_root: impl AsRef<Path>, config: &PitchLensConfig) -> PathBuf {
    pitchlens_dir(workspace_root).join(&config.storage.database)
}

pub fn load_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<PitchLensConfig, ConfigError> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(PitchLensConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PitchLensConfig = toml::from_str(&raw)?;
    Ok(normalize_config(parsed))
}

pub fn ensure_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<PitchLensConfig, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    fs::create_dir_all(pitchlens_dir(workspace_root))?;

    let path = config_path(workspace_root);
    if path.exists() {
        return load_workspace_config(workspace_root);
    }

    let config = PitchLensConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

pub fn validate_config(config: &PitchLensConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let analysis = &config.analysis;

    if !analysis.min_innings.is_finite() || analysis.min_innings < 0.0 {
        warnings.push(ConfigWarning {
            code: "analysis.min_innings",
            message: format!(
                "min_innings = {} is invalid; requests must pass a non-negative value",
                analysis.min_innings
            ),
        });
    }
    if analysis.ranking_min_pairs == 0 {
        warnings.push(ConfigWarning {
            code: "analysis.ranking_min_pairs",
            message: "ranking_min_pairs = 0 is invalid; rankings require at least one pair"
                .to_owned(),
        });
    } else if analysis.ranking_min_pairs < CORRELATION_FLOOR {
        warnings.push(ConfigWarning {
            code: "analysis.ranking_min_pairs",
            message: format!(
                "ranking_min_pairs = {} is below the correlation floor of {CORRELATION_FLOOR}; \
                 entries under the floor report zero R²",
                analysis.ranking_min_pairs
            ),
        });
    }
    if analysis.trend_start_year > analysis.trend_end_year {
        warnings.push(ConfigWarning {
            code: "analysis.trend_range",
            message: format!(
                "trend_start_year {} is after trend_end_year {}",
                analysis.trend_start_year, analysis.trend_end_year
            ),
        });
    }
    if !MetricCatalog::builtin().contains(&analysis.default_target_metric) {
        warnings.push(ConfigWarning {
            code: "analysis.default_target_metric",
            message: format!(
                "default_target_metric '{}' is not a known metric",
                analysis.default_target_metric
            ),
        });
    }

    warnings
}

fn default_min_innings() -> f64 {
    DEFAULT_MIN_INNINGS
}

fn default_ranking_min_pairs() -> usize {
    DEFAULT_RANKING_MIN_PAIRS
}

fn default_trend_start_year() -> i32 {
    DEFAULT_TREND_START_YEAR
}

fn default_trend_end_year() -> i32 {
    DEFAULT_TREND_END_YEAR
}

fn default_target_metric() -> String {
    DEFAULT_TARGET_METRIC.to_owned()
}

fn default_database() -> String {
    DEFAULT_DATABASE_FILE.to_owned()
}

fn normalize_required(input: String, fallback: fn() -> String) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_owned()
    }
}

fn normalize_config(mut config: PitchLensConfig) -> PitchLensConfig {
    config.analysis.default_target_metric = normalize_required(
        std::mem::take(&mut config.analysis.default_target_metric),
        default_target_metric,
    );
    config.storage.database = normalize_required(
        std::mem::take(&mut config.storage.database),
        default_database,
    );

    config
}
