mod metric;
mod record;

use thiserror::Error;

pub const DEFAULT_RANKING_MIN_PAIRS: usize = 10;
pub const DEFAULT_TARGET_METRIC: &str = "era";
pub const DEFAULT_TREND_START_YEAR: i32 = 2015;
pub const DEFAULT_TREND_END_YEAR: i32 = 2024;

pub use metric::{BUILTIN_METRICS, MetricCatalog, MetricCategory, MetricDescriptor, MetricId};
pub use record::{
    DEFAULT_MIN_INNINGS, EARLIEST_SEASON, LATEST_SEASON, RecordFilter, Role, SeasonRecord,
    sort_by_pitcher_and_year, validate_season,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown metric '{0}'")]
    UnknownMetric(String),
    #[error("metric '{0}' is registered more than once")]
    DuplicateMetric(String),
    #[error("metric at position {0} has an empty id")]
    EmptyMetricId(usize),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}
