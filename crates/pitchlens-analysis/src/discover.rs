use std::sync::Arc;

use pitchlens_core::{
    CoreError, DEFAULT_MIN_INNINGS, DEFAULT_TARGET_METRIC, DEFAULT_TREND_END_YEAR,
    DEFAULT_TREND_START_YEAR, MetricCatalog, MetricDescriptor, MetricId, RecordFilter, Role,
    SeasonRecord, sort_by_pitcher_and_year, validate_season,
};
use pitchlens_store::{SeasonRecordSource, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::correlation::{CorrelationStatus, correlate, round_to};
use crate::pairing::{ObservationPair, PitcherSeasons};
use crate::ranking::{
    DEFAULT_RANKING_MIN_PAIRS, PredictiveEntry, StickinessEntry, rank_predictive, rank_stickiness,
};
use crate::trend::{TrendDirection, TrendPoint, average_r_squared, classify_direction, trend_points};

const SCATTER_DECIMALS: i32 = 3;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("unknown metric '{0}'")]
    UnknownMetric(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid year range: start {start} is after end {end}")]
    InvalidYearRange { start: i32, end: i32 },
    #[error("catalog error: {0}")]
    Catalog(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CoreError> for AnalysisError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownMetric(metric) => Self::UnknownMetric(metric),
            CoreError::InvalidFilter(message) => Self::InvalidFilter(message),
            other @ (CoreError::DuplicateMetric(_) | CoreError::EmptyMetricId(_)) => {
                Self::Catalog(other.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRequest {
    pub metric_x: String,
    pub metric_y: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default = "default_min_innings")]
    pub min_innings: f64,
}

impl CorrelationRequest {
    pub fn new(metric_x: impl Into<String>, metric_y: impl Into<String>) -> Self {
        Self {
            metric_x: metric_x.into(),
            metric_y: metric_y.into(),
            year: None,
            role: None,
            min_innings: DEFAULT_MIN_INNINGS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickinessRequest {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default = "default_min_innings")]
    pub min_innings: f64,
}

impl Default for StickinessRequest {
    fn default() -> Self {
        Self {
            role: None,
            min_innings: DEFAULT_MIN_INNINGS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveRequest {
    pub target_metric: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default = "default_min_innings")]
    pub min_innings: f64,
}

impl Default for PredictiveRequest {
    fn default() -> Self {
        Self {
            target_metric: DEFAULT_TARGET_METRIC.to_owned(),
            role: None,
            min_innings: DEFAULT_MIN_INNINGS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRequest {
    pub metric_x: String,
    pub metric_y: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default = "default_min_innings")]
    pub min_innings: f64,
    #[serde(default = "default_trend_start_year")]
    pub start_year: i32,
    #[serde(default = "default_trend_end_year")]
    pub end_year: i32,
}

impl TrendRequest {
    pub fn new(metric_x: impl Into<String>, metric_y: impl Into<String>) -> Self {
        Self {
            metric_x: metric_x.into(),
            metric_y: metric_y.into(),
            role: None,
            min_innings: DEFAULT_MIN_INNINGS,
            start_year: DEFAULT_TREND_START_YEAR,
            end_year: DEFAULT_TREND_END_YEAR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionLine {
    pub slope: f64,
    pub intercept: f64,
    pub equation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub pitcher_id: i64,
    pub year: i32,
    pub name: String,
    pub team: Option<String>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub metric_x: MetricId,
    pub metric_x_name: String,
    pub metric_y: MetricId,
    pub metric_y_name: String,
    pub year: Option<i32>,
    pub role: Option<Role>,
    pub min_innings: f64,
    pub correlation_r: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub sample_size: usize,
    pub status: CorrelationStatus,
    pub regression: RegressionLine,
    pub scatter: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickinessReport {
    pub role: Option<Role>,
    pub min_innings: f64,
    pub min_pairs: usize,
    pub pitchers_analyzed: usize,
    pub entries: Vec<StickinessEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveReport {
    pub target_metric: MetricId,
    pub target_name: String,
    pub role: Option<Role>,
    pub min_innings: f64,
    pub min_pairs: usize,
    pub pitchers_analyzed: usize,
    pub entries: Vec<PredictiveEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub metric_x: MetricId,
    pub metric_x_name: String,
    pub metric_y: MetricId,
    pub metric_y_name: String,
    pub role: Option<Role>,
    pub min_innings: f64,
    pub start_year: i32,
    pub end_year: i32,
    pub points: Vec<TrendPoint>,
    pub avg_r_squared: f64,
    pub direction: TrendDirection,
}

/// Runs the four discovery analyses over whatever `source` returns. Holds no
/// per-request state, so one analyzer can serve any number of requests.
#[derive(Debug, Clone)]
pub struct DiscoverAnalyzer<S> {
    source: S,
    catalog: Arc<MetricCatalog>,
    ranking_min_pairs: usize,
}

impl<S: SeasonRecordSource> DiscoverAnalyzer<S> {
    pub fn new(source: S) -> Self {
        Self::with_catalog(source, Arc::new(MetricCatalog::builtin()))
    }

    pub fn with_catalog(source: S, catalog: Arc<MetricCatalog>) -> Self {
        Self {
            source,
            catalog,
            ranking_min_pairs: DEFAULT_RANKING_MIN_PAIRS,
        }
    }

    pub fn with_ranking_min_pairs(mut self, min_pairs: usize) -> Self {
        self.ranking_min_pairs = min_pairs;
        self
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn ranking_min_pairs(&self) -> usize {
        self.ranking_min_pairs
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn available_metrics(&self) -> &[MetricDescriptor] {
        self.catalog.descriptors()
    }

    pub fn correlate(
        &self,
        request: CorrelationRequest,
    ) -> Result<CorrelationReport, AnalysisError> {
        let metric_x = self.catalog.resolve(&request.metric_x)?;
        let metric_y = self.catalog.resolve(&request.metric_y)?;
        let filter = RecordFilter::new(request.year, request.role, request.min_innings);
        let records = self.fetch(&filter)?;

        let (pairs, scatter) = scatter_points(&records, metric_x, metric_y);
        let result = correlate(&pairs);
        tracing::info!(
            metric_x = %metric_x.id,
            metric_y = %metric_y.id,
            year = ?request.year,
            sample_size = result.sample_size,
            status = result.status.as_str(),
            "computed correlation"
        );

        Ok(CorrelationReport {
            metric_x: metric_x.id.clone(),
            metric_x_name: metric_x.name.clone(),
            metric_y: metric_y.id.clone(),
            metric_y_name: metric_y.name.clone(),
            year: request.year,
            role: request.role,
            min_innings: request.min_innings,
            correlation_r: result.correlation_r,
            r_squared: result.r_squared,
            p_value: result.p_value,
            sample_size: result.sample_size,
            status: result.status,
            regression: RegressionLine {
                slope: result.slope,
                intercept: result.intercept,
                equation: result.equation,
            },
            scatter,
        })
    }

    /// Year-over-year repeatability of every catalog metric. Always spans
    /// every stored season since pairs cross season boundaries.
    pub fn stickiness_rankings(
        &self,
        request: StickinessRequest,
    ) -> Result<StickinessReport, AnalysisError> {
        self.check_ranking_min_pairs()?;
        let filter = RecordFilter::all_years(request.role, request.min_innings);
        let records = self.fetch(&filter)?;
        let seasons = PitcherSeasons::group(&records);

        let entries = rank_stickiness(&self.catalog, &seasons, self.ranking_min_pairs);
        tracing::info!(
            pitchers = seasons.pitcher_count(),
            ranked = entries.len(),
            min_pairs = self.ranking_min_pairs,
            "computed stickiness rankings"
        );

        Ok(StickinessReport {
            role: request.role,
            min_innings: request.min_innings,
            min_pairs: self.ranking_min_pairs,
            pitchers_analyzed: seasons.pitcher_count(),
            entries,
        })
    }

    pub fn predictive_rankings(
        &self,
        request: PredictiveRequest,
    ) -> Result<PredictiveReport, AnalysisError> {
        self.check_ranking_min_pairs()?;
        let target = self.catalog.resolve(&request.target_metric)?;
        let filter = RecordFilter::all_years(request.role, request.min_innings);
        let records = self.fetch(&filter)?;
        let seasons = PitcherSeasons::group(&records);

        let entries = rank_predictive(&self.catalog, &seasons, target, self.ranking_min_pairs);
        tracing::info!(
            target = %target.id,
            pitchers = seasons.pitcher_count(),
            ranked = entries.len(),
            min_pairs = self.ranking_min_pairs,
            "computed predictive rankings"
        );

        Ok(PredictiveReport {
            target_metric: target.id.clone(),
            target_name: target.name.clone(),
            role: request.role,
            min_innings: request.min_innings,
            min_pairs: self.ranking_min_pairs,
            pitchers_analyzed: seasons.pitcher_count(),
            entries,
        })
    }

    pub fn trend(&self, request: TrendRequest) -> Result<TrendReport, AnalysisError> {
        let metric_x = self.catalog.resolve(&request.metric_x)?;
        let metric_y = self.catalog.resolve(&request.metric_y)?;
        validate_season(request.start_year)?;
        validate_season(request.end_year)?;
        if request.start_year > request.end_year {
            return Err(AnalysisError::InvalidYearRange {
                start: request.start_year,
                end: request.end_year,
            });
        }

        let filter = RecordFilter::all_years(request.role, request.min_innings);
        let records = self.fetch(&filter)?;
        let points = trend_points(
            &records,
            metric_x.id.as_str(),
            metric_y.id.as_str(),
            request.start_year..=request.end_year,
        );
        let r_squared = points.iter().map(|point| point.r_squared).collect::<Vec<_>>();
        let direction = classify_direction(&r_squared);
        let avg_r_squared = average_r_squared(&points);
        tracing::info!(
            metric_x = %metric_x.id,
            metric_y = %metric_y.id,
            start_year = request.start_year,
            end_year = request.end_year,
            seasons = points.len(),
            direction = direction.as_str(),
            "computed correlation trend"
        );

        Ok(TrendReport {
            metric_x: metric_x.id.clone(),
            metric_x_name: metric_x.name.clone(),
            metric_y: metric_y.id.clone(),
            metric_y_name: metric_y.name.clone(),
            role: request.role,
            min_innings: request.min_innings,
            start_year: request.start_year,
            end_year: request.end_year,
            points,
            avg_r_squared,
            direction,
        })
    }

    fn check_ranking_min_pairs(&self) -> Result<(), AnalysisError> {
        if self.ranking_min_pairs == 0 {
            return Err(AnalysisError::InvalidFilter(
                "ranking min_pairs must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    fn fetch(&self, filter: &RecordFilter) -> Result<Vec<SeasonRecord>, AnalysisError> {
        filter.validate()?;
        let mut records = self.source.fetch_season_records(filter)?;
        sort_by_pitcher_and_year(&mut records);
        Ok(keep_latest_per_season(records))
    }
}

// Expects records sorted by pitcher and year; the stable sort keeps source
// order within a pitcher-season so the later duplicate wins.
fn keep_latest_per_season(records: Vec<SeasonRecord>) -> Vec<SeasonRecord> {
    let mut unique: Vec<SeasonRecord> = Vec::with_capacity(records.len());
    for record in records {
        match unique.last_mut() {
            Some(last) if last.pitcher_id == record.pitcher_id && last.year == record.year => {
                *last = record;
            }
            _ => unique.push(record),
        }
    }
    unique
}

// Pairs and scatter points come from the same records so the scatter length
// always equals the correlation sample size.
fn scatter_points(
    records: &[SeasonRecord],
    metric_x: &MetricDescriptor,
    metric_y: &MetricDescriptor,
) -> (Vec<ObservationPair>, Vec<ScatterPoint>) {
    let mut pairs = Vec::new();
    let mut scatter = Vec::new();
    for record in records {
        let (Some(x), Some(y)) = (
            record.value(metric_x.id.as_str()),
            record.value(metric_y.id.as_str()),
        ) else {
            continue;
        };

        pairs.push(ObservationPair::new(x, y));
        scatter.push(ScatterPoint {
            pitcher_id: record.pitcher_id,
            year: record.year,
            name: record.pitcher_name.clone(),
            team: record.team.clone(),
            x: round_to(x, SCATTER_DECIMALS),
            y: round_to(y, SCATTER_DECIMALS),
        });
    }
    (pairs, scatter)
}

fn default_min_innings() -> f64 {
    DEFAULT_MIN_INNINGS
}

fn default_trend_start_year() -> i32 {
    DEFAULT_TREND_START_YEAR
}

fn default_trend_end_year() -> i32 {
    DEFAULT_TREND_END_YEAR
}
