mod correlation;
mod discover;
mod pairing;
mod ranking;
mod trend;

pub use correlation::{
    CorrelationResult, CorrelationStatus, INSUFFICIENT_DATA_EQUATION, MIN_CORRELATION_PAIRS,
    STAT_DECIMALS, correlate, regression_equation, round_to,
};
pub use discover::{
    AnalysisError, CorrelationReport, CorrelationRequest, DiscoverAnalyzer, PredictiveReport,
    PredictiveRequest, RegressionLine, ScatterPoint, StickinessReport, StickinessRequest,
    TrendReport, TrendRequest,
};
pub use pairing::{ConsecutivePairs, ObservationPair, PitcherSeasons, same_year_pairs};
pub use ranking::{
    DEFAULT_RANKING_MIN_PAIRS, PredictiveEntry, StickinessEntry, rank_predictive, rank_stickiness,
};
pub use trend::{TrendDirection, TrendPoint, average_r_squared, classify_direction, trend_points};
