use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::pairing::ObservationPair;

/// Fewer pairs than this yield an insufficient-data result.
pub const MIN_CORRELATION_PAIRS: usize = 3;
pub const STAT_DECIMALS: i32 = 4;
pub const INSUFFICIENT_DATA_EQUATION: &str = "insufficient data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStatus {
    Computed,
    InsufficientData,
    DegenerateVariance,
}

impl CorrelationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Computed => "computed",
            Self::InsufficientData => "insufficient_data",
            Self::DegenerateVariance => "degenerate_variance",
        }
    }
}

/// Pearson correlation plus the least-squares line of y on x. Every float is
/// rounded to [`STAT_DECIMALS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub correlation_r: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub slope: f64,
    pub intercept: f64,
    pub equation: String,
    pub sample_size: usize,
    pub status: CorrelationStatus,
}

impl CorrelationResult {
    pub fn insufficient(sample_size: usize) -> Self {
        Self {
            correlation_r: 0.0,
            r_squared: 0.0,
            p_value: 1.0,
            slope: 0.0,
            intercept: 0.0,
            equation: INSUFFICIENT_DATA_EQUATION.to_owned(),
            sample_size,
            status: CorrelationStatus::InsufficientData,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.status == CorrelationStatus::Computed
    }
}

pub fn correlate(pairs: &[ObservationPair]) -> CorrelationResult {
    let sample_size = pairs.len();
    if sample_size < MIN_CORRELATION_PAIRS {
        return CorrelationResult::insufficient(sample_size);
    }

    let count = sample_size as f64;
    let mean_x = pairs.iter().map(|pair| pair.x).sum::<f64>() / count;
    let mean_y = pairs.iter().map(|pair| pair.y).sum::<f64>() / count;

    if is_constant(pairs.iter().map(|pair| pair.x)) || is_constant(pairs.iter().map(|pair| pair.y))
    {
        return degenerate(sample_size, mean_y);
    }

    // Deviations are scaled to [-1, 1] per axis so the sums neither underflow
    // nor overflow at extreme magnitudes.
    let scale_x = max_abs_deviation(pairs.iter().map(|pair| pair.x), mean_x);
    let scale_y = max_abs_deviation(pairs.iter().map(|pair| pair.y), mean_y);
    if !(is_usable_scale(scale_x) && is_usable_scale(scale_y)) {
        return degenerate(sample_size, mean_y);
    }

    let mut sum_xx = 0.0f64;
    let mut sum_yy = 0.0f64;
    let mut sum_xy = 0.0f64;
    for pair in pairs {
        let dx = (pair.x - mean_x) / scale_x;
        let dy = (pair.y - mean_y) / scale_y;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
        sum_xy += dx * dy;
    }
    if !(sum_xx > 0.0 && sum_yy > 0.0) {
        return degenerate(sample_size, mean_y);
    }

    let r = sum_xy / (sum_xx.sqrt() * sum_yy.sqrt());
    let slope = (sum_xy / sum_xx) * (scale_y / scale_x);
    let intercept = mean_y - slope * mean_x;
    if !(r.is_finite() && slope.is_finite() && intercept.is_finite()) {
        return degenerate(sample_size, mean_y);
    }
    let r = r.clamp(-1.0, 1.0);

    CorrelationResult {
        correlation_r: round_to(r, STAT_DECIMALS),
        r_squared: round_to(r * r, STAT_DECIMALS),
        p_value: round_to(two_tailed_p_value(r, sample_size), STAT_DECIMALS),
        slope: round_to(slope, STAT_DECIMALS),
        intercept: round_to(intercept, STAT_DECIMALS),
        equation: regression_equation(slope, intercept),
        sample_size,
        status: CorrelationStatus::Computed,
    }
}

/// `y = 0.452x + 2.30`; the sign follows the intercept.
pub fn regression_equation(slope: f64, intercept: f64) -> String {
    let sign = if intercept >= 0.0 { '+' } else { '-' };
    format!("y = {slope:.3}x {sign} {:.2}", intercept.abs())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn max_abs_deviation(values: impl Iterator<Item = f64>, mean: f64) -> f64 {
    values.fold(0.0, |max, value| max.max((value - mean).abs()))
}

fn is_usable_scale(scale: f64) -> bool {
    scale > 0.0 && scale.is_finite()
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|value| value == first),
        None => true,
    }
}

// Flat line through the mean of y; r is undefined so it reports as zero.
fn degenerate(sample_size: usize, mean_y: f64) -> CorrelationResult {
    let intercept = if mean_y.is_finite() { mean_y } else { 0.0 };
    CorrelationResult {
        correlation_r: 0.0,
        r_squared: 0.0,
        p_value: 1.0,
        slope: 0.0,
        intercept: round_to(intercept, STAT_DECIMALS),
        equation: regression_equation(0.0, intercept),
        sample_size,
        status: CorrelationStatus::DegenerateVariance,
    }
}

fn two_tailed_p_value(r: f64, sample_size: usize) -> f64 {
    if !r.is_finite() {
        return 1.0;
    }
    let degrees_of_freedom = (sample_size - 2) as f64;
    let unexplained = 1.0 - r * r;
    if unexplained <= 0.0 {
        return 0.0;
    }

    let t_stat = r * (degrees_of_freedom / unexplained).sqrt();
    if !t_stat.is_finite() {
        return 1.0;
    }
    match StudentsT::new(0.0, 1.0, degrees_of_freedom) {
        Ok(distribution) => (2.0 * distribution.sf(t_stat.abs())).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
