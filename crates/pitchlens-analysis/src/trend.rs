use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use pitchlens_core::SeasonRecord;
use serde::{Deserialize, Serialize};

use crate::correlation::{MIN_CORRELATION_PAIRS, STAT_DECIMALS, correlate, round_to};
use crate::pairing::same_year_pairs;

const RISING_RATIO: f64 = 1.1;
const FALLING_RATIO: f64 = 0.9;
const MIN_TREND_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub r_squared: f64,
    pub correlation_r: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

/// Same-year correlation for each season in `years`. Seasons with fewer than
/// three usable pairs are left out rather than zero-filled.
pub fn trend_points(
    records: &[SeasonRecord],
    metric_x: &str,
    metric_y: &str,
    years: RangeInclusive<i32>,
) -> Vec<TrendPoint> {
    let mut by_year = BTreeMap::<i32, Vec<&SeasonRecord>>::new();
    for record in records.iter().filter(|record| years.contains(&record.year)) {
        by_year.entry(record.year).or_default().push(record);
    }

    let mut points = Vec::new();
    for year in years {
        let Some(season) = by_year.get(&year) else {
            continue;
        };

        let pairs = same_year_pairs(season.iter().copied(), metric_x, metric_y);
        if pairs.len() < MIN_CORRELATION_PAIRS {
            tracing::debug!(
                year,
                sample_size = pairs.len(),
                metric_x,
                metric_y,
                "season below trend floor"
            );
            continue;
        }

        let result = correlate(&pairs);
        points.push(TrendPoint {
            year,
            r_squared: result.r_squared,
            correlation_r: result.correlation_r,
            sample_size: result.sample_size,
        });
    }

    points
}

/// Compares the mean of the first half of `r_squared` with the mean of the
/// second half. An odd middle element belongs to the second half.
pub fn classify_direction(r_squared: &[f64]) -> TrendDirection {
    if r_squared.len() < MIN_TREND_POINTS {
        return TrendDirection::Stable;
    }

    let (first, second) = r_squared.split_at(r_squared.len() / 2);
    let first_mean = mean(first);
    let second_mean = mean(second);

    if second_mean > first_mean * RISING_RATIO {
        TrendDirection::Increasing
    } else if second_mean < first_mean * FALLING_RATIO {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

pub fn average_r_squared(points: &[TrendPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let values = points.iter().map(|point| point.r_squared).collect::<Vec<_>>();
    round_to(mean(&values), STAT_DECIMALS)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use pitchlens_core::Role;

    use super::*;

    fn record(pitcher_id: i64, year: i32, x: f64, y: f64) -> SeasonRecord {
        SeasonRecord::new(pitcher_id, format!("P{pitcher_id}"), year, Role::Starter)
            .with_innings(120.0)
            .with_metric("k_pct", x)
            .with_metric("era", y)
    }

    #[test]
    fn direction_follows_half_means() {
        assert_eq!(
            classify_direction(&[0.10, 0.12, 0.30, 0.32]),
            TrendDirection::Increasing
        );
        assert_eq!(
            classify_direction(&[0.30, 0.28, 0.12, 0.10]),
            TrendDirection::Decreasing
        );
        assert_eq!(
            classify_direction(&[0.20, 0.21, 0.19, 0.20]),
            TrendDirection::Stable
        );
    }

    #[test]
    fn short_sequences_are_stable() {
        assert_eq!(classify_direction(&[]), TrendDirection::Stable);
        assert_eq!(classify_direction(&[0.1, 0.9]), TrendDirection::Stable);
    }

    #[test]
    fn odd_length_puts_middle_value_in_second_half() {
        // first = [0.5], second = [0.1, 0.95] with mean 0.525: within 10%.
        assert_eq!(
            classify_direction(&[0.5, 0.1, 0.95]),
            TrendDirection::Stable
        );
        // first = [0.5, 0.1], second holds the three trailing values.
        assert_eq!(
            classify_direction(&[0.5, 0.1, 0.5, 0.5, 0.5]),
            TrendDirection::Increasing
        );
    }

    #[test]
    fn zero_baseline_rises_on_any_signal() {
        assert_eq!(
            classify_direction(&[0.0, 0.0, 0.2]),
            TrendDirection::Increasing
        );
        assert_eq!(classify_direction(&[0.0, 0.0, 0.0]), TrendDirection::Stable);
    }

    #[test]
    fn trend_points_skip_thin_seasons_and_respect_range() {
        let records = vec![
            record(1, 2021, 20.0, 4.0),
            record(2, 2021, 25.0, 3.5),
            record(3, 2021, 30.0, 3.0),
            record(1, 2022, 21.0, 4.1),
            record(2, 2022, 26.0, 3.6),
            record(1, 2023, 22.0, 4.4),
            record(2, 2023, 27.0, 3.3),
            record(3, 2023, 31.0, 3.5),
            record(4, 2023, 24.0, 3.9),
            record(1, 2025, 22.0, 4.4),
            record(2, 2025, 27.0, 3.3),
            record(3, 2025, 31.0, 3.5),
        ];

        let points = trend_points(&records, "k_pct", "era", 2020..=2024);
        let years = points.iter().map(|point| point.year).collect::<Vec<_>>();
        assert_eq!(years, vec![2021, 2023]);

        assert_eq!(points[0].sample_size, 3);
        assert_eq!(points[0].correlation_r, -1.0);
        assert_eq!(points[0].r_squared, 1.0);
        assert_eq!(points[1].sample_size, 4);
        assert!(points[1].correlation_r < 0.0);
    }

    #[test]
    fn average_r_squared_is_rounded_and_zero_when_empty() {
        assert_eq!(average_r_squared(&[]), 0.0);

        let points = [0.1, 0.2, 0.25]
            .into_iter()
            .enumerate()
            .map(|(idx, r_squared)| TrendPoint {
                year: 2020 + idx as i32,
                r_squared,
                correlation_r: r_squared.sqrt(),
                sample_size: 10,
            })
            .collect::<Vec<_>>();
        assert_eq!(average_r_squared(&points), 0.1833);
    }
}
