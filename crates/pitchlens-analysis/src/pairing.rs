use std::collections::{BTreeMap, BTreeSet};

use pitchlens_core::SeasonRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPair {
    pub x: f64,
    pub y: f64,
}

impl ObservationPair {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One pair per record that carries both metrics.
pub fn same_year_pairs<'a>(
    records: impl IntoIterator<Item = &'a SeasonRecord>,
    metric_x: &str,
    metric_y: &str,
) -> Vec<ObservationPair> {
    records
        .into_iter()
        .filter_map(|record| {
            let x = record.value(metric_x)?;
            let y = record.value(metric_y)?;
            Some(ObservationPair::new(x, y))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsecutivePairs {
    pub pairs: Vec<ObservationPair>,
    pub seasons: BTreeSet<i32>,
}

impl ConsecutivePairs {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Distinct seasons that contributed to at least one pair.
    pub fn years_analyzed(&self) -> usize {
        self.seasons.len()
    }
}

/// Records grouped per pitcher with seasons ascending. When the same
/// pitcher-season appears twice the later record wins.
#[derive(Debug, Clone, Default)]
pub struct PitcherSeasons<'a> {
    by_pitcher: BTreeMap<i64, BTreeMap<i32, &'a SeasonRecord>>,
}

impl<'a> PitcherSeasons<'a> {
    pub fn group(records: &'a [SeasonRecord]) -> Self {
        let mut by_pitcher = BTreeMap::<i64, BTreeMap<i32, &'a SeasonRecord>>::new();
        for record in records {
            by_pitcher
                .entry(record.pitcher_id)
                .or_default()
                .insert(record.year, record);
        }
        Self { by_pitcher }
    }

    pub fn pitcher_count(&self) -> usize {
        self.by_pitcher.len()
    }

    /// Same metric in season N and N+1.
    pub fn stickiness_pairs(&self, metric: &str) -> ConsecutivePairs {
        self.consecutive_pairs(metric, metric)
    }

    /// `predictor` in season N against `target` in season N+1.
    pub fn predictive_pairs(&self, predictor: &str, target: &str) -> ConsecutivePairs {
        self.consecutive_pairs(predictor, target)
    }

    fn consecutive_pairs(&self, earlier_metric: &str, later_metric: &str) -> ConsecutivePairs {
        let mut output = ConsecutivePairs::default();

        for seasons in self.by_pitcher.values() {
            let ordered = seasons.values().copied().collect::<Vec<_>>();
            for window in ordered.windows(2) {
                let (earlier, later) = (window[0], window[1]);
                if earlier.year.checked_add(1) != Some(later.year) {
                    continue;
                }
                let (Some(x), Some(y)) = (earlier.value(earlier_metric), later.value(later_metric))
                else {
                    continue;
                };

                output.pairs.push(ObservationPair::new(x, y));
                output.seasons.insert(earlier.year);
                output.seasons.insert(later.year);
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use pitchlens_core::Role;

    use super::*;

    fn season(pitcher_id: i64, year: i32) -> SeasonRecord {
        SeasonRecord::new(pitcher_id, format!("Pitcher {pitcher_id}"), year, Role::Starter)
            .with_innings(150.0)
    }

    #[test]
    fn same_year_pairs_skip_records_missing_either_metric() {
        let records = vec![
            season(1, 2023)
                .with_metric("avg_velocity", 95.0)
                .with_metric("whiff_pct", 30.0),
            season(2, 2023).with_metric("avg_velocity", 94.0),
            season(3, 2023).with_metric("whiff_pct", 22.0),
            season(4, 2023)
                .with_metric("avg_velocity", 92.0)
                .with_metric("whiff_pct", f64::NAN),
        ];

        let pairs = same_year_pairs(&records, "avg_velocity", "whiff_pct");
        assert_eq!(pairs, vec![ObservationPair::new(95.0, 30.0)]);
    }

    #[test]
    fn stickiness_requires_strictly_consecutive_seasons() {
        let records = vec![
            season(1, 2021).with_metric("era", 3.0),
            season(1, 2023).with_metric("era", 3.5),
            season(2, 2021).with_metric("era", 4.0),
            season(2, 2022).with_metric("era", 4.2),
            season(2, 2023).with_metric("era", 4.1),
        ];

        let grouped = PitcherSeasons::group(&records);
        assert_eq!(grouped.pitcher_count(), 2);

        let sticky = grouped.stickiness_pairs("era");
        assert_eq!(
            sticky.pairs,
            vec![ObservationPair::new(4.0, 4.2), ObservationPair::new(4.2, 4.1)]
        );
        assert_eq!(sticky.years_analyzed(), 3);
    }

    #[test]
    fn stickiness_pairs_ignore_input_order() {
        let records = vec![
            season(1, 2024).with_metric("avg_velocity", 96.0),
            season(2, 2023).with_metric("avg_velocity", 94.0),
            season(1, 2023).with_metric("avg_velocity", 95.0),
            season(2, 2024).with_metric("avg_velocity", 95.0),
        ];

        let sticky = PitcherSeasons::group(&records).stickiness_pairs("avg_velocity");
        assert_eq!(
            sticky.pairs,
            vec![
                ObservationPair::new(95.0, 96.0),
                ObservationPair::new(94.0, 95.0)
            ]
        );
    }

    #[test]
    fn predictive_pairs_take_predictor_from_earlier_and_target_from_later_season() {
        let records = vec![
            season(1, 2023)
                .with_metric("k_per_9", 11.5)
                .with_metric("era", 2.85),
            season(1, 2024)
                .with_metric("k_per_9", 11.0)
                .with_metric("era", 2.95),
            season(2, 2023).with_metric("era", 3.25),
            season(2, 2024).with_metric("era", 3.35),
        ];

        let predictive = PitcherSeasons::group(&records).predictive_pairs("k_per_9", "era");
        assert_eq!(predictive.pairs, vec![ObservationPair::new(11.5, 2.95)]);
        assert_eq!(predictive.seasons, BTreeSet::from([2023, 2024]));
    }

    #[test]
    fn missing_metric_contributes_no_pairs() {
        let records = vec![season(1, 2023), season(1, 2024)];
        let grouped = PitcherSeasons::group(&records);
        assert!(grouped.stickiness_pairs("barrel_pct").is_empty());
        assert_eq!(grouped.stickiness_pairs("barrel_pct").years_analyzed(), 0);
    }
}
