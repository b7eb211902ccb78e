pub use pitchlens_core::DEFAULT_RANKING_MIN_PAIRS;
use pitchlens_core::{MetricCatalog, MetricCategory, MetricDescriptor, MetricId};
use serde::{Deserialize, Serialize};

use crate::correlation::{MIN_CORRELATION_PAIRS, STAT_DECIMALS, correlate, round_to};
use crate::pairing::PitcherSeasons;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickinessEntry {
    pub rank: usize,
    pub metric: MetricId,
    pub metric_name: String,
    pub category: MetricCategory,
    pub r_squared: f64,
    pub sample_size: usize,
    pub years_analyzed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveEntry {
    pub rank: usize,
    pub metric: MetricId,
    pub metric_name: String,
    pub category: MetricCategory,
    pub stickiness_r2: f64,
    pub predictive_r2: f64,
    pub combined_score: f64,
    pub sample_size: usize,
}

trait Ranked {
    fn set_rank(&mut self, rank: usize);
}

impl Ranked for StickinessEntry {
    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

impl Ranked for PredictiveEntry {
    fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StickinessScore {
    r_squared: f64,
    sample_size: usize,
    years_analyzed: usize,
}

fn stickiness_score(seasons: &PitcherSeasons<'_>, metric: &MetricDescriptor) -> StickinessScore {
    let consecutive = seasons.stickiness_pairs(metric.id.as_str());
    let result = correlate(&consecutive.pairs);
    let years_analyzed = if consecutive.len() < MIN_CORRELATION_PAIRS {
        0
    } else {
        consecutive.years_analyzed()
    };

    StickinessScore {
        r_squared: result.r_squared,
        sample_size: result.sample_size,
        years_analyzed,
    }
}

/// Every catalog metric with at least `min_pairs` consecutive-season pairs,
/// ordered by year-over-year R².
pub fn rank_stickiness(
    catalog: &MetricCatalog,
    seasons: &PitcherSeasons<'_>,
    min_pairs: usize,
) -> Vec<StickinessEntry> {
    let mut entries = Vec::new();
    for metric in catalog.iter() {
        let score = stickiness_score(seasons, metric);
        if score.sample_size < min_pairs {
            tracing::debug!(
                metric = %metric.id,
                sample_size = score.sample_size,
                min_pairs,
                "metric below stickiness threshold"
            );
            continue;
        }

        entries.push(StickinessEntry {
            rank: 0,
            metric: metric.id.clone(),
            metric_name: metric.name.clone(),
            category: metric.category,
            r_squared: score.r_squared,
            sample_size: score.sample_size,
            years_analyzed: score.years_analyzed,
        });
    }

    entries.sort_by(|left, right| right.r_squared.total_cmp(&left.r_squared));
    assign_ranks(&mut entries);
    entries
}

/// Every catalog metric except `target`, scored by the mean of its own
/// stickiness and its next-season R² against `target`.
pub fn rank_predictive(
    catalog: &MetricCatalog,
    seasons: &PitcherSeasons<'_>,
    target: &MetricDescriptor,
    min_pairs: usize,
) -> Vec<PredictiveEntry> {
    let mut entries = Vec::new();
    for metric in catalog.iter() {
        if metric.id == target.id {
            continue;
        }

        let stickiness = stickiness_score(seasons, metric);
        let predictive = correlate(
            &seasons
                .predictive_pairs(metric.id.as_str(), target.id.as_str())
                .pairs,
        );
        if stickiness.sample_size < min_pairs || predictive.sample_size < min_pairs {
            tracing::debug!(
                metric = %metric.id,
                target = %target.id,
                stickiness_sample = stickiness.sample_size,
                predictive_sample = predictive.sample_size,
                min_pairs,
                "metric below predictive threshold"
            );
            continue;
        }

        let combined = (stickiness.r_squared + predictive.r_squared) / 2.0;
        entries.push(PredictiveEntry {
            rank: 0,
            metric: metric.id.clone(),
            metric_name: metric.name.clone(),
            category: metric.category,
            stickiness_r2: stickiness.r_squared,
            predictive_r2: predictive.r_squared,
            combined_score: round_to(combined, STAT_DECIMALS),
            sample_size: stickiness.sample_size.min(predictive.sample_size),
        });
    }

    entries.sort_by(|left, right| right.combined_score.total_cmp(&left.combined_score));
    assign_ranks(&mut entries);
    entries
}

fn assign_ranks<T: Ranked>(entries: &mut [T]) {
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.set_rank(position + 1);
    }
}
