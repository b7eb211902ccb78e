use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(String);

impl MetricId {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.len() == value.len() {
            Self(value)
        } else {
            Self(trimmed.to_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MetricId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MetricId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricCategory {
    Velocity,
    Spin,
    #[serde(rename = "Plate Discipline")]
    PlateDiscipline,
    Command,
    Movement,
    #[serde(rename = "ERA Estimators")]
    EraEstimators,
    Traditional,
    #[serde(rename = "Strikeouts & Walks")]
    StrikeoutsAndWalks,
    #[serde(rename = "Home Runs")]
    HomeRuns,
    Value,
    #[serde(rename = "Batted Ball")]
    BattedBall,
    #[serde(rename = "Contact Quality")]
    ContactQuality,
}

impl MetricCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Velocity => "Velocity",
            Self::Spin => "Spin",
            Self::PlateDiscipline => "Plate Discipline",
            Self::Command => "Command",
            Self::Movement => "Movement",
            Self::EraEstimators => "ERA Estimators",
            Self::Traditional => "Traditional",
            Self::StrikeoutsAndWalks => "Strikeouts & Walks",
            Self::HomeRuns => "Home Runs",
            Self::Value => "Value",
            Self::BattedBall => "Batted Ball",
            Self::ContactQuality => "Contact Quality",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub id: MetricId,
    pub name: String,
    pub description: String,
    pub category: MetricCategory,
}

impl MetricDescriptor {
    pub fn new(id: &str, name: &str, description: &str, category: MetricCategory) -> Self {
        Self {
            id: MetricId::new(id),
            name: name.to_owned(),
            description: description.to_owned(),
            category,
        }
    }
}

/// Builtin pitching metrics as `(id, display name, description, category)`.
///
/// Season rows are keyed by these ids; anything not listed here is never
/// analyzed.
pub const BUILTIN_METRICS: &[(&str, &str, &str, MetricCategory)] = &[
    (
        "avg_velocity",
        "Avg Fastball Velocity",
        "Average velocity on fastballs (mph)",
        MetricCategory::Velocity,
    ),
    (
        "max_velocity",
        "Max Velocity",
        "Maximum pitch velocity (mph)",
        MetricCategory::Velocity,
    ),
    (
        "avg_spin_rate",
        "Avg Spin Rate",
        "Average spin rate across all pitches (rpm)",
        MetricCategory::Spin,
    ),
    (
        "whiff_pct",
        "Whiff %",
        "Swinging strike rate (%)",
        MetricCategory::PlateDiscipline,
    ),
    (
        "strike_pct",
        "Strike %",
        "Percentage of pitches that are strikes (%)",
        MetricCategory::Command,
    ),
    (
        "zone_pct",
        "Zone %",
        "Percentage of pitches in the strike zone (%)",
        MetricCategory::Command,
    ),
    (
        "chase_pct",
        "Chase %",
        "Swings on pitches outside the zone (%)",
        MetricCategory::PlateDiscipline,
    ),
    (
        "h_movement",
        "Horizontal Movement",
        "Average horizontal break on breaking balls (in)",
        MetricCategory::Movement,
    ),
    (
        "v_movement",
        "Vertical Movement",
        "Average vertical rise on fastballs (in)",
        MetricCategory::Movement,
    ),
    (
        "first_strike_pct",
        "First Pitch Strike %",
        "Strikes on the first pitch of an at-bat (%)",
        MetricCategory::Command,
    ),
    (
        "era",
        "ERA",
        "Earned Run Average",
        MetricCategory::EraEstimators,
    ),
    (
        "fip",
        "FIP",
        "Fielding Independent Pitching",
        MetricCategory::EraEstimators,
    ),
    (
        "xfip",
        "xFIP",
        "Expected FIP (normalized HR/FB rate)",
        MetricCategory::EraEstimators,
    ),
    (
        "siera",
        "SIERA",
        "Skill-Interactive ERA",
        MetricCategory::EraEstimators,
    ),
    (
        "whip",
        "WHIP",
        "Walks + Hits per Inning Pitched",
        MetricCategory::Traditional,
    ),
    (
        "k_per_9",
        "K/9",
        "Strikeouts per 9 innings",
        MetricCategory::StrikeoutsAndWalks,
    ),
    (
        "bb_per_9",
        "BB/9",
        "Walks per 9 innings",
        MetricCategory::StrikeoutsAndWalks,
    ),
    (
        "hr_per_9",
        "HR/9",
        "Home runs per 9 innings",
        MetricCategory::HomeRuns,
    ),
    ("war", "WAR", "Wins Above Replacement", MetricCategory::Value),
    (
        "gb_pct",
        "GB%",
        "Ground ball percentage",
        MetricCategory::BattedBall,
    ),
    (
        "fb_pct",
        "FB%",
        "Fly ball percentage",
        MetricCategory::BattedBall,
    ),
    (
        "ld_pct",
        "LD%",
        "Line drive percentage",
        MetricCategory::BattedBall,
    ),
    (
        "hard_hit_pct",
        "Hard%",
        "Hard hit ball percentage",
        MetricCategory::ContactQuality,
    ),
    (
        "barrel_pct",
        "Barrel%",
        "Barrel rate (optimal exit velo + launch angle)",
        MetricCategory::ContactQuality,
    ),
];

/// Immutable registry of analyzable metrics, iterated in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCatalog {
    descriptors: Vec<MetricDescriptor>,
    index: HashMap<MetricId, usize>,
}

impl MetricCatalog {
    pub fn new(descriptors: Vec<MetricDescriptor>) -> Result<Self, CoreError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (position, descriptor) in descriptors.iter().enumerate() {
            if descriptor.id.as_str().is_empty() {
                return Err(CoreError::EmptyMetricId(position));
            }
            if index.insert(descriptor.id.clone(), position).is_some() {
                return Err(CoreError::DuplicateMetric(descriptor.id.to_string()));
            }
        }

        Ok(Self { descriptors, index })
    }

    pub fn builtin() -> Self {
        let descriptors = BUILTIN_METRICS
            .iter()
            .map(|(id, name, description, category)| {
                MetricDescriptor::new(id, name, description, *category)
            })
            .collect::<Vec<_>>();
        let index = descriptors
            .iter()
            .enumerate()
            .map(|(position, descriptor)| (descriptor.id.clone(), position))
            .collect();

        Self { descriptors, index }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.iter()
    }

    pub fn descriptors(&self) -> &[MetricDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, id: &str) -> Option<&MetricDescriptor> {
        self.index
            .get(id.trim())
            .map(|position| &self.descriptors[*position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn resolve(&self, id: &str) -> Result<&MetricDescriptor, CoreError> {
        self.get(id)
            .ok_or_else(|| CoreError::UnknownMetric(id.trim().to_owned()))
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn builtin_catalog_has_unique_ids_in_declaration_order() {
        let catalog = MetricCatalog::builtin();
        assert_eq!(catalog.len(), BUILTIN_METRICS.len());

        let unique = BUILTIN_METRICS
            .iter()
            .map(|(id, ..)| *id)
            .collect::<HashSet<_>>();
        assert_eq!(unique.len(), BUILTIN_METRICS.len());

        let ids = catalog
            .iter()
            .map(|descriptor| descriptor.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids.first().copied(), Some("avg_velocity"));
        assert_eq!(ids.last().copied(), Some("barrel_pct"));

        let rebuilt = MetricCatalog::new(catalog.descriptors().to_vec()).expect("rebuild catalog");
        assert_eq!(rebuilt, catalog);
    }

    #[test]
    fn resolve_rejects_unknown_metric_and_trims_known_ones() {
        let catalog = MetricCatalog::builtin();

        let era = catalog.resolve(" era ").expect("era is builtin");
        assert_eq!(era.name, "ERA");
        assert_eq!(era.category, MetricCategory::EraEstimators);

        let err = catalog.resolve("spin_efficiency").expect_err("unknown metric");
        assert_eq!(err, CoreError::UnknownMetric("spin_efficiency".to_owned()));
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let descriptors = vec![
            MetricDescriptor::new("era", "ERA", "Earned Run Average", MetricCategory::Traditional),
            MetricDescriptor::new("era", "ERA again", "dup", MetricCategory::Traditional),
        ];

        let err = MetricCatalog::new(descriptors).expect_err("duplicate should fail");
        assert_eq!(err, CoreError::DuplicateMetric("era".to_owned()));
    }

    #[test]
    fn new_rejects_empty_ids() {
        let descriptors = vec![
            MetricDescriptor::new("era", "ERA", "Earned Run Average", MetricCategory::Traditional),
            MetricDescriptor::new("", "Blank", "no id", MetricCategory::Traditional),
        ];

        let err = MetricCatalog::new(descriptors).expect_err("empty id should fail");
        assert_eq!(err, CoreError::EmptyMetricId(1));
        assert_eq!(err.to_string(), "metric at position 1 has an empty id");
    }

    #[test]
    fn category_serializes_with_display_name() {
        let json = serde_json::to_string(&MetricCategory::StrikeoutsAndWalks).expect("serialize");
        assert_eq!(json, "\"Strikeouts & Walks\"");

        let categories = MetricCatalog::builtin()
            .iter()
            .map(|descriptor| descriptor.category)
            .collect::<HashSet<_>>();
        assert!(categories.contains(&MetricCategory::Velocity));
        assert!(categories.contains(&MetricCategory::EraEstimators));
        assert!(categories.contains(&MetricCategory::PlateDiscipline));
        assert_eq!(categories.len(), 12);
    }
}
