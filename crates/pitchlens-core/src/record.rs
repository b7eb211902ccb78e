use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::CoreError;
use crate::metric::MetricId;

pub const EARLIEST_SEASON: i32 = 1871;
pub const LATEST_SEASON: i32 = 2100;
pub const DEFAULT_MIN_INNINGS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Starter,
    Reliever,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Reliever => "reliever",
        }
    }

    pub fn is_starter(self) -> bool {
        self == Self::Starter
    }

    pub fn from_is_starter(is_starter: bool) -> Self {
        if is_starter {
            Self::Starter
        } else {
            Self::Reliever
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starter" | "sp" => Ok(Self::Starter),
            "reliever" | "rp" => Ok(Self::Reliever),
            other => Err(format!(
                "invalid role '{other}', expected one of: starter, reliever"
            )),
        }
    }
}

/// One pitcher's aggregated season. A metric missing from `metrics` was not
/// computed for that season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub pitcher_id: i64,
    pub pitcher_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub year: i32,
    pub role: Role,
    pub innings_pitched: f64,
    #[serde(default)]
    pub metrics: BTreeMap<MetricId, f64>,
}

impl SeasonRecord {
    pub fn new(pitcher_id: i64, pitcher_name: impl Into<String>, year: i32, role: Role) -> Self {
        Self {
            pitcher_id,
            pitcher_name: pitcher_name.into(),
            team: None,
            year,
            role,
            innings_pitched: 0.0,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_innings(mut self, innings_pitched: f64) -> Self {
        self.innings_pitched = innings_pitched;
        self
    }

    pub fn with_metric(mut self, metric: impl Into<MetricId>, value: f64) -> Self {
        self.metrics.insert(metric.into(), value);
        self
    }

    /// Value for `metric`, treating NaN and infinities as absent.
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.metrics
            .get(metric)
            .copied()
            .filter(|value| value.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub min_innings: f64,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            year: None,
            role: None,
            min_innings: DEFAULT_MIN_INNINGS,
        }
    }
}

impl RecordFilter {
    pub fn new(year: Option<i32>, role: Option<Role>, min_innings: f64) -> Self {
        Self {
            year,
            role,
            min_innings,
        }
    }

    pub fn all_years(role: Option<Role>, min_innings: f64) -> Self {
        Self::new(None, role, min_innings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.min_innings.is_finite() || self.min_innings < 0.0 {
            return Err(CoreError::InvalidFilter(format!(
                "min_innings must be a non-negative number, got {}",
                self.min_innings
            )));
        }
        if let Some(year) = self.year {
            validate_season(year)?;
        }
        Ok(())
    }

    /// A zero `min_innings` disables the innings floor.
    pub fn matches(&self, record: &SeasonRecord) -> bool {
        if self.year.is_some_and(|year| year != record.year) {
            return false;
        }
        if self.role.is_some_and(|role| role != record.role) {
            return false;
        }
        if self.min_innings > 0.0 && !(record.innings_pitched >= self.min_innings) {
            return false;
        }
        true
    }
}

pub fn validate_season(year: i32) -> Result<(), CoreError> {
    if !(EARLIEST_SEASON..=LATEST_SEASON).contains(&year) {
        return Err(CoreError::InvalidFilter(format!(
            "season {year} is outside {EARLIEST_SEASON}..={LATEST_SEASON}"
        )));
    }
    Ok(())
}

pub fn sort_by_pitcher_and_year(records: &mut [SeasonRecord]) {
    records.sort_by(|left, right| {
        left.pitcher_id
            .cmp(&right.pitcher_id)
            .then_with(|| left.year.cmp(&right.year))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, role: Role, innings: f64) -> SeasonRecord {
        SeasonRecord::new(7, "Test Arm", year, role).with_innings(innings)
    }

    #[test]
    fn value_treats_non_finite_as_missing() {
        let record = record(2023, Role::Starter, 120.0)
            .with_metric("era", 3.1)
            .with_metric("fip", f64::NAN);

        assert_eq!(record.value("era"), Some(3.1));
        assert_eq!(record.value("fip"), None);
        assert_eq!(record.value("xfip"), None);
    }

    #[test]
    fn filter_matches_year_role_and_innings_floor() {
        let filter = RecordFilter::new(Some(2023), Some(Role::Starter), 50.0);

        assert!(filter.matches(&record(2023, Role::Starter, 50.0)));
        assert!(!filter.matches(&record(2023, Role::Starter, 49.9)));
        assert!(!filter.matches(&record(2022, Role::Starter, 180.0)));
        assert!(!filter.matches(&record(2023, Role::Reliever, 70.0)));

        let no_floor = RecordFilter::all_years(None, 0.0);
        assert!(no_floor.matches(&record(2019, Role::Reliever, 0.0)));
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_innings() {
        assert!(RecordFilter::all_years(None, 0.0).validate().is_ok());
        assert!(RecordFilter::default().validate().is_ok());

        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = RecordFilter::all_years(None, bad)
                .validate()
                .expect_err("invalid innings");
            assert!(matches!(err, CoreError::InvalidFilter(_)));
        }

        let err = RecordFilter::new(Some(1700), None, 10.0)
            .validate()
            .expect_err("invalid season");
        assert!(err.to_string().contains("1700"));
    }

    #[test]
    fn role_parses_aliases() {
        assert_eq!("Starter".parse::<Role>(), Ok(Role::Starter));
        assert_eq!("rp".parse::<Role>(), Ok(Role::Reliever));
        assert!("closer".parse::<Role>().is_err());
    }

    #[test]
    fn sort_orders_by_pitcher_then_year() {
        let mut records = vec![
            SeasonRecord::new(2, "B", 2022, Role::Starter),
            SeasonRecord::new(1, "A", 2024, Role::Starter),
            SeasonRecord::new(1, "A", 2023, Role::Starter),
        ];
        sort_by_pitcher_and_year(&mut records);

        let keys = records
            .iter()
            .map(|record| (record.pitcher_id, record.year))
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![(1, 2023), (1, 2024), (2, 2022)]);
    }
}
