use anyhow::Result;
use pitchlens_analysis::{
    CorrelationRequest, CorrelationStatus, DiscoverAnalyzer, PredictiveRequest, StickinessRequest,
    TrendDirection, TrendRequest,
};
use pitchlens_config::{PitchLensConfig, ensure_workspace_config};
use pitchlens_core::{Role, SeasonRecord};
use pitchlens_store::SqliteStore;
use tempfile::tempdir;

// pitcher_id, name, team, role
type Pitcher = (i64, &'static str, &'static str, Role);
// avg_velocity, whiff_pct, era, fip, k_per_9
type Line = [f64; 5];

const JONES: Pitcher = (1, "Flamethrower Jones", "NYY", Role::Starter);
const SMITH: Pitcher = (2, "Control Master Smith", "LAD", Role::Starter);
const WILLIAMS: Pitcher = (3, "Whiff King Williams", "HOU", Role::Reliever);
const DAVIS: Pitcher = (4, "Movement Maven Davis", "ATL", Role::Starter);
const BROWN: Pitcher = (5, "Spin Doctor Brown", "SD", Role::Reliever);

fn season(pitcher: Pitcher, year: i32, innings: f64, line: Line) -> SeasonRecord {
    let (pitcher_id, name, team, role) = pitcher;
    let [velocity, whiff, era, fip, k_per_9] = line;
    SeasonRecord::new(pitcher_id, name, year, role)
        .with_team(team)
        .with_innings(innings)
        .with_metric("avg_velocity", velocity)
        .with_metric("whiff_pct", whiff)
        .with_metric("era", era)
        .with_metric("fip", fip)
        .with_metric("k_per_9", k_per_9)
}

fn fixture() -> Vec<SeasonRecord> {
    vec![
        season(JONES, 2023, 200.0, [97.5, 32.5, 2.85, 2.92, 11.5]),
        season(SMITH, 2023, 185.0, [92.0, 24.0, 3.25, 3.40, 8.5]),
        season(WILLIAMS, 2023, 72.0, [96.0, 38.0, 2.50, 2.30, 13.5]),
        season(DAVIS, 2023, 170.0, [94.5, 28.0, 3.10, 3.00, 10.0]),
        season(BROWN, 2023, 65.0, [93.0, 30.0, 3.45, 3.50, 10.5]),
        season(JONES, 2024, 210.0, [97.0, 31.0, 2.95, 3.00, 11.0]),
        season(SMITH, 2024, 180.0, [91.5, 23.5, 3.35, 3.50, 8.2]),
        season(WILLIAMS, 2024, 75.0, [95.5, 36.5, 2.65, 2.45, 13.0]),
        season(DAVIS, 2024, 180.0, [94.0, 27.0, 3.25, 3.15, 9.5]),
    ]
}

fn seeded_store(workspace: &std::path::Path) -> Result<SqliteStore> {
    let config = ensure_workspace_config(workspace)?;
    let store = SqliteStore::open(workspace, &config)?;
    store.upsert_season_records(&fixture())?;
    Ok(store)
}

#[test]
fn available_metrics_cover_expected_categories() -> Result<()> {
    let temp = tempdir()?;
    let analyzer = DiscoverAnalyzer::new(seeded_store(temp.path())?);

    let metrics = analyzer.available_metrics();
    assert_eq!(metrics.len(), 24);
    let categories = metrics
        .iter()
        .map(|metric| metric.category.as_str())
        .collect::<Vec<_>>();
    assert!(categories.contains(&"Velocity"));
    assert!(categories.contains(&"ERA Estimators"));
    assert!(categories.contains(&"Plate Discipline"));
    Ok(())
}

#[test]
fn correlation_over_stored_seasons() -> Result<()> {
    let temp = tempdir()?;
    let analyzer = DiscoverAnalyzer::new(seeded_store(temp.path())?);

    let report = analyzer.correlate(CorrelationRequest::new("avg_velocity", "whiff_pct"))?;
    assert_eq!(report.sample_size, 9);
    assert_eq!(report.scatter.len(), 9);
    assert_eq!(report.status, CorrelationStatus::Computed);
    assert!((-1.0..=1.0).contains(&report.correlation_r));
    assert!((0.0..=1.0).contains(&report.r_squared));
    assert!(report.regression.equation.starts_with("y = "));
    assert_eq!(report.scatter[0].name, "Flamethrower Jones");
    assert_eq!(report.scatter[0].team.as_deref(), Some("NYY"));

    let k_vs_era = analyzer.correlate(CorrelationRequest::new("k_per_9", "era"))?;
    assert!(k_vs_era.correlation_r < 0.0);
    assert!(k_vs_era.regression.slope < 0.0);
    Ok(())
}

#[test]
fn correlation_filters_reach_the_store() -> Result<()> {
    let temp = tempdir()?;
    let analyzer = DiscoverAnalyzer::new(seeded_store(temp.path())?);

    let mut request = CorrelationRequest::new("avg_velocity", "era");
    request.year = Some(2024);
    request.role = Some(Role::Starter);
    let report = analyzer.correlate(request)?;
    assert_eq!(report.sample_size, 3);
    assert!(report.scatter.iter().all(|point| point.year == 2024));

    let mut request = CorrelationRequest::new("avg_velocity", "era");
    request.min_innings = 180.0;
    let report = analyzer.correlate(request)?;
    let ids = report
        .scatter
        .iter()
        .map(|point| (point.pitcher_id, point.year))
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![(1, 2023), (1, 2024), (2, 2023), (2, 2024), (4, 2024)]);
    Ok(())
}

#[test]
fn stickiness_and_predictive_rankings_over_stored_seasons() -> Result<()> {
    let temp = tempdir()?;
    let analyzer = DiscoverAnalyzer::new(seeded_store(temp.path())?).with_ranking_min_pairs(3);

    let sticky = analyzer.stickiness_rankings(StickinessRequest::default())?;
    assert_eq!(sticky.pitchers_analyzed, 5);
    let ids = sticky
        .entries
        .iter()
        .map(|entry| entry.metric.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids.len(), 5);
    let velocity = &sticky.entries[0];
    assert_eq!(velocity.metric.as_str(), "avg_velocity");
    assert_eq!(velocity.r_squared, 1.0);
    assert_eq!(velocity.sample_size, 4);
    assert_eq!(velocity.years_analyzed, 2);

    let predictive = analyzer.predictive_rankings(PredictiveRequest::default())?;
    assert_eq!(predictive.target_metric.as_str(), "era");
    assert_eq!(predictive.entries.len(), 4);
    assert!(
        predictive
            .entries
            .iter()
            .all(|entry| entry.metric.as_str() != "era" && entry.sample_size == 4)
    );
    assert!(
        predictive
            .entries
            .windows(2)
            .all(|pair| pair[0].combined_score >= pair[1].combined_score)
    );

    let starters = analyzer.stickiness_rankings(StickinessRequest {
        role: Some(Role::Starter),
        min_innings: 50.0,
    })?;
    assert_eq!(starters.pitchers_analyzed, 3);
    assert!(starters.entries.iter().all(|entry| entry.sample_size == 3));
    Ok(())
}

#[test]
fn trend_over_stored_seasons() -> Result<()> {
    let temp = tempdir()?;
    let analyzer = DiscoverAnalyzer::new(seeded_store(temp.path())?);

    let report = analyzer.trend(TrendRequest::new("k_per_9", "era"))?;
    let years = report.points.iter().map(|point| point.year).collect::<Vec<_>>();
    assert_eq!(years, vec![2023, 2024]);
    assert_eq!(report.points[0].sample_size, 5);
    assert_eq!(report.points[1].sample_size, 4);
    assert_eq!(report.direction, TrendDirection::Stable);
    assert!(report.avg_r_squared > 0.0);
    Ok(())
}

#[test]
fn reopened_store_reproduces_identical_reports() -> Result<()> {
    let temp = tempdir()?;
    let first = DiscoverAnalyzer::new(seeded_store(temp.path())?).with_ranking_min_pairs(3);
    let sticky = first.stickiness_rankings(StickinessRequest::default())?;
    let correlation = first.correlate(CorrelationRequest::new("fip", "era"))?;
    drop(first);

    let config = PitchLensConfig::default();
    let second = DiscoverAnalyzer::new(SqliteStore::open(temp.path(), &config)?)
        .with_ranking_min_pairs(3);
    assert_eq!(second.stickiness_rankings(StickinessRequest::default())?, sticky);
    assert_eq!(second.correlate(CorrelationRequest::new("fip", "era"))?, correlation);
    Ok(())
}
