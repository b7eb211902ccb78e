use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use pitchlens_analysis::{
    CorrelationReport, CorrelationRequest, DiscoverAnalyzer, PredictiveReport, PredictiveRequest,
    StickinessReport, StickinessRequest, TrendReport, TrendRequest,
};
use pitchlens_config::PitchLensConfig;
use pitchlens_core::MetricDescriptor;
use pitchlens_store::{SeasonRecordSource, SqliteStore};
use serde::Serialize;

use crate::cli::{
    Commands, CorrelateArgs, FilterArgs, OutputFormat, PredictiveArgs, StickinessArgs, TrendArgs,
};
use crate::import::run_import;

pub fn run_command(
    workspace: &Path,
    config: &PitchLensConfig,
    command: Commands,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    if let Commands::Import(args) = &command {
        run_import(workspace, config, &args.file, out)?;
        return Ok(());
    }

    let store = SqliteStore::open(workspace, config).context("failed to open season store")?;
    let min_pairs = match &command {
        Commands::Stickiness(args) => args.min_pairs,
        Commands::Predictive(args) => args.min_pairs,
        _ => None,
    };
    let analyzer = DiscoverAnalyzer::new(store)
        .with_ranking_min_pairs(min_pairs.unwrap_or(config.analysis.ranking_min_pairs));

    run_analysis(&analyzer, config, command, format, out)
}

/// Runs one analysis command against `analyzer` and renders the report.
pub fn run_analysis<S: SeasonRecordSource>(
    analyzer: &DiscoverAnalyzer<S>,
    config: &PitchLensConfig,
    command: Commands,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Commands::Metrics => write_metrics(analyzer.available_metrics(), format, out),
        Commands::Import(_) => bail!("import does not run against an analyzer"),
        Commands::Correlate(args) => {
            let report = analyzer
                .correlate(correlation_request(args, config))
                .context("correlation failed")?;
            write_correlation(&report, format, out)
        }
        Commands::Stickiness(args) => {
            let report = analyzer
                .stickiness_rankings(stickiness_request(args, config))
                .context("stickiness ranking failed")?;
            write_stickiness(&report, format, out)
        }
        Commands::Predictive(args) => {
            let report = analyzer
                .predictive_rankings(predictive_request(args, config))
                .context("predictive ranking failed")?;
            write_predictive(&report, format, out)
        }
        Commands::Trend(args) => {
            let report = analyzer
                .trend(trend_request(args, config))
                .context("trend analysis failed")?;
            write_trend(&report, format, out)
        }
    }
}

fn min_innings(filters: &FilterArgs, config: &PitchLensConfig) -> f64 {
    filters.min_innings.unwrap_or(config.analysis.min_innings)
}

pub fn correlation_request(args: CorrelateArgs, config: &PitchLensConfig) -> CorrelationRequest {
    CorrelationRequest {
        min_innings: min_innings(&args.filters, config),
        year: args.year,
        role: args.filters.role,
        metric_x: args.metric_x,
        metric_y: args.metric_y,
    }
}

pub fn stickiness_request(args: StickinessArgs, config: &PitchLensConfig) -> StickinessRequest {
    StickinessRequest {
        role: args.filters.role,
        min_innings: min_innings(&args.filters, config),
    }
}

pub fn predictive_request(args: PredictiveArgs, config: &PitchLensConfig) -> PredictiveRequest {
    PredictiveRequest {
        min_innings: min_innings(&args.filters, config),
        role: args.filters.role,
        target_metric: args
            .target
            .unwrap_or_else(|| config.analysis.default_target_metric.clone()),
    }
}

pub fn trend_request(args: TrendArgs, config: &PitchLensConfig) -> TrendRequest {
    TrendRequest {
        min_innings: min_innings(&args.filters, config),
        role: args.filters.role,
        start_year: args.start_year.unwrap_or(config.analysis.trend_start_year),
        end_year: args.end_year.unwrap_or(config.analysis.trend_end_year),
        metric_x: args.metric_x,
        metric_y: args.metric_y,
    }
}

pub fn write_metrics(
    metrics: &[MetricDescriptor],
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(&metrics, out);
    }

    writeln!(out, "id\tname\tcategory\tdescription")?;
    for metric in metrics {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            metric.id,
            normalize_field(&metric.name),
            metric.category,
            normalize_field(&metric.description)
        )?;
    }
    Ok(())
}

pub fn write_correlation(
    report: &CorrelationReport,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(report, out);
    }

    writeln!(
        out,
        "metric_x\tmetric_y\tsample_size\tstatus\tcorrelation_r\tr_squared\tp_value\tequation"
    )?;
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        report.metric_x,
        report.metric_y,
        report.sample_size,
        report.status.as_str(),
        report.correlation_r,
        report.r_squared,
        report.p_value,
        report.regression.equation
    )?;
    writeln!(out)?;
    writeln!(out, "pitcher_id\tyear\tname\tteam\tx\ty")?;
    for point in &report.scatter {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            point.pitcher_id,
            point.year,
            normalize_field(&point.name),
            normalize_field(point.team.as_deref().unwrap_or("-")),
            point.x,
            point.y
        )?;
    }
    Ok(())
}

pub fn write_stickiness(
    report: &StickinessReport,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(report, out);
    }

    writeln!(
        out,
        "rank\tmetric\tname\tcategory\tr_squared\tsample_size\tyears_analyzed"
    )?;
    for entry in &report.entries {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            entry.rank,
            entry.metric,
            normalize_field(&entry.metric_name),
            entry.category,
            entry.r_squared,
            entry.sample_size,
            entry.years_analyzed
        )?;
    }
    Ok(())
}

pub fn write_predictive(
    report: &PredictiveReport,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(report, out);
    }

    writeln!(
        out,
        "rank\tmetric\tname\tcategory\tstickiness_r2\tpredictive_r2\tcombined_score\tsample_size"
    )?;
    for entry in &report.entries {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            entry.rank,
            entry.metric,
            normalize_field(&entry.metric_name),
            entry.category,
            entry.stickiness_r2,
            entry.predictive_r2,
            entry.combined_score,
            entry.sample_size
        )?;
    }
    Ok(())
}

pub fn write_trend(report: &TrendReport, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(report, out);
    }

    writeln!(out, "metric_x\tmetric_y\tseasons\tdirection\tavg_r_squared")?;
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}",
        report.metric_x,
        report.metric_y,
        report.points.len(),
        report.direction.as_str(),
        report.avg_r_squared
    )?;
    writeln!(out)?;
    writeln!(out, "year\tr_squared\tcorrelation_r\tsample_size")?;
    for point in &report.points {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            point.year, point.r_squared, point.correlation_r, point.sample_size
        )?;
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(value: &T, out: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialize report")?;
    writeln!(out)?;
    Ok(())
}

fn normalize_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}
