use std::ffi::OsStr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pitchlens_core::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid log format '{other}', expected one of: human, json"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid output format '{other}', expected one of: table, json"
            )),
        }
    }
}

/// Record filters shared by every analysis command. Unset values fall back to
/// `.pitchlens/config.toml`.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct FilterArgs {
    #[arg(
        long,
        value_parser = parse_role,
        help = "Restrict to one role: starter or reliever"
    )]
    pub role: Option<Role>,

    #[arg(long, help = "Minimum innings pitched per season (0 disables the floor)")]
    pub min_innings: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ImportArgs {
    #[arg(help = "JSON file holding an array of season rows")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct CorrelateArgs {
    #[arg(long = "x", help = "Metric on the x axis")]
    pub metric_x: String,

    #[arg(long = "y", help = "Metric on the y axis")]
    pub metric_y: String,

    #[arg(long, help = "Single season to analyze; all seasons when omitted")]
    pub year: Option<i32>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct StickinessArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long, help = "Minimum consecutive-season pairs for a metric to be ranked")]
    pub min_pairs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct PredictiveArgs {
    #[arg(long, help = "Metric to predict in the following season")]
    pub target: Option<String>,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long, help = "Minimum consecutive-season pairs for a metric to be ranked")]
    pub min_pairs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct TrendArgs {
    #[arg(long = "x", help = "Metric on the x axis")]
    pub metric_x: String,

    #[arg(long = "y", help = "Metric on the y axis")]
    pub metric_y: String,

    #[arg(long, help = "First season of the range")]
    pub start_year: Option<i32>,

    #[arg(long, help = "Last season of the range")]
    pub end_year: Option<i32>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Commands {
    /// List every analyzable metric
    Metrics,
    /// Load season rows from a JSON file into the local store
    Import(ImportArgs),
    /// Correlate two metrics with a regression line and scatter points
    Correlate(CorrelateArgs),
    /// Rank metrics by year-over-year repeatability
    Stickiness(StickinessArgs),
    /// Rank metrics by how well they predict a target metric next season
    Predictive(PredictiveArgs),
    /// Track the correlation between two metrics season by season
    Trend(TrendArgs),
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "PitchLens season metric discovery")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Workspace root holding .pitchlens/"
    )]
    pub workspace: PathBuf,

    #[arg(
        long,
        global = true,
        default_value = "human",
        value_parser = parse_log_format,
        help = "Log format: human or json"
    )]
    pub log_format: LogFormat,

    #[arg(
        long,
        global = true,
        default_value = "table",
        value_parser = parse_output_format,
        help = "Output format: table or json"
    )]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

pub fn parse_cli() -> Cli {
    let mut args: Vec<_> = std::env::args_os().collect();
    if args.get(1).is_some_and(|arg| arg == OsStr::new("--")) {
        args.remove(1);
    }

    Cli::parse_from(args)
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse()
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    value.parse()
}
