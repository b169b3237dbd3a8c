//! Command line definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::analyze::AnalyzeArgs;
use crate::commands::config::ConfigCommands;
use crate::commands::describe::DescribeArgs;
use crate::commands::ztest::ZTestArgs;
use crate::output::OutputFormat;

/// Statistical comparison of an A/B test's control and test groups
#[derive(Debug, Parser)]
#[command(name = "abtest", version, about, propagate_version = true)]
pub struct Cli {
    /// Configuration file layered over the user and local config files
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full analysis and print the report
    Analyze(AnalyzeArgs),

    /// Print the descriptive report of both groups only
    Describe(DescribeArgs),

    /// Two-proportion z-test on raw counts
    Ztest(ZTestArgs),

    /// Inspect the effective configuration
    Config(ConfigCommands),
}

/// Where the two samples come from
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Workbook holding one sheet per group
    #[arg(long, value_name = "PATH", conflicts_with_all = ["control_csv", "test_csv"])]
    pub workbook: Option<PathBuf>,

    /// Sheet with the control group
    #[arg(long, value_name = "SHEET")]
    pub control_sheet: Option<String>,

    /// Sheet with the test group
    #[arg(long, value_name = "SHEET")]
    pub test_sheet: Option<String>,

    /// CSV file with the control group
    #[arg(long, value_name = "PATH", requires = "test_csv")]
    pub control_csv: Option<PathBuf>,

    /// CSV file with the test group
    #[arg(long, value_name = "PATH", requires = "control_csv")]
    pub test_csv: Option<PathBuf>,
}

/// Analysis settings that can be overridden per run
#[derive(Debug, Clone, Default, Args)]
pub struct AnalysisArgs {
    /// Significance level
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Column compared between the groups
    #[arg(long, value_name = "COLUMN")]
    pub metric: Option<String>,

    /// Column whose sum is the trial count of the proportion test
    #[arg(long, value_name = "COLUMN")]
    pub trials: Option<String>,
}
