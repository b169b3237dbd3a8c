//! Descriptive report command

use abtest_metrics::DescriptiveSummary;
use abtest_workflow::{AbTestPipeline, GroupDescription};
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::{AnalysisArgs, SourceArgs};
use crate::context::Context;
use crate::output::{
    bar_width, density_bars, format_number, format_optional, new_table, print_section,
    TableDisplay,
};

/// Rows of the text density plot
const DENSITY_ROWS: usize = 16;

#[derive(Debug, Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Debug, Serialize)]
pub struct Descriptions {
    pub source: String,
    pub groups: Vec<GroupDescription>,
}

impl TableDisplay for Descriptions {
    fn display_table(&self) {
        println!("{} {}", "Source:".bold(), self.source);
        for description in &self.groups {
            print_description(description);
        }
    }
}

pub fn execute(ctx: &Context, args: DescribeArgs) -> Result<()> {
    let mut settings = ctx.settings.clone();
    settings.apply_args(&args.source, &args.analysis)?;

    let source = settings.source.open()?;
    let pipeline = AbTestPipeline::new(settings.analysis)?;
    let groups = pipeline
        .describe_only(source.as_ref())
        .context("Failed to describe samples")?;

    for description in groups.iter().filter(|d| d.density.is_none()) {
        ctx.output.warning(&format!(
            "{} {} has too little spread for a density estimate",
            description.group, description.density_column
        ));
    }

    ctx.output.write(&Descriptions {
        source: source.describe_source(),
        groups,
    })
}

/// Shape, column info, summary, first rows and density plot of one group
pub fn print_description(description: &GroupDescription) {
    print_section(&format!(
        "{} ({} rows × {} columns)",
        description.group, description.rows, description.columns
    ));

    let mut info = new_table(&["Column", "Dtype", "Non-null", "Nulls"]);
    for column in &description.info {
        let nulls = if column.nulls > 0 {
            Cell::new(column.nulls).fg(comfy_table::Color::Yellow)
        } else {
            Cell::new(column.nulls)
        };
        info.add_row(vec![
            Cell::new(&column.name),
            Cell::new(&column.dtype),
            Cell::new(column.non_null),
            nulls,
        ]);
    }
    println!("{info}");

    let names: Vec<&str> = description
        .summaries
        .iter()
        .map(|s| s.column.as_str())
        .collect();
    let summaries: Vec<Option<&DescriptiveSummary>> = description
        .summaries
        .iter()
        .map(|s| s.summary.as_ref())
        .collect();
    println!("{}", summary_table(&names, &summaries));

    if !description.head.is_empty() {
        println!("{}", "First rows".bold());
        let headers: Vec<&str> = description.head_columns.iter().map(String::as_str).collect();
        let mut head = new_table(&headers);
        for row in &description.head {
            head.add_row(row.iter().map(|v| format_optional(*v)).collect::<Vec<_>>());
        }
        println!("{head}");
    }

    match &description.density {
        Some(curve) => {
            println!(
                "{} {} (bandwidth {})",
                "Density of".bold(),
                description.density_column.bold(),
                format_number(curve.bandwidth)
            );
            for line in density_bars(curve, DENSITY_ROWS, bar_width()) {
                println!("{}", line);
            }
        }
        None => println!(
            "{}",
            format!("No density plot for {}", description.density_column).dimmed()
        ),
    }
}

/// Statistics as rows, one column per summarised column
pub fn summary_table(
    names: &[&str],
    summaries: &[Option<&DescriptiveSummary>],
) -> comfy_table::Table {
    let mut headers = vec!["Statistic"];
    headers.extend_from_slice(names);
    let mut table = new_table(&headers);

    let quantiles: Vec<f64> = summaries
        .iter()
        .flatten()
        .next()
        .map(|s| s.percentiles.iter().map(|p| p.quantile).collect())
        .unwrap_or_default();

    table.add_row(stat_row("count", summaries, |s| Some(s.count as f64)));
    table.add_row(stat_row("mean", summaries, |s| Some(s.mean)));
    table.add_row(stat_row("std", summaries, |s| s.std));
    table.add_row(stat_row("min", summaries, |s| Some(s.min)));
    for q in quantiles {
        table.add_row(stat_row(&percent_label(q), summaries, |s| s.percentile(q)));
    }
    table.add_row(stat_row("max", summaries, |s| Some(s.max)));
    table.add_row(stat_row("sum", summaries, |s| Some(s.sum)));
    table
}

fn stat_row(
    label: &str,
    summaries: &[Option<&DescriptiveSummary>],
    value: impl Fn(&DescriptiveSummary) -> Option<f64>,
) -> Vec<String> {
    let mut cells = vec![label.to_string()];
    cells.extend(
        summaries
            .iter()
            .map(|summary| format_optional(summary.and_then(|s| value(s)))),
    );
    cells
}

fn percent_label(quantile: f64) -> String {
    format!("{}%", (quantile * 1000.0).round() / 10.0)
}
