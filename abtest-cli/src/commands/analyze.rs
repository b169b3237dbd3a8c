//! Full analysis command

use abtest_core::Group;
use abtest_metrics::DescriptiveSummary;
use abtest_workflow::{AbTestPipeline, AnalysisReport};
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::Cell;

use crate::cli::{AnalysisArgs, SourceArgs};
use crate::commands::describe::{print_description, summary_table};
use crate::context::Context;
use crate::output::{
    decision_badge, format_number, format_p_value, format_timestamp, new_table, print_field,
    print_section, TableDisplay,
};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

pub fn execute(ctx: &Context, args: AnalyzeArgs) -> Result<()> {
    let mut settings = ctx.settings.clone();
    settings.apply_args(&args.source, &args.analysis)?;

    let source = settings.source.open()?;
    let pipeline = AbTestPipeline::new(settings.analysis)?;
    let report = pipeline
        .run(source.as_ref())
        .context("A/B analysis failed")?;

    ctx.output.write(&report)
}

impl TableDisplay for AnalysisReport {
    fn display_table(&self) {
        print_section("A/B Test Analysis");
        print_field("Run", &self.run_id.to_string());
        print_field("Generated", &format_timestamp(&self.generated_at));
        print_field("Source", &self.source);
        print_field("Alpha", &self.config.alpha.to_string());
        print_field("Metric", &self.config.metric_column);

        for description in &self.descriptions {
            print_description(description);
        }

        print_comparisons(self);
        print_assumptions(self);
        print_mean_comparison(self);
        print_proportions(self);

        print_section("Conclusion");
        for line in self.conclusion() {
            println!("  • {}", line);
        }
    }
}

fn print_comparisons(report: &AnalysisReport) {
    if report.comparisons.is_empty() {
        return;
    }

    print_section("Group comparison");
    for comparison in &report.comparisons {
        println!("{}", comparison.column.bold());
        let summaries: [Option<&DescriptiveSummary>; 2] =
            [comparison.control.as_ref(), comparison.test.as_ref()];
        println!(
            "{}",
            summary_table(&[Group::Control.label(), Group::Test.label()], &summaries)
        );
    }

    let confidence = report
        .intervals
        .first()
        .map(|i| i.confidence)
        .unwrap_or(report.config.confidence_level);
    println!(
        "{}",
        format!(
            "{}% confidence interval of the mean {}",
            confidence * 100.0,
            report.config.metric_column
        )
        .bold()
    );
    let mut table = new_table(&["Group", "Mean", "Lower", "Upper"]);
    for interval in &report.intervals {
        table.add_row(vec![
            interval.group.to_string(),
            format_number(interval.mean),
            format_number(interval.lower),
            format_number(interval.upper),
        ]);
    }
    println!("{table}");
}

fn print_assumptions(report: &AnalysisReport) {
    print_section("Assumption checks");
    let mut table = new_table(&["Check", "Group", "Statistic", "p-value", "Decision"]);
    for check in &report.normality {
        table.add_row(vec![
            Cell::new("Shapiro-Wilk normality"),
            Cell::new(check.group),
            Cell::new(format_number(check.result.statistic)),
            Cell::new(format_p_value(check.result.p_value)),
            Cell::new(check.decision),
        ]);
    }
    table.add_row(vec![
        Cell::new("Levene homogeneity"),
        Cell::new("both"),
        Cell::new(format_number(report.variance.result.statistic)),
        Cell::new(format_p_value(report.variance.result.p_value)),
        Cell::new(report.variance.decision),
    ]);
    println!("{table}");
}

fn print_mean_comparison(report: &AnalysisReport) {
    let mean = &report.mean_comparison;
    print_section("Mean comparison");
    print_field("Test", mean.variant.name());
    print_field(
        "Chosen because",
        &format!(
            "control normal: {}, test normal: {}, equal variance: {}",
            mean.rationale.control_normal,
            mean.rationale.test_normal,
            mean.rationale.equal_variance
        ),
    );
    print_field("Statistic", &format_number(mean.result.statistic));
    print_field("p-value", &format_p_value(mean.result.p_value));
    print_field("Decision", &decision_badge(mean.decision).to_string());
    print_field(
        "Means",
        &format!(
            "{} vs {}",
            format_number(mean.control_mean),
            format_number(mean.test_mean)
        ),
    );
    print_field(
        "Medians",
        &format!(
            "{} vs {}",
            format_number(mean.control_median),
            format_number(mean.test_median)
        ),
    );
    print_field("Cohen's d", &format_number(mean.effect_size));
}

fn print_proportions(report: &AnalysisReport) {
    let proportion = &report.proportion;
    print_section(&format!(
        "Conversion rate ({} / {})",
        report.config.metric_column, report.config.trials_column
    ));

    let min_size = format!("n > {}", report.config.min_group_size);
    let mut table = new_table(&[
        "Group",
        "Successes",
        "Trials",
        "Rate",
        "Observations",
        min_size.as_str(),
    ]);
    for conversion in [&proportion.control, &proportion.test] {
        let size = if conversion.meets_min_size {
            Cell::new("yes").fg(comfy_table::Color::Green)
        } else {
            Cell::new("no").fg(comfy_table::Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(conversion.group),
            Cell::new(format_number(conversion.successes)),
            Cell::new(format_number(conversion.trials)),
            Cell::new(format!("{:.4}%", conversion.rate * 100.0)),
            Cell::new(conversion.observations),
            size,
        ]);
    }
    println!("{table}");

    print_field("z", &format_number(proportion.result.statistic));
    print_field("p-value", &format_p_value(proportion.result.p_value));
    print_field("Decision", &decision_badge(proportion.decision).to_string());
    print_field(
        "Higher rate",
        &proportion
            .higher_rate
            .map(|g| g.to_string())
            .unwrap_or_else(|| "equal".to_string()),
    );
}
