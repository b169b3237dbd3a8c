//! Ad hoc two-proportion z-test

use abtest_core::Group;
use abtest_metrics::{Decision, StatisticalAnalyzer, TestResult};
use anyhow::{bail, Context as _, Result};
use clap::Args;
use serde::Serialize;

use crate::context::Context;
use crate::output::{
    decision_badge, format_number, format_p_value, new_table, print_field, print_section,
    TableDisplay,
};

#[derive(Debug, Args)]
pub struct ZTestArgs {
    /// Successes of the control and test groups
    #[arg(long, num_args = 2, value_names = ["CONTROL", "TEST"], required = true)]
    pub successes: Vec<f64>,

    /// Trials of the control and test groups
    #[arg(long, num_args = 2, value_names = ["CONTROL", "TEST"], required = true)]
    pub trials: Vec<f64>,

    /// Significance level, defaults to the configured alpha
    #[arg(long)]
    pub alpha: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ZTestReport {
    pub successes: [f64; 2],
    pub trials: [f64; 2],
    pub rates: [f64; 2],
    pub alpha: f64,
    pub result: TestResult,
    pub decision: Decision,
    pub higher_rate: Option<Group>,
}

impl TableDisplay for ZTestReport {
    fn display_table(&self) {
        print_section("Two-proportion z-test");
        let mut table = new_table(&["Group", "Successes", "Trials", "Rate"]);
        for (i, group) in Group::ALL.iter().enumerate() {
            table.add_row(vec![
                group.to_string(),
                format_number(self.successes[i]),
                format_number(self.trials[i]),
                format!("{:.4}%", self.rates[i] * 100.0),
            ]);
        }
        println!("{table}");

        print_field("z", &format_number(self.result.statistic));
        print_field("p-value", &format_p_value(self.result.p_value));
        print_field("Alpha", &self.alpha.to_string());
        print_field("Decision", &decision_badge(self.decision).to_string());
        if let Some(group) = self.higher_rate {
            print_field("Higher rate", &group.to_string());
        }
    }
}

pub fn execute(ctx: &Context, args: ZTestArgs) -> Result<()> {
    let alpha = args.alpha.unwrap_or(ctx.settings.analysis.alpha);
    if !(alpha > 0.0 && alpha < 1.0) {
        bail!("alpha must be in (0, 1), got {}", alpha);
    }

    let report = run(&args.successes, &args.trials, alpha)?;
    ctx.output.write(&report)
}

fn run(successes: &[f64], trials: &[f64], alpha: f64) -> Result<ZTestReport> {
    let successes: [f64; 2] = successes
        .try_into()
        .context("--successes takes exactly two values")?;
    let trials: [f64; 2] = trials
        .try_into()
        .context("--trials takes exactly two values")?;

    let result = StatisticalAnalyzer::proportions_z_test(successes, trials)?;
    let rates = [successes[0] / trials[0], successes[1] / trials[1]];
    let higher_rate = if rates[0] > rates[1] {
        Some(Group::Control)
    } else if rates[1] > rates[0] {
        Some(Group::Test)
    } else {
        None
    };

    Ok(ZTestReport {
        successes,
        trials,
        rates,
        alpha,
        result,
        decision: result.decision(alpha),
        higher_rate,
    })
}
