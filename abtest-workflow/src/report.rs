use abtest_core::{AnalysisConfig, AnalysisRunId, Group};
use abtest_metrics::{Decision, DensityCurve, DescriptiveSummary, TestResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::selector::{MeanTestVariant, SelectionRationale};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
    pub nulls: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    /// `None` when the column has no non-null values
    pub summary: Option<DescriptiveSummary>,
}

/// Everything the descriptive stage reports about one sample
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupDescription {
    pub group: Group,
    pub rows: usize,
    pub columns: usize,
    pub info: Vec<ColumnInfo>,
    pub summaries: Vec<ColumnSummary>,
    pub head_columns: Vec<String>,
    pub head: Vec<Vec<Option<f64>>>,
    pub density_column: String,
    /// `None` when the column has too little spread for a density estimate
    pub density: Option<DensityCurve>,
}

impl GroupDescription {
    pub fn summary(&self, column: &str) -> Option<&DescriptiveSummary> {
        self.summaries
            .iter()
            .find(|s| s.column == column)
            .and_then(|s| s.summary.as_ref())
    }

    pub fn total_nulls(&self) -> usize {
        self.info.iter().map(|c| c.nulls).sum()
    }
}

/// Same column summarised for both groups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnComparison {
    pub column: String,
    pub control: Option<DescriptiveSummary>,
    pub test: Option<DescriptiveSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MeanInterval {
    pub group: Group,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalityCheck {
    pub group: Group,
    pub result: TestResult,
    pub decision: Decision,
}

impl NormalityCheck {
    pub fn is_normal(&self) -> bool {
        self.decision == Decision::FailToReject
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VarianceCheck {
    pub result: TestResult,
    pub decision: Decision,
}

impl VarianceCheck {
    pub fn is_homogeneous(&self) -> bool {
        self.decision == Decision::FailToReject
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MeanComparison {
    pub variant: MeanTestVariant,
    pub rationale: SelectionRationale,
    pub result: TestResult,
    pub decision: Decision,
    pub control_mean: f64,
    pub test_mean: f64,
    pub control_median: f64,
    pub test_median: f64,
    pub effect_size: f64,
}

impl MeanComparison {
    /// Group ahead on the location the chosen test compares: means for the
    /// t-tests, medians for Mann-Whitney U
    pub fn higher_group(&self) -> Group {
        let (control, test) = if self.variant.is_parametric() {
            (self.control_mean, self.test_mean)
        } else {
            (self.control_median, self.test_median)
        };
        if control >= test {
            Group::Control
        } else {
            Group::Test
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GroupConversion {
    pub group: Group,
    pub successes: f64,
    pub trials: f64,
    pub rate: f64,
    pub observations: usize,
    /// Whether the group has more observations than the configured minimum
    pub meets_min_size: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProportionComparison {
    pub control: GroupConversion,
    pub test: GroupConversion,
    pub result: TestResult,
    pub decision: Decision,
    /// Group with the strictly higher conversion rate
    pub higher_rate: Option<Group>,
}

/// Structured result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: AnalysisRunId,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub config: AnalysisConfig,
    pub descriptions: Vec<GroupDescription>,
    pub comparisons: Vec<ColumnComparison>,
    pub intervals: Vec<MeanInterval>,
    pub normality: Vec<NormalityCheck>,
    pub variance: VarianceCheck,
    pub mean_comparison: MeanComparison,
    pub proportion: ProportionComparison,
}

impl AnalysisReport {
    pub fn description(&self, group: Group) -> Option<&GroupDescription> {
        self.descriptions.iter().find(|d| d.group == group)
    }

    pub fn normality_of(&self, group: Group) -> Option<&NormalityCheck> {
        self.normality.iter().find(|n| n.group == group)
    }

    /// Plain-language reading of every decision in the report
    pub fn conclusion(&self) -> Vec<String> {
        let metric = &self.config.metric_column;
        let trials = &self.config.trials_column;
        let mut lines = Vec::new();

        for check in &self.normality {
            lines.push(if check.is_normal() {
                format!(
                    "{} {} is consistent with a normal distribution (p = {:.4}).",
                    check.group, metric, check.result.p_value
                )
            } else {
                format!(
                    "{} {} departs from a normal distribution (p = {:.4}).",
                    check.group, metric, check.result.p_value
                )
            });
        }

        lines.push(if self.variance.is_homogeneous() {
            format!(
                "No significant difference between the {} variances of the groups (p = {:.4}).",
                metric, self.variance.result.p_value
            )
        } else {
            format!(
                "The {} variances of the groups differ significantly (p = {:.4}).",
                metric, self.variance.result.p_value
            )
        });

        let mean = &self.mean_comparison;
        let measure = if mean.variant.is_parametric() {
            "mean"
        } else {
            "distribution"
        };
        lines.push(match mean.decision {
            Decision::FailToReject => format!(
                "{}: no significant difference in {} {} between the groups (p = {:.4}).",
                mean.variant, measure, metric, mean.result.p_value
            ),
            Decision::Reject => {
                let higher = mean.higher_group();
                format!(
                    "{}: significant difference in {} {} between the groups (p = {:.4}); {} is higher.",
                    mean.variant, measure, metric, mean.result.p_value, higher
                )
            }
        });

        let proportion = &self.proportion;
        let rates = format!(
            "{} {:.4}% vs {} {:.4}%",
            proportion.control.group,
            proportion.control.rate * 100.0,
            proportion.test.group,
            proportion.test.rate * 100.0
        );
        lines.push(match (proportion.decision, proportion.higher_rate) {
            (Decision::Reject, Some(group)) => format!(
                "{}/{} conversion rates differ significantly (p = {:.4e}): {}. {} converts better.",
                metric, trials, proportion.result.p_value, rates, group
            ),
            _ => format!(
                "No significant difference in {}/{} conversion rate (p = {:.4}): {}.",
                metric, trials, proportion.result.p_value, rates
            ),
        });

        for conversion in [&proportion.control, &proportion.test] {
            if !conversion.meets_min_size {
                lines.push(format!(
                    "Warning: {} has {} observations; the proportion test assumes more than {}.",
                    conversion.group, conversion.observations, self.config.min_group_size
                ));
            }
        }

        lines
    }
}
