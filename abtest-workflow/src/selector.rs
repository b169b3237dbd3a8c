use abtest_core::Result;
use abtest_metrics::{StatisticalAnalyzer, TestResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Test used to compare the central tendency of the two groups
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MeanTestVariant {
    /// Both groups normal, variances homogeneous
    PooledT,
    /// Both groups normal, variances differ
    WelchT,
    /// At least one group not normal
    MannWhitneyU,
}

impl MeanTestVariant {
    pub fn name(&self) -> &'static str {
        match self {
            MeanTestVariant::PooledT => "Independent two-sample t-test (equal variances)",
            MeanTestVariant::WelchT => "Welch t-test (unequal variances)",
            MeanTestVariant::MannWhitneyU => "Mann-Whitney U test",
        }
    }

    pub fn is_parametric(&self) -> bool {
        !matches!(self, MeanTestVariant::MannWhitneyU)
    }

    pub fn run(&self, control: &[f64], test: &[f64]) -> Result<TestResult> {
        match self {
            MeanTestVariant::PooledT => StatisticalAnalyzer::t_test(control, test),
            MeanTestVariant::WelchT => StatisticalAnalyzer::welch_t_test(control, test),
            MeanTestVariant::MannWhitneyU => StatisticalAnalyzer::mann_whitney_u(control, test),
        }
    }
}

impl fmt::Display for MeanTestVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which assumptions held when the variant was chosen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionRationale {
    pub control_normal: bool,
    pub test_normal: bool,
    pub equal_variance: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub variant: MeanTestVariant,
    pub rationale: SelectionRationale,
}

pub struct MeanComparisonSelector;

impl MeanComparisonSelector {
    /// Pick the mean comparison test from the assumption checks.
    ///
    /// A p-value at or above `alpha` means the assumption is not rejected.
    /// Homogeneity only matters when both groups pass the normality check.
    pub fn select(
        control_normality_p: f64,
        test_normality_p: f64,
        variance_p: f64,
        alpha: f64,
    ) -> Selection {
        let rationale = SelectionRationale {
            control_normal: control_normality_p >= alpha,
            test_normal: test_normality_p >= alpha,
            equal_variance: variance_p >= alpha,
        };

        let variant = match rationale {
            SelectionRationale {
                control_normal: true,
                test_normal: true,
                equal_variance: true,
            } => MeanTestVariant::PooledT,
            SelectionRationale {
                control_normal: true,
                test_normal: true,
                equal_variance: false,
            } => MeanTestVariant::WelchT,
            _ => MeanTestVariant::MannWhitneyU,
        };

        tracing::debug!(
            "Selected {} (control normal: {}, test normal: {}, equal variance: {})",
            variant,
            rationale.control_normal,
            rationale.test_normal,
            rationale.equal_variance
        );

        Selection { variant, rationale }
    }
}
