use abtest_core::{CoreError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};
use statrs::statistics::Statistics;
use std::fmt;

use crate::aggregators::MetricAggregator;
use crate::shapiro;

/// Smallest sample the normality test accepts
pub const SHAPIRO_MIN_SAMPLE: usize = 4;

/// Above this size the Shapiro-Wilk p-value approximation is no longer validated
pub const SHAPIRO_MAX_SAMPLE: usize = 5000;

/// Outcome of a hypothesis test against a significance level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Reject,
    FailToReject,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Reject => write!(f, "reject H0"),
            Decision::FailToReject => write!(f, "fail to reject H0"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestResult {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
        }
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    pub fn decision(&self, alpha: f64) -> Decision {
        if self.is_significant(alpha) {
            Decision::Reject
        } else {
            Decision::FailToReject
        }
    }

    // Zero standard error: identical centres give no evidence, different ones give certainty.
    fn degenerate(difference: f64) -> Self {
        if difference == 0.0 {
            Self::new(0.0, 1.0)
        } else {
            Self::new(difference.signum() * f64::INFINITY, 0.0)
        }
    }
}

pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Shapiro-Wilk test of H0 "the values come from a normal distribution".
    ///
    /// Uses Royston's AS R94 approximation for the coefficients and the
    /// p-value. Constant input yields W = 1 and p = 1.
    pub fn shapiro_wilk(values: &[f64]) -> Result<TestResult> {
        let n = values.len();
        require_len("Shapiro-Wilk", values, SHAPIRO_MIN_SAMPLE)?;
        require_finite("Shapiro-Wilk", values)?;
        if n > SHAPIRO_MAX_SAMPLE {
            tracing::warn!(
                "Shapiro-Wilk p-value may be inaccurate for {} observations (validated up to {})",
                n,
                SHAPIRO_MAX_SAMPLE
            );
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let range = sorted[n - 1] - sorted[0];
        if range <= f64::EPSILON * sorted[0].abs().max(sorted[n - 1].abs()) {
            tracing::debug!("Shapiro-Wilk input is constant, returning W = 1");
            return Ok(TestResult::new(1.0, 1.0));
        }

        let coefficients = shapiro::coefficients(n)?;
        let w = shapiro::w_statistic(&sorted, &coefficients).min(1.0);
        let p_value = shapiro::p_value(w, n)?;

        Ok(TestResult::new(w, p_value))
    }

    /// Levene test of H0 "both groups have equal variance", centred on the
    /// group medians (Brown-Forsythe). Symmetric in its arguments.
    pub fn levene(sample1: &[f64], sample2: &[f64]) -> Result<TestResult> {
        require_len("Levene", sample1, 2)?;
        require_len("Levene", sample2, 2)?;
        require_finite("Levene", sample1)?;
        require_finite("Levene", sample2)?;

        let deviations: Vec<Vec<f64>> = [sample1, sample2]
            .iter()
            .map(|group| {
                let median = MetricAggregator::median(group);
                group.iter().map(|x| (x - median).abs()).collect()
            })
            .collect();

        let total = (sample1.len() + sample2.len()) as f64;
        let grand_mean = deviations.iter().flatten().sum::<f64>() / total;

        let mut between = 0.0;
        let mut within = 0.0;
        for group in &deviations {
            let mean = group.iter().sum::<f64>() / group.len() as f64;
            between += group.len() as f64 * (mean - grand_mean).powi(2);
            within += group.iter().map(|z| (z - mean).powi(2)).sum::<f64>();
        }

        let df_between = 1.0;
        let df_within = total - 2.0;

        if within == 0.0 {
            return Ok(if between == 0.0 {
                TestResult::new(0.0, 1.0)
            } else {
                TestResult::new(f64::INFINITY, 0.0)
            });
        }

        let f_stat = (between / df_between) / (within / df_within);
        let f_dist = FisherSnedecor::new(df_between, df_within).map_err(distribution_error)?;

        Ok(TestResult::new(f_stat, f_dist.sf(f_stat)))
    }

    /// Two-sided independent t-test assuming equal variances (pooled).
    pub fn t_test(sample1: &[f64], sample2: &[f64]) -> Result<TestResult> {
        require_len("Pooled t-test", sample1, 2)?;
        require_len("Pooled t-test", sample2, 2)?;

        let mean1 = sample1.mean();
        let mean2 = sample2.mean();
        let var1 = sample1.variance();
        let var2 = sample2.variance();
        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;

        let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
        let std_err = (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
        if std_err == 0.0 {
            return Ok(TestResult::degenerate(mean1 - mean2));
        }

        let t_stat = (mean1 - mean2) / std_err;
        two_sided_t(t_stat, n1 + n2 - 2.0)
    }

    /// Two-sided Welch t-test; does not assume equal variances.
    pub fn welch_t_test(sample1: &[f64], sample2: &[f64]) -> Result<TestResult> {
        require_len("Welch t-test", sample1, 2)?;
        require_len("Welch t-test", sample2, 2)?;

        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;
        let se1 = sample1.variance() / n1;
        let se2 = sample2.variance() / n2;
        let diff = sample1.mean() - sample2.mean();

        let std_err = (se1 + se2).sqrt();
        if std_err == 0.0 {
            return Ok(TestResult::degenerate(diff));
        }

        // Welch-Satterthwaite
        let df = (se1 + se2).powi(2) / (se1.powi(2) / (n1 - 1.0) + se2.powi(2) / (n2 - 1.0));
        two_sided_t(diff / std_err, df)
    }

    /// Mann-Whitney U test (non-parametric alternative to t-test).
    ///
    /// Two-sided normal approximation with tie and continuity correction.
    /// The statistic is U of the first sample.
    pub fn mann_whitney_u(sample1: &[f64], sample2: &[f64]) -> Result<TestResult> {
        require_len("Mann-Whitney U", sample1, 1)?;
        require_len("Mann-Whitney U", sample2, 1)?;
        require_finite("Mann-Whitney U", sample1)?;
        require_finite("Mann-Whitney U", sample2)?;

        let n1 = sample1.len();
        let n2 = sample2.len();

        let mut combined: Vec<(f64, bool)> = sample1
            .iter()
            .map(|&x| (x, true))
            .chain(sample2.iter().map(|&x| (x, false)))
            .collect();
        combined.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Assign ranks (handling ties)
        let mut rank_sum1 = 0.0;
        let mut tie_term = 0.0;
        let mut i = 0;
        while i < combined.len() {
            let mut j = i;
            while j < combined.len() && combined[j].0 == combined[i].0 {
                j += 1;
            }
            let rank = (i + j + 1) as f64 / 2.0;
            let ties = (j - i) as f64;
            tie_term += ties.powi(3) - ties;
            rank_sum1 += rank * combined[i..j].iter().filter(|(_, first)| *first).count() as f64;
            i = j;
        }

        let n1f = n1 as f64;
        let n2f = n2 as f64;
        let total = n1f + n2f;
        let u1 = rank_sum1 - n1f * (n1f + 1.0) / 2.0;
        let u2 = n1f * n2f - u1;

        let mean_u = n1f * n2f / 2.0;
        let var_u = n1f * n2f / 12.0 * ((total + 1.0) - tie_term / (total * (total - 1.0)));
        if var_u <= 0.0 {
            return Ok(TestResult::new(u1, 1.0));
        }

        let z = (u1.max(u2) - mean_u - 0.5) / var_u.sqrt();
        let p_value = 2.0 * standard_normal()?.sf(z);

        Ok(TestResult::new(u1, p_value))
    }

    /// Pooled two-proportion z-test, two-sided.
    ///
    /// Counts are `f64` so that aggregated sums can be used as they are.
    /// Swapping the groups only flips the sign of the statistic.
    pub fn proportions_z_test(successes: [f64; 2], trials: [f64; 2]) -> Result<TestResult> {
        for (s, t) in successes.iter().zip(trials.iter()) {
            if !s.is_finite() || !t.is_finite() || *t <= 0.0 {
                return Err(CoreError::Precondition(format!(
                    "proportion test needs positive finite trial counts, got {} of {}",
                    s, t
                )));
            }
            if *s < 0.0 || s > t {
                return Err(CoreError::Precondition(format!(
                    "successes must lie in [0, trials], got {} of {}",
                    s, t
                )));
            }
        }

        let rate1 = successes[0] / trials[0];
        let rate2 = successes[1] / trials[1];
        let pooled = (successes[0] + successes[1]) / (trials[0] + trials[1]);
        let std_err = (pooled * (1.0 - pooled) * (1.0 / trials[0] + 1.0 / trials[1])).sqrt();
        if std_err == 0.0 {
            return Ok(TestResult::degenerate(rate1 - rate2));
        }

        let z = (rate1 - rate2) / std_err;
        let p_value = 2.0 * standard_normal()?.sf(z.abs());

        Ok(TestResult::new(z, p_value))
    }

    /// Student t confidence interval for the mean at the given level
    pub fn confidence_interval(values: &[f64], confidence: f64) -> Result<(f64, f64)> {
        require_len("Confidence interval", values, 2)?;
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(CoreError::Validation(format!(
                "confidence level must be in (0, 1), got {}",
                confidence
            )));
        }

        let mean = values.mean();
        let std_dev = values.std_dev();
        let n = values.len() as f64;

        let t_dist = StudentsT::new(0.0, 1.0, n - 1.0).map_err(distribution_error)?;
        let t_value = t_dist.inverse_cdf((1.0 + confidence) / 2.0);

        let margin = t_value * (std_dev / n.sqrt());
        Ok((mean - margin, mean + margin))
    }

    /// Calculate effect size (Cohen's d)
    pub fn cohens_d(sample1: &[f64], sample2: &[f64]) -> f64 {
        if sample1.len() < 2 || sample2.len() < 2 {
            return 0.0;
        }

        let mean1 = sample1.mean();
        let mean2 = sample2.mean();
        let var1 = sample1.variance();
        let var2 = sample2.variance();
        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;

        let pooled_std = (((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0)).sqrt();

        if pooled_std == 0.0 {
            return 0.0;
        }

        (mean1 - mean2) / pooled_std
    }
}

fn two_sided_t(t_stat: f64, df: f64) -> Result<TestResult> {
    let t_dist = StudentsT::new(0.0, 1.0, df).map_err(distribution_error)?;
    Ok(TestResult::new(t_stat, 2.0 * t_dist.sf(t_stat.abs())))
}

pub(crate) fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(distribution_error)
}

pub(crate) fn distribution_error(err: impl fmt::Display) -> CoreError {
    CoreError::Precondition(format!("invalid distribution parameters: {}", err))
}

fn require_len(test: &str, values: &[f64], required: usize) -> Result<()> {
    if values.len() < required {
        return Err(CoreError::InsufficientData {
            test: test.to_string(),
            required,
            actual: values.len(),
        });
    }
    Ok(())
}

fn require_finite(test: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(CoreError::InvalidData {
            location: format!("{} input, position {}", test, index),
            value: values[index].to_string(),
        }),
        None => Ok(()),
    }
}
