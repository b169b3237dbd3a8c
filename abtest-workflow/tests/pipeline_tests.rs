use abtest_core::{AnalysisConfig, Column, CoreError, Group, Sample};
use abtest_metrics::Decision;
use abtest_storage::{CsvSource, MemorySource};
use abtest_workflow::{AbTestPipeline, MeanComparisonSelector, MeanTestVariant};
use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::path::PathBuf;

fn fixture_source() -> CsvSource {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("testdata");
    CsvSource::new(dir.join("control_group.csv"), dir.join("test_group.csv"))
}

fn sample(group: Group, purchases: &[f64], impressions: &[f64]) -> Sample {
    let earnings: Vec<f64> = purchases.iter().map(|p| p * 3.5).collect();
    Sample::new(
        group,
        vec![
            Column::from_values("Impression", impressions),
            Column::from_values("Purchase", purchases),
            Column::from_values("Earning", &earnings),
        ],
    )
    .unwrap()
}

fn pipeline() -> AbTestPipeline {
    AbTestPipeline::new(AnalysisConfig::default()).unwrap()
}

// ===== Fixture Analysis =====

#[test]
fn test_fixture_selects_pooled_t_test() {
    let report = pipeline().run(&fixture_source()).unwrap();

    let control = report.normality_of(Group::Control).unwrap();
    let test = report.normality_of(Group::Test).unwrap();
    assert_relative_eq!(control.result.statistic, 0.98527, epsilon = 1e-4);
    assert_relative_eq!(test.result.statistic, 0.98442, epsilon = 1e-4);
    assert!(control.is_normal());
    assert!(test.is_normal());

    assert_relative_eq!(report.variance.result.statistic, 0.003307, epsilon = 1e-4);
    assert!(report.variance.is_homogeneous());

    let mean = &report.mean_comparison;
    assert_eq!(mean.variant, MeanTestVariant::PooledT);
    assert_relative_eq!(mean.result.statistic, 0.16147, epsilon = 1e-3);
    assert_relative_eq!(mean.result.p_value, 0.8721, epsilon = 1e-3);
    assert_eq!(mean.decision, Decision::FailToReject);
    assert_relative_eq!(mean.control_mean, 565.26, epsilon = 0.01);
    assert_relative_eq!(mean.test_mean, 560.04, epsilon = 0.01);
}

#[test]
fn test_fixture_proportion_test_favours_control() {
    let report = pipeline().run(&fixture_source()).unwrap();
    let proportion = &report.proportion;

    assert_relative_eq!(proportion.control.successes, 22610.22, epsilon = 0.01);
    assert_relative_eq!(proportion.test.trials, 4768770.14, epsilon = 0.01);
    assert_relative_eq!(proportion.control.rate, 0.0053825, epsilon = 1e-6);
    assert_relative_eq!(proportion.test.rate, 0.0046976, epsilon = 1e-6);
    assert_relative_eq!(proportion.result.statistic, 14.486, epsilon = 1e-2);
    assert_eq!(proportion.decision, Decision::Reject);
    assert_eq!(proportion.higher_rate, Some(Group::Control));
    assert!(proportion.control.meets_min_size);
    assert!(proportion.test.meets_min_size);
}

#[test]
fn test_fixture_descriptions_and_intervals() {
    let report = pipeline().run(&fixture_source()).unwrap();

    let control = report.description(Group::Control).unwrap();
    assert_eq!((control.rows, control.columns), (40, 4));
    assert_eq!(control.head.len(), 5);
    assert_eq!(control.head_columns, vec!["Impression", "Click", "Purchase", "Earning"]);
    assert_eq!(control.total_nulls(), 0);
    assert!(control.density.is_some());
    assert_eq!(control.summary("Purchase").unwrap().count, 40);

    let columns: Vec<&str> = report.comparisons.iter().map(|c| c.column.as_str()).collect();
    assert_eq!(columns, vec!["Purchase", "Earning"]);

    let interval = report.intervals[0];
    assert_eq!(interval.group, Group::Control);
    assert_relative_eq!(interval.lower, 518.78, epsilon = 0.01);
    assert_relative_eq!(interval.upper, 611.73, epsilon = 0.01);
}

#[test]
fn test_fixture_conclusion_follows_decisions() {
    let report = pipeline().run(&fixture_source()).unwrap();
    let conclusion = report.conclusion();

    assert!(conclusion.iter().any(|l| l.contains("no significant difference in mean Purchase")));
    assert!(conclusion.iter().any(|l| l.contains("Control Group converts better")));
    assert!(!conclusion.iter().any(|l| l.starts_with("Warning")));
}

#[test]
fn test_report_serializes_to_json() {
    let report = pipeline().run(&fixture_source()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["mean_comparison"]["variant"], "pooled_t");
    assert_eq!(json["proportion"]["higher_rate"], "control");
}

#[test]
fn test_describe_only_skips_tests() {
    let descriptions = pipeline().describe_only(&fixture_source()).unwrap();

    let groups: Vec<Group> = descriptions.iter().map(|d| d.group).collect();
    assert_eq!(groups, vec![Group::Control, Group::Test]);
}

#[test]
fn test_describe_only_requires_metric_column() {
    let config = AnalysisConfig {
        metric_column: "Revenue".to_string(),
        ..AnalysisConfig::default()
    };
    let pipeline = AbTestPipeline::new(config).unwrap();

    let err = pipeline.describe_only(&fixture_source()).unwrap_err();

    assert!(matches!(err, CoreError::MissingColumn { column, .. } if column == "Revenue"));
}

// ===== Edge Cases =====

#[test]
fn test_identical_constant_samples_do_not_abort() {
    let purchases = vec![10.0; 40];
    let impressions = vec![1000.0; 40];
    let source = MemorySource::new(
        sample(Group::Control, &purchases, &impressions),
        sample(Group::Test, &purchases, &impressions),
    )
    .unwrap();

    let report = pipeline().run(&source).unwrap();

    assert!(report.normality.iter().all(|n| n.result.p_value == 1.0));
    assert_eq!(report.variance.result.p_value, 1.0);
    assert_eq!(report.mean_comparison.variant, MeanTestVariant::PooledT);
    assert_eq!(report.mean_comparison.result.p_value, 1.0);
    assert_eq!(report.proportion.result.p_value, 1.0);
    assert_eq!(report.proportion.higher_rate, None);
    assert!(report.descriptions.iter().all(|d| d.density.is_none()));
}

#[test]
fn test_skewed_sample_falls_back_to_mann_whitney() {
    let skewed: Vec<f64> = (1..=40)
        .map(|i| -(1.0 - (i as f64 - 0.5) / 40.0).ln() * 100.0)
        .collect();
    let symmetric: Vec<f64> = (1..=40).map(|i| 50.0 + i as f64).collect();
    let impressions = vec![10_000.0; 40];
    let source = MemorySource::new(
        sample(Group::Control, &skewed, &impressions),
        sample(Group::Test, &symmetric, &impressions),
    )
    .unwrap();

    let report = pipeline().run(&source).unwrap();

    assert!(!report.normality_of(Group::Control).unwrap().is_normal());
    assert_eq!(report.mean_comparison.variant, MeanTestVariant::MannWhitneyU);
    assert!(!report.mean_comparison.rationale.control_normal);
}

#[test]
fn test_missing_metric_column_is_reported() {
    let control = Sample::new(
        Group::Control,
        vec![Column::from_values("Impression", &[1.0, 2.0])],
    )
    .unwrap();
    let test = control.clone();

    let err = pipeline().analyze(&control, &test, "memory").unwrap_err();

    assert!(matches!(err, CoreError::MissingColumn { column, .. } if column == "Purchase"));
}

#[test]
fn test_null_metric_values_abort_tests() {
    let control = Sample::new(
        Group::Control,
        vec![
            Column::new("Purchase", vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)]),
            Column::from_values("Impression", &[10.0; 5]),
            Column::from_values("Earning", &[1.0; 5]),
        ],
    )
    .unwrap();
    let test = sample(Group::Test, &[1.0, 2.0, 3.0, 4.0, 5.0], &[10.0; 5]);

    let err = pipeline().analyze(&control, &test, "memory").unwrap_err();

    assert!(matches!(err, CoreError::MissingValues { count: 1, .. }));
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_small_groups_min_size(#[case] enforce: bool) {
    let purchases: Vec<f64> = (1..=10).map(|i| i as f64).collect();
    let impressions = vec![100.0; 10];
    let control = sample(Group::Control, &purchases, &impressions);
    let test = sample(Group::Test, &purchases, &impressions);
    let config = AnalysisConfig {
        enforce_min_group_size: enforce,
        ..AnalysisConfig::default()
    };

    let result = AbTestPipeline::new(config)
        .unwrap()
        .analyze(&control, &test, "memory");

    if enforce {
        assert!(matches!(result, Err(CoreError::Precondition(_))));
    } else {
        let report = result.unwrap();
        assert!(!report.proportion.control.meets_min_size);
        assert!(report.conclusion().iter().any(|l| l.starts_with("Warning")));
    }
}

#[test]
fn test_invalid_config_rejected() {
    let config = AnalysisConfig {
        alpha: 1.5,
        ..AnalysisConfig::default()
    };
    assert!(matches!(AbTestPipeline::new(config), Err(CoreError::Validation(_))));
}

// ===== Selector Properties =====

proptest! {
    #[test]
    fn prop_selector_deterministic(
        control_p in 0.0f64..=1.0,
        test_p in 0.0f64..=1.0,
        variance_p in 0.0f64..=1.0,
        alpha in 0.001f64..0.5,
    ) {
        let first = MeanComparisonSelector::select(control_p, test_p, variance_p, alpha);
        let second = MeanComparisonSelector::select(control_p, test_p, variance_p, alpha);
        prop_assert_eq!(first, second);

        if control_p < alpha || test_p < alpha {
            prop_assert_eq!(first.variant, MeanTestVariant::MannWhitneyU);
        } else if variance_p < alpha {
            prop_assert_eq!(first.variant, MeanTestVariant::WelchT);
        } else {
            prop_assert_eq!(first.variant, MeanTestVariant::PooledT);
        }
    }
}
