use abtest_core::CoreError;
use abtest_metrics::statistical::{Decision, StatisticalAnalyzer, TestResult};
use approx::assert_relative_eq;
use proptest::prelude::*;
use rstest::rstest;

// ===== Shapiro-Wilk Tests =====

#[test]
fn test_shapiro_wilk_evenly_spaced() {
    let values: Vec<f64> = (1..=10).map(|x| x as f64).collect();
    let result = StatisticalAnalyzer::shapiro_wilk(&values).unwrap();

    assert_relative_eq!(result.statistic, 0.970165, epsilon = 1e-5);
    assert_relative_eq!(result.p_value, 0.892367, epsilon = 1e-4);
    assert_eq!(result.decision(0.05), Decision::FailToReject);
}

#[test]
fn test_shapiro_wilk_tiny_scale_is_not_constant() {
    let values: Vec<f64> = (1..=10).map(|x| x as f64 * 1e-17).collect();
    let result = StatisticalAnalyzer::shapiro_wilk(&values).unwrap();

    assert_relative_eq!(result.statistic, 0.970165, epsilon = 1e-5);
    assert_relative_eq!(result.p_value, 0.892367, epsilon = 1e-4);
}

#[test]
fn test_shapiro_wilk_skewed_weights() {
    let values = [
        148.0, 154.0, 158.0, 160.0, 161.0, 162.0, 166.0, 170.0, 182.0, 195.0, 236.0,
    ];
    let result = StatisticalAnalyzer::shapiro_wilk(&values).unwrap();

    assert_relative_eq!(result.statistic, 0.788815, epsilon = 1e-5);
    assert_relative_eq!(result.p_value, 0.006704, epsilon = 1e-4);
    assert_eq!(result.decision(0.05), Decision::Reject);
}

#[test]
fn test_shapiro_wilk_exponential_quantiles_rejected() {
    let values: Vec<f64> = (1..=30)
        .map(|i| -(1.0 - (i as f64 - 0.5) / 30.0).ln())
        .collect();
    let result = StatisticalAnalyzer::shapiro_wilk(&values).unwrap();

    assert_relative_eq!(result.statistic, 0.846723, epsilon = 1e-5);
    assert!(result.p_value < 0.001);
}

#[test]
fn test_shapiro_wilk_normal_quantiles_accepted() {
    use statrs::distribution::{ContinuousCDF, Normal};

    let normal = Normal::new(0.0, 1.0).unwrap();
    let values: Vec<f64> = (1..=40)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / 40.25))
        .collect();
    let result = StatisticalAnalyzer::shapiro_wilk(&values).unwrap();

    assert!(result.statistic > 0.99);
    assert!(result.p_value > 0.99);
}

#[test]
fn test_shapiro_wilk_four_observations() {
    let result = StatisticalAnalyzer::shapiro_wilk(&[1.0, 2.0, 3.0, 100.0]).unwrap();

    assert_relative_eq!(result.statistic, 0.645661, epsilon = 1e-5);
    assert!(result.p_value < 0.01);
}

#[test]
fn test_shapiro_wilk_constant_sample() {
    let values = vec![550.0; 40];
    let result = StatisticalAnalyzer::shapiro_wilk(&values).unwrap();

    assert_eq!(result, TestResult::new(1.0, 1.0));
}

#[rstest]
#[case::empty(vec![])]
#[case::one(vec![1.0])]
#[case::three(vec![1.0, 2.0, 4.0])]
fn test_shapiro_wilk_small_sample_precondition(#[case] values: Vec<f64>) {
    let err = StatisticalAnalyzer::shapiro_wilk(&values).unwrap_err();

    assert!(matches!(
        err,
        CoreError::InsufficientData { required: 4, actual, .. } if actual == values.len()
    ));
}

#[test]
fn test_shapiro_wilk_rejects_non_finite() {
    let err = StatisticalAnalyzer::shapiro_wilk(&[1.0, 2.0, f64::NAN, 4.0, 5.0]).unwrap_err();
    assert!(matches!(err, CoreError::InvalidData { .. }));
}

// ===== Levene Tests =====

#[test]
fn test_levene_detects_variance_difference() {
    let tight = [4.9, 5.0, 5.0, 5.1, 5.0];
    let wide = [0.0, 3.0, 5.0, 7.0, 10.0];
    let result = StatisticalAnalyzer::levene(&tight, &wide).unwrap();

    assert_relative_eq!(result.statistic, 8.098660, epsilon = 1e-5);
    assert_relative_eq!(result.p_value, 0.021618, epsilon = 1e-5);
    assert!(result.is_significant(0.05));
}

#[test]
fn test_levene_unequal_lengths() {
    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0];
    let result = StatisticalAnalyzer::levene(&a, &b).unwrap();

    assert_relative_eq!(result.statistic, 3.920632, epsilon = 1e-5);
    assert_relative_eq!(result.p_value, 0.073262, epsilon = 1e-5);
}

#[test]
fn test_levene_identical_constant_samples() {
    let values = vec![550.0; 40];
    let result = StatisticalAnalyzer::levene(&values, &values).unwrap();

    assert_eq!(result.statistic, 0.0);
    assert_eq!(result.p_value, 1.0);
}

#[test]
fn test_levene_insufficient_data() {
    let err = StatisticalAnalyzer::levene(&[1.0], &[1.0, 2.0]).unwrap_err();
    assert!(matches!(err, CoreError::InsufficientData { required: 2, actual: 1, .. }));
}

// ===== T-Test Tests =====

#[test]
fn test_t_test_known_value() {
    let sample1 = [1.0, 2.0, 3.0, 4.0, 5.0];
    let sample2 = [6.0, 7.0, 8.0, 9.0, 10.0];
    let result = StatisticalAnalyzer::t_test(&sample1, &sample2).unwrap();

    assert_relative_eq!(result.statistic, -5.0, epsilon = 1e-12);
    assert_relative_eq!(result.p_value, 0.0010528, epsilon = 1e-6);
}

#[test]
fn test_t_test_varying_sample_sizes() {
    let sample1 = [10.0, 11.0, 12.0, 13.0, 14.0];
    let sample2 = [15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0];
    let result = StatisticalAnalyzer::t_test(&sample1, &sample2).unwrap();

    assert_relative_eq!(result.statistic, -5.244044, epsilon = 1e-5);
    assert_relative_eq!(result.p_value, 0.000275, epsilon = 1e-5);
}

#[test]
fn test_t_test_identical_constant_samples() {
    let values = vec![550.0; 40];
    let result = StatisticalAnalyzer::t_test(&values, &values).unwrap();

    assert_eq!(result.statistic, 0.0);
    assert_eq!(result.p_value, 1.0);
}

#[test]
fn test_t_test_identical_samples() {
    let sample = [10.0, 11.0, 12.0, 13.0, 14.0];
    let result = StatisticalAnalyzer::t_test(&sample, &sample).unwrap();

    assert!(result.statistic.abs() < 1e-12);
    assert!(result.p_value > 0.999);
}

#[test]
fn test_t_test_insufficient_data() {
    let err = StatisticalAnalyzer::t_test(&[10.0], &[12.0, 13.0]).unwrap_err();
    assert!(matches!(err, CoreError::InsufficientData { .. }));
}

#[test]
fn test_welch_t_test_known_value() {
    let sample1 = [10.0, 11.0, 12.0, 13.0, 14.0];
    let sample2 = [15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0];
    let result = StatisticalAnalyzer::welch_t_test(&sample1, &sample2).unwrap();

    assert_relative_eq!(result.statistic, -5.813777, epsilon = 1e-5);
    assert_relative_eq!(result.p_value, 0.000120, epsilon = 1e-5);
}

#[test]
fn test_welch_matches_pooled_for_equal_sizes_and_variances() {
    let sample1 = [1.0, 2.0, 3.0, 4.0, 5.0];
    let sample2 = [6.0, 7.0, 8.0, 9.0, 10.0];

    let pooled = StatisticalAnalyzer::t_test(&sample1, &sample2).unwrap();
    let welch = StatisticalAnalyzer::welch_t_test(&sample1, &sample2).unwrap();

    assert_relative_eq!(pooled.statistic, welch.statistic, epsilon = 1e-12);
    assert_relative_eq!(pooled.p_value, welch.p_value, epsilon = 1e-9);
}

#[test]
fn test_welch_constant_samples_with_different_means() {
    let result = StatisticalAnalyzer::welch_t_test(&[1.0, 1.0, 1.0], &[2.0, 2.0]).unwrap();

    assert_eq!(result.statistic, f64::NEG_INFINITY);
    assert_eq!(result.p_value, 0.0);
}

// ===== Mann-Whitney U Test =====

#[test]
fn test_mann_whitney_separated_samples() {
    let sample1 = [1.0, 2.0, 3.0, 4.0, 5.0];
    let sample2 = [6.0, 7.0, 8.0, 9.0, 10.0];
    let result = StatisticalAnalyzer::mann_whitney_u(&sample1, &sample2).unwrap();

    assert_eq!(result.statistic, 0.0);
    assert_relative_eq!(result.p_value, 0.012186, epsilon = 1e-5);
}

#[test]
fn test_mann_whitney_with_ties() {
    let sample1 = [1.0, 2.0, 2.0, 3.0, 4.0];
    let sample2 = [2.0, 3.0, 5.0, 6.0, 7.0, 8.0];
    let result = StatisticalAnalyzer::mann_whitney_u(&sample1, &sample2).unwrap();

    assert_eq!(result.statistic, 4.5);
    assert_relative_eq!(result.p_value, 0.064769, epsilon = 1e-5);
}

#[test]
fn test_mann_whitney_all_tied() {
    let result = StatisticalAnalyzer::mann_whitney_u(&[3.0; 5], &[3.0; 4]).unwrap();

    assert_eq!(result.statistic, 10.0);
    assert_eq!(result.p_value, 1.0);
}

#[test]
fn test_mann_whitney_empty_sample() {
    let err = StatisticalAnalyzer::mann_whitney_u(&[], &[1.0]).unwrap_err();
    assert!(matches!(err, CoreError::InsufficientData { .. }));
}

// ===== Proportion Tests =====

#[test]
fn test_proportions_z_test_significant_difference() {
    let result = StatisticalAnalyzer::proportions_z_test([100.0, 200.0], [1000.0, 1000.0]).unwrap();

    assert_relative_eq!(result.statistic, -6.262243, epsilon = 1e-5);
    assert!(result.p_value < 0.05);
    assert!(result.p_value < 1e-9);
}

#[test]
fn test_proportions_z_test_equal_rates() {
    let result = StatisticalAnalyzer::proportions_z_test([50.0, 100.0], [500.0, 1000.0]).unwrap();

    assert_relative_eq!(result.statistic, 0.0, epsilon = 1e-12);
    assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-12);
}

#[test]
fn test_proportions_z_test_aggregated_sums() {
    let result = StatisticalAnalyzer::proportions_z_test(
        [22610.22, 22401.75],
        [4200658.74, 4768770.14],
    )
    .unwrap();

    assert_relative_eq!(result.statistic, 14.485954, epsilon = 1e-4);
    assert_eq!(result.decision(0.05), Decision::Reject);
}

#[rstest]
#[case::zero_trials([1.0, 1.0], [0.0, 10.0])]
#[case::negative_successes([-1.0, 1.0], [10.0, 10.0])]
#[case::successes_exceed_trials([11.0, 1.0], [10.0, 10.0])]
#[case::nan([f64::NAN, 1.0], [10.0, 10.0])]
fn test_proportions_z_test_preconditions(#[case] successes: [f64; 2], #[case] trials: [f64; 2]) {
    let err = StatisticalAnalyzer::proportions_z_test(successes, trials).unwrap_err();
    assert!(matches!(err, CoreError::Precondition(_)));
}

// ===== Confidence Interval Tests =====

#[test]
fn test_confidence_interval_known_value() {
    let values = [10.0, 12.0, 13.0, 11.0, 14.0, 15.0, 13.0, 12.0, 11.0, 14.0];
    let (lower, upper) = StatisticalAnalyzer::confidence_interval(&values, 0.95).unwrap();

    assert_relative_eq!(lower, 11.368921, epsilon = 1e-5);
    assert_relative_eq!(upper, 13.631079, epsilon = 1e-5);
}

#[test]
fn test_confidence_interval_width_increases_with_confidence() {
    let values = [10.0, 12.0, 13.0, 11.0, 14.0, 15.0, 13.0, 12.0, 11.0, 14.0];

    let (lower_90, upper_90) = StatisticalAnalyzer::confidence_interval(&values, 0.90).unwrap();
    let (lower_99, upper_99) = StatisticalAnalyzer::confidence_interval(&values, 0.99).unwrap();

    assert!(upper_99 - lower_99 > upper_90 - lower_90);
}

#[test]
fn test_confidence_interval_small_sample() {
    let err = StatisticalAnalyzer::confidence_interval(&[10.0], 0.95).unwrap_err();
    assert!(matches!(err, CoreError::InsufficientData { .. }));
}

#[test]
fn test_confidence_interval_invalid_level() {
    let err = StatisticalAnalyzer::confidence_interval(&[1.0, 2.0], 1.0).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

// ===== Effect Size =====

#[test]
fn test_cohens_d() {
    let sample1 = [1.0, 2.0, 3.0, 4.0, 5.0];
    let sample2 = [6.0, 7.0, 8.0, 9.0, 10.0];

    // pooled std = sqrt(2.5)
    assert_relative_eq!(
        StatisticalAnalyzer::cohens_d(&sample1, &sample2),
        -5.0 / 2.5_f64.sqrt(),
        epsilon = 1e-12
    );
    assert_eq!(StatisticalAnalyzer::cohens_d(&[1.0], &sample2), 0.0);
}

// ===== Properties =====

proptest! {
    #[test]
    fn prop_shapiro_p_value_bounded_and_deterministic(
        values in prop::collection::vec(-1000.0f64..1000.0, 4..200)
    ) {
        let first = StatisticalAnalyzer::shapiro_wilk(&values).unwrap();
        let second = StatisticalAnalyzer::shapiro_wilk(&values).unwrap();

        prop_assert!((0.0..=1.0).contains(&first.p_value));
        prop_assert!(first.statistic > 0.0 && first.statistic <= 1.0);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_levene_symmetric(
        a in prop::collection::vec(0.0f64..1000.0, 2..60),
        b in prop::collection::vec(0.0f64..1000.0, 2..60),
    ) {
        let ab = StatisticalAnalyzer::levene(&a, &b).unwrap();
        let ba = StatisticalAnalyzer::levene(&b, &a).unwrap();

        prop_assert!((0.0..=1.0).contains(&ab.p_value));
        prop_assert!((ab.p_value - ba.p_value).abs() < 1e-9);
    }

    #[test]
    fn prop_proportion_test_order_invariant(
        s1 in 0.0f64..500.0,
        s2 in 0.0f64..500.0,
        extra1 in 1.0f64..10_000.0,
        extra2 in 1.0f64..10_000.0,
    ) {
        let trials = [s1 + extra1, s2 + extra2];
        let forward = StatisticalAnalyzer::proportions_z_test([s1, s2], trials).unwrap();
        let backward = StatisticalAnalyzer::proportions_z_test([s2, s1], [trials[1], trials[0]]).unwrap();

        prop_assert!((forward.statistic + backward.statistic).abs() < 1e-9);
        prop_assert!((forward.p_value - backward.p_value).abs() < 1e-12);
    }
}
