use abtest_core::{
    AnalysisConfig, AnalysisRunId, CoreError, Group, Result, Sample, SampleSource,
};
use abtest_metrics::{MetricAggregator, StatisticalAnalyzer};
use chrono::Utc;
use statrs::statistics::Statistics;

use crate::report::{
    AnalysisReport, ColumnComparison, ColumnInfo, ColumnSummary, GroupConversion,
    GroupDescription, MeanComparison, MeanInterval, NormalityCheck, ProportionComparison,
    VarianceCheck,
};
use crate::selector::MeanComparisonSelector;

/// Runs the A/B analysis end to end over one pair of samples
#[derive(Debug, Clone)]
pub struct AbTestPipeline {
    config: AnalysisConfig,
}

impl AbTestPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load both groups from `source` and run every stage
    pub fn run(&self, source: &dyn SampleSource) -> Result<AnalysisReport> {
        let description = source.describe_source();
        tracing::info!("Starting A/B analysis from {}", description);

        let (control, test) = self.load(source)?;
        self.analyze(&control, &test, description)
    }

    /// Load both groups and produce only their descriptive reports
    pub fn describe_only(&self, source: &dyn SampleSource) -> Result<Vec<GroupDescription>> {
        tracing::info!("Describing samples from {}", source.describe_source());

        let (control, test) = self.load(source)?;
        let metric = [self.config.metric_column.as_str()];
        control.require_columns(&metric)?;
        test.require_columns(&metric)?;

        Ok(vec![self.describe(&control), self.describe(&test)])
    }

    /// Run every stage on samples that are already loaded
    pub fn analyze(
        &self,
        control: &Sample,
        test: &Sample,
        source: impl Into<String>,
    ) -> Result<AnalysisReport> {
        let run_id = AnalysisRunId::new();
        tracing::info!(
            "Analysis {} on {} control and {} test observations",
            run_id,
            control.row_count(),
            test.row_count()
        );

        self.check_columns(control)?;
        self.check_columns(test)?;

        let descriptions = vec![self.describe(control), self.describe(test)];
        let comparisons = self.compare_columns(control, test);

        let metric = &self.config.metric_column;
        let control_values = control.column(metric)?.complete_values()?;
        let test_values = test.column(metric)?.complete_values()?;

        let intervals = vec![
            self.interval(Group::Control, &control_values)?,
            self.interval(Group::Test, &test_values)?,
        ];

        tracing::info!("Checking normality of {}", metric);
        let normality = vec![
            self.normality(Group::Control, &control_values)?,
            self.normality(Group::Test, &test_values)?,
        ];

        tracing::info!("Checking homogeneity of variance");
        let variance_result = StatisticalAnalyzer::levene(&control_values, &test_values)?;
        let variance = VarianceCheck {
            result: variance_result,
            decision: variance_result.decision(self.config.alpha),
        };

        let mean_comparison = self.compare_means(
            &normality,
            &variance,
            &control_values,
            &test_values,
        )?;

        let proportion = self.compare_proportions(control, test)?;

        tracing::info!("Analysis {} complete", run_id);

        Ok(AnalysisReport {
            run_id,
            generated_at: Utc::now(),
            source: source.into(),
            config: self.config.clone(),
            descriptions,
            comparisons,
            intervals,
            normality,
            variance,
            mean_comparison,
            proportion,
        })
    }

    /// Descriptive report of one sample
    pub fn describe(&self, sample: &Sample) -> GroupDescription {
        let (rows, columns) = sample.shape();
        tracing::debug!("Describing {} ({} rows, {} columns)", sample.group, rows, columns);

        let info = sample
            .columns()
            .iter()
            .map(|column| ColumnInfo {
                name: column.name.clone(),
                dtype: "float64".to_string(),
                non_null: column.non_null_count(),
                nulls: column.null_count(),
            })
            .collect();

        let summaries = sample
            .columns()
            .iter()
            .map(|column| ColumnSummary {
                column: column.name.clone(),
                summary: MetricAggregator::describe(
                    &column.present_values(),
                    &self.config.percentiles,
                ),
            })
            .collect();

        let metric = &self.config.metric_column;
        let density = sample.column(metric).ok().and_then(|column| {
            match MetricAggregator::density(&column.present_values(), self.config.density_points)
            {
                Ok(curve) => Some(curve),
                Err(e) => {
                    tracing::warn!("No density curve for {} {}: {}", sample.group, metric, e);
                    None
                }
            }
        });

        GroupDescription {
            group: sample.group,
            rows,
            columns,
            info,
            summaries,
            head_columns: sample
                .column_names()
                .into_iter()
                .map(String::from)
                .collect(),
            head: sample.head(self.config.head_rows),
            density_column: metric.clone(),
            density,
        }
    }

    fn load(&self, source: &dyn SampleSource) -> Result<(Sample, Sample)> {
        let control = source.load(Group::Control)?;
        let test = source.load(Group::Test)?;
        for sample in [&control, &test] {
            tracing::info!("Loaded {} with shape {:?}", sample.group, sample.shape());
        }
        Ok((control, test))
    }

    fn check_columns(&self, sample: &Sample) -> Result<()> {
        sample.require_columns(&self.config.required_columns())
    }

    fn compare_columns(&self, control: &Sample, test: &Sample) -> Vec<ColumnComparison> {
        let summarize = |sample: &Sample, name: &str| {
            sample.column(name).ok().and_then(|column| {
                MetricAggregator::describe(&column.present_values(), &self.config.percentiles)
            })
        };

        self.config
            .compare_columns
            .iter()
            .map(|name| ColumnComparison {
                column: name.clone(),
                control: summarize(control, name),
                test: summarize(test, name),
            })
            .collect()
    }

    fn interval(&self, group: Group, values: &[f64]) -> Result<MeanInterval> {
        let confidence = self.config.confidence_level;
        let (lower, upper) = StatisticalAnalyzer::confidence_interval(values, confidence)?;
        Ok(MeanInterval {
            group,
            mean: values.mean(),
            lower,
            upper,
            confidence,
        })
    }

    fn normality(&self, group: Group, values: &[f64]) -> Result<NormalityCheck> {
        let result = StatisticalAnalyzer::shapiro_wilk(values)?;
        tracing::info!(
            "{} Shapiro-Wilk W = {:.4}, p = {:.4}",
            group,
            result.statistic,
            result.p_value
        );
        Ok(NormalityCheck {
            group,
            result,
            decision: result.decision(self.config.alpha),
        })
    }

    fn compare_means(
        &self,
        normality: &[NormalityCheck],
        variance: &VarianceCheck,
        control: &[f64],
        test: &[f64],
    ) -> Result<MeanComparison> {
        let p_of = |group: Group| {
            normality
                .iter()
                .find(|check| check.group == group)
                .map(|check| check.result.p_value)
                .unwrap_or(0.0)
        };

        let selection = MeanComparisonSelector::select(
            p_of(Group::Control),
            p_of(Group::Test),
            variance.result.p_value,
            self.config.alpha,
        );
        tracing::info!("Comparing groups with {}", selection.variant);

        let result = selection.variant.run(control, test)?;

        Ok(MeanComparison {
            variant: selection.variant,
            rationale: selection.rationale,
            result,
            decision: result.decision(self.config.alpha),
            control_mean: control.mean(),
            test_mean: test.mean(),
            control_median: MetricAggregator::median(control),
            test_median: MetricAggregator::median(test),
            effect_size: StatisticalAnalyzer::cohens_d(control, test),
        })
    }

    fn compare_proportions(&self, control: &Sample, test: &Sample) -> Result<ProportionComparison> {
        let control = self.conversion(control)?;
        let test = self.conversion(test)?;
        tracing::info!(
            "Comparing {}/{} rates: {:.6} vs {:.6}",
            self.config.metric_column,
            self.config.trials_column,
            control.rate,
            test.rate
        );

        let result = StatisticalAnalyzer::proportions_z_test(
            [control.successes, test.successes],
            [control.trials, test.trials],
        )?;

        let higher_rate = if control.rate > test.rate {
            Some(Group::Control)
        } else if test.rate > control.rate {
            Some(Group::Test)
        } else {
            None
        };

        Ok(ProportionComparison {
            control,
            test,
            result,
            decision: result.decision(self.config.alpha),
            higher_rate,
        })
    }

    fn conversion(&self, sample: &Sample) -> Result<GroupConversion> {
        let successes = sample.column(&self.config.metric_column)?;
        let trials = sample.column(&self.config.trials_column)?.sum();
        let observations = successes.non_null_count();
        let successes = successes.sum();

        let meets_min_size = observations > self.config.min_group_size;
        if !meets_min_size {
            if self.config.enforce_min_group_size {
                return Err(CoreError::Precondition(format!(
                    "{} has {} observations, the proportion test requires more than {}",
                    sample.group, observations, self.config.min_group_size
                )));
            }
            tracing::warn!(
                "{} has only {} observations, the proportion test assumes more than {}",
                sample.group,
                observations,
                self.config.min_group_size
            );
        }

        Ok(GroupConversion {
            group: sample.group,
            successes,
            trials,
            rate: if trials > 0.0 { successes / trials } else { 0.0 },
            observations,
            meets_min_size,
        })
    }
}
