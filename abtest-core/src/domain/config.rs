use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Tunables of the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Significance threshold for every accept/reject decision
    pub alpha: f64,
    /// Quantiles reported by the descriptive summary, in [0, 1]
    pub percentiles: Vec<f64>,
    pub head_rows: usize,
    /// Column the normality, variance and mean tests run on
    pub metric_column: String,
    /// Column whose sum is the trial count of the proportion test
    pub trials_column: String,
    pub revenue_column: String,
    pub confidence_level: f64,
    pub density_points: usize,
    pub min_group_size: usize,
    /// Turn the group-size warning of the proportion test into an error
    pub enforce_min_group_size: bool,
    /// Columns summarised side by side across groups
    pub compare_columns: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            percentiles: vec![0.01, 0.10, 0.25, 0.50, 0.75, 0.90, 0.95, 0.99],
            head_rows: 5,
            metric_column: "Purchase".to_string(),
            trials_column: "Impression".to_string(),
            revenue_column: "Earning".to_string(),
            confidence_level: 0.95,
            density_points: 64,
            min_group_size: 30,
            enforce_min_group_size: false,
            compare_columns: vec!["Purchase".to_string(), "Earning".to_string()],
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(CoreError::Validation(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(CoreError::Validation(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if let Some(q) = self.percentiles.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(CoreError::Validation(format!(
                "percentile {} is outside [0, 1]",
                q
            )));
        }
        if self.density_points < 2 {
            return Err(CoreError::Validation(
                "density_points must be at least 2".to_string(),
            ));
        }
        if self.metric_column.is_empty() || self.trials_column.is_empty() {
            return Err(CoreError::Validation(
                "metric and trials columns must be named".to_string(),
            ));
        }
        Ok(())
    }

    /// Columns every sample must carry
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![
            self.metric_column.as_str(),
            self.trials_column.as_str(),
            self.revenue_column.as_str(),
        ];
        for c in &self.compare_columns {
            if !columns.contains(&c.as_str()) {
                columns.push(c);
            }
        }
        columns
    }
}
