use abtest_core::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PercentileValue {
    /// Quantile in [0, 1]
    pub quantile: f64,
    pub value: f64,
}

/// count / mean / std / min / percentiles / max of a numeric column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DescriptiveSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two observations
    pub std: Option<f64>,
    pub min: f64,
    pub percentiles: Vec<PercentileValue>,
    pub max: f64,
    pub sum: f64,
}

impl DescriptiveSummary {
    pub fn percentile(&self, quantile: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|p| (p.quantile - quantile).abs() < 1e-12)
            .map(|p| p.value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DensityPoint {
    pub x: f64,
    pub density: f64,
}

/// Gaussian kernel density estimate sampled on an even grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub points: Vec<DensityPoint>,
}

impl DensityCurve {
    /// Grid point with the highest estimated density
    pub fn peak(&self) -> Option<DensityPoint> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.density.total_cmp(&b.density))
    }

    /// Trapezoidal integral over the grid; close to 1 for a well-covered range
    pub fn area(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].x - w[0].x) * (w[0].density + w[1].density) / 2.0)
            .sum()
    }
}

pub struct MetricAggregator;

impl MetricAggregator {
    /// Descriptive summary of `values`; `None` for an empty slice.
    ///
    /// The median is always reported, whether or not 0.5 is among the
    /// requested quantiles.
    pub fn describe(values: &[f64], quantiles: &[f64]) -> Option<DescriptiveSummary> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = values.len() as f64;
        let sum: f64 = values.iter().sum();
        let mean = sum / n;
        let std = (values.len() > 1).then(|| {
            let ss: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        let mut qs: Vec<f64> = quantiles.to_vec();
        if !qs.iter().any(|q| (q - 0.5).abs() < 1e-12) {
            qs.push(0.5);
        }
        qs.sort_by(f64::total_cmp);
        qs.dedup();

        let percentiles = qs
            .into_iter()
            .map(|quantile| PercentileValue {
                quantile,
                value: Self::percentile(&sorted, quantile),
            })
            .collect();

        Some(DescriptiveSummary {
            count: values.len(),
            mean,
            std,
            min: sorted[0],
            percentiles,
            max: sorted[sorted.len() - 1],
            sum,
        })
    }

    /// Linear interpolation between the closest ranks of ascending data
    pub fn percentile(sorted_values: &[f64], quantile: f64) -> f64 {
        if sorted_values.is_empty() {
            return f64::NAN;
        }
        let position = quantile.clamp(0.0, 1.0) * (sorted_values.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let fraction = position - lower as f64;
        sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * fraction
    }

    pub fn median(values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::percentile(&sorted, 0.5)
    }

    /// Gaussian KDE with Scott's bandwidth on `points` grid positions
    /// spanning three bandwidths beyond the data range.
    pub fn density(values: &[f64], points: usize) -> Result<DensityCurve> {
        if values.len() < 2 {
            return Err(CoreError::InsufficientData {
                test: "Density estimate".to_string(),
                required: 2,
                actual: values.len(),
            });
        }
        if points < 2 {
            return Err(CoreError::Validation(
                "density grid needs at least 2 points".to_string(),
            ));
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
        if std == 0.0 || !std.is_finite() {
            return Err(CoreError::Precondition(
                "density estimate needs data with non-zero spread".to_string(),
            ));
        }

        let bandwidth = std * n.powf(-0.2);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let start = min - 3.0 * bandwidth;
        let step = (max - min + 6.0 * bandwidth) / (points - 1) as f64;
        let norm = 1.0 / (n * bandwidth * (2.0 * PI).sqrt());

        let points = (0..points)
            .map(|i| {
                let x = start + i as f64 * step;
                let density = values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum::<f64>()
                    * norm;
                DensityPoint { x, density }
            })
            .collect();

        Ok(DensityCurve { bandwidth, points })
    }
}
