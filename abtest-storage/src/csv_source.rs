use abtest_core::{CoreError, Group, Result, Sample, SampleSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::table::{build_sample, RawCell};

/// One CSV file per group, header in the first line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSource {
    pub control_path: PathBuf,
    pub test_path: PathBuf,
}

impl CsvSource {
    pub fn new(control_path: impl Into<PathBuf>, test_path: impl Into<PathBuf>) -> Self {
        Self {
            control_path: control_path.into(),
            test_path: test_path.into(),
        }
    }

    pub fn path_for(&self, group: Group) -> &Path {
        match group {
            Group::Control => &self.control_path,
            Group::Test => &self.test_path,
        }
    }
}

impl SampleSource for CsvSource {
    fn load(&self, group: Group) -> Result<Sample> {
        let path = self.path_for(group);
        tracing::debug!("Reading {} from {}", group, path.display());

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows: Vec<Vec<RawCell>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(path, e))?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            RawCell::Empty
                        } else {
                            RawCell::Text(field.to_string())
                        }
                    })
                    .collect(),
            );
        }

        let origin = path.display().to_string();
        let sample = build_sample(group, &origin, header, rows)?;
        tracing::info!(
            "Loaded {} rows x {} columns from {}",
            sample.shape().0,
            sample.shape().1,
            origin
        );
        Ok(sample)
    }

    fn describe_source(&self) -> String {
        format!(
            "csv files {} and {}",
            self.control_path.display(),
            self.test_path.display()
        )
    }
}

fn csv_error(path: &Path, err: csv::Error) -> CoreError {
    if err.is_io_error() {
        CoreError::Io(format!("{}: {}", path.display(), err))
    } else {
        CoreError::InvalidData {
            location: path.display().to_string(),
            value: err.to_string(),
        }
    }
}
