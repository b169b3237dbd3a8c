use abtest_core::{CoreError, Group, Result, Sample, SampleSource};
use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::table::{build_sample, RawCell};

/// Spreadsheet (xlsx, xls, ods) with one sheet per group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookSource {
    pub path: PathBuf,
    pub control_sheet: String,
    pub test_sheet: String,
}

impl WorkbookSource {
    /// Workbook using the default "Control Group" / "Test Group" sheet names
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            control_sheet: Group::Control.label().to_string(),
            test_sheet: Group::Test.label().to_string(),
        }
    }

    pub fn with_sheets(mut self, control: impl Into<String>, test: impl Into<String>) -> Self {
        self.control_sheet = control.into();
        self.test_sheet = test.into();
        self
    }

    pub fn sheet_for(&self, group: Group) -> &str {
        match group {
            Group::Control => &self.control_sheet,
            Group::Test => &self.test_sheet,
        }
    }
}

impl SampleSource for WorkbookSource {
    fn load(&self, group: Group) -> Result<Sample> {
        let sheet = self.sheet_for(group);
        tracing::debug!("Reading sheet '{}' from {}", sheet, self.path.display());

        if !self.path.exists() {
            return Err(CoreError::Io(format!(
                "workbook not found: {}",
                self.path.display()
            )));
        }

        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            CoreError::Io(format!("failed to open {}: {}", self.path.display(), e))
        })?;

        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(CoreError::MissingSheet(format!(
                "'{}' in {}",
                sheet,
                self.path.display()
            )));
        }

        let range = workbook.worksheet_range(sheet).map_err(|e| {
            CoreError::Io(format!("failed to read sheet '{}': {}", sheet, e))
        })?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default();
        let data = rows.map(|row| row.iter().map(raw_cell).collect::<Vec<_>>());

        let sample = build_sample(group, sheet, header, data)?;
        tracing::info!(
            "Loaded {} rows x {} columns from sheet '{}'",
            sample.shape().0,
            sample.shape().1,
            sheet
        );
        Ok(sample)
    }

    fn describe_source(&self) -> String {
        format!(
            "workbook {} (sheets '{}', '{}')",
            self.path.display(),
            self.control_sheet,
            self.test_sheet
        )
    }
}

fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::Float(v) => RawCell::Number(*v),
        Data::Int(v) => RawCell::Number(*v as f64),
        Data::String(s) => RawCell::Text(s.clone()),
        other => RawCell::Other(other.to_string()),
    }
}
