use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{CoreError, Result};

/// Arm of the experiment a sample belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Control,
    Test,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Control, Group::Test];

    /// Label used for the group in reports; also the default sheet name.
    pub fn label(&self) -> &'static str {
        match self {
            Group::Control => "Control Group",
            Group::Test => "Test Group",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A named numeric column. `None` cells are nulls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a column without nulls
    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().copied().map(Some).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Non-null cells, in row order
    pub fn present_values(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// All cells as numbers. Fails if any cell is null.
    pub fn complete_values(&self) -> Result<Vec<f64>> {
        let nulls = self.null_count();
        if nulls > 0 {
            return Err(CoreError::MissingValues {
                column: self.name.clone(),
                count: nulls,
            });
        }
        Ok(self.present_values())
    }

    /// Sum of non-null cells
    pub fn sum(&self) -> f64 {
        self.values.iter().flatten().sum()
    }
}

/// The observations of one experiment group. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub group: Group,
    columns: Vec<Column>,
}

impl Sample {
    pub fn new(group: Group, columns: Vec<Column>) -> Result<Self> {
        let Some(first) = columns.first() else {
            return Err(CoreError::Validation(format!(
                "{} has no columns",
                group.label()
            )));
        };

        let rows = first.len();
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "{} has duplicate column '{}'",
                    group.label(),
                    column.name
                )));
            }
            if column.len() != rows {
                return Err(CoreError::Validation(format!(
                    "{}: column '{}' has {} rows, expected {}",
                    group.label(),
                    column.name,
                    column.len(),
                    rows
                )));
            }
        }

        Ok(Self { group, columns })
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        let rows = self.columns.first().map(Column::len).unwrap_or(0);
        (rows, self.columns.len())
    }

    pub fn row_count(&self) -> usize {
        self.shape().0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CoreError::MissingColumn {
                sample: self.group.label().to_string(),
                column: name.to_string(),
            })
    }

    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        for name in names {
            self.column(name)?;
        }
        Ok(())
    }

    /// First `n` rows, cells in column order
    pub fn head(&self, n: usize) -> Vec<Vec<Option<f64>>> {
        let rows = self.row_count().min(n);
        (0..rows)
            .map(|row| self.columns.iter().map(|c| c.values[row]).collect())
            .collect()
    }
}
