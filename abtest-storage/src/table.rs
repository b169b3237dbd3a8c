//! Conversion of raw header + cell rows into a typed [`Sample`].

use abtest_core::{Column, CoreError, Group, Result, Sample};

/// A cell as read from a file, before numeric conversion
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
    /// Booleans, error cells and anything else that cannot be a measurement
    Other(String),
}

impl RawCell {
    fn into_value(self) -> std::result::Result<Option<f64>, String> {
        match self {
            RawCell::Empty => Ok(None),
            RawCell::Number(v) => Ok(Some(v)),
            RawCell::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    trimmed.parse::<f64>().map(Some).map_err(|_| text)
                }
            }
            RawCell::Other(text) => Err(text),
        }
    }
}

/// Build a sample from a header row and data rows.
///
/// Columns with a blank header are dropped, rows made only of empty cells
/// are skipped, and short rows are padded with nulls. `origin` names the
/// sheet or file in error messages.
pub fn build_sample(
    group: Group,
    origin: &str,
    header: Vec<String>,
    rows: impl IntoIterator<Item = Vec<RawCell>>,
) -> Result<Sample> {
    let kept: Vec<(usize, String)> = header
        .into_iter()
        .enumerate()
        .map(|(i, name)| (i, name.trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    if kept.is_empty() {
        return Err(CoreError::Validation(format!("{} has no header row", origin)));
    }

    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); kept.len()];
    let mut row_number = 1;
    for row in rows {
        row_number += 1;
        if row.iter().all(|c| matches!(c, RawCell::Empty)) {
            continue;
        }

        let mut row = row;
        for (slot, (index, name)) in kept.iter().enumerate() {
            let cell = row
                .get_mut(*index)
                .map(|c| std::mem::replace(c, RawCell::Empty))
                .unwrap_or(RawCell::Empty);
            let value = cell.into_value().map_err(|value| CoreError::InvalidData {
                location: format!("{} row {} column '{}'", origin, row_number, name),
                value,
            })?;
            values[slot].push(value);
        }
    }

    let columns = kept
        .into_iter()
        .zip(values)
        .map(|((_, name), cells)| Column::new(name, cells))
        .collect();

    Sample::new(group, columns)
}
