use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Column '{column}' not found in {sample}")]
    MissingColumn { sample: String, column: String },

    #[error("Sheet not found: {0}")]
    MissingSheet(String),

    #[error("Column '{column}' has {count} missing value(s)")]
    MissingValues { column: String, count: usize },

    #[error("Invalid data at {location}: {value:?}")]
    InvalidData { location: String, value: String },

    #[error("{test} requires at least {required} observations, got {actual}")]
    InsufficientData {
        test: String,
        required: usize,
        actual: usize,
    },

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
