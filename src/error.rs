//! Error taxonomy for projection calls

use thiserror::Error;

/// Errors surfaced by the projection engine and its boundary collaborators
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An input field failed validation
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A configuration table required by the calculation is absent
    #[error("Missing table: {table} has no entry for {key}")]
    MissingTable { table: String, key: String },

    /// A configuration table could not be parsed
    #[error("Table parse error in {file}: {reason}")]
    TableParse { file: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProjectionError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_table(table: impl Into<String>, key: impl Into<String>) -> Self {
        ProjectionError::MissingTable {
            table: table.into(),
            key: key.into(),
        }
    }

    /// True for errors caused by the caller's input rather than configuration or I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, ProjectionError::InvalidInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
