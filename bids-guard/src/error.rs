//! Error types for the bids-guard validation library.
//!
//! Data-quality findings are never errors: they are failed
//! [`ValidationResult`](crate::core::ValidationResult)s. `GuardError` covers the
//! two remaining cases, resource faults (I/O, Arrow, DataFusion, Parquet) and
//! contract violations made by the caller (unknown columns, wrong column kinds,
//! malformed configuration).

use thiserror::Error;

/// The main error type for the bids-guard library.
#[derive(Error, Debug)]
pub enum GuardError {
    /// A named column does not exist in the dataset schema.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// A column was used as a kind it is not (e.g. a list column as a scalar).
    #[error("Type mismatch for column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// A check was executed against the wrong kind of target.
    #[error("Check '{check}' requires a {expected} target")]
    TargetMismatch { check: String, expected: String },

    /// Malformed configuration or invalid check parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "Parquet", "DataFusion")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Parquet operations.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, GuardError>`.
pub type Result<T> = std::result::Result<T, GuardError>;

impl GuardError {
    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates a type mismatch error for a column.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Returns true if this error is a usage error by the caller rather than
    /// a property of the data or the environment.
    ///
    /// Contract violations surface from the runner as hard failures; every
    /// other error is folded into a failed result at the check boundary.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            GuardError::ColumnNotFound { .. }
                | GuardError::TypeMismatch { .. }
                | GuardError::TargetMismatch { .. }
                | GuardError::Configuration(_)
        )
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<GuardError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                // Keep the variant so the runner still classifies it correctly.
                GuardError::Configuration(inner) => {
                    GuardError::Configuration(format!("{msg}: {inner}"))
                }
                GuardError::Io(io) => {
                    GuardError::Io(std::io::Error::new(io.kind(), format!("{msg}: {io}")))
                }
                GuardError::Internal(inner) => GuardError::Internal(format!("{msg}: {inner}")),
                other => GuardError::data_source_with_source(
                    "dataset",
                    format!("{msg}: {other}"),
                    Box::new(other),
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_column_not_found() {
        let err = GuardError::column_not_found("subject_id");
        assert_eq!(err.to_string(), "Column 'subject_id' not found in dataset");
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_type_mismatch() {
        let err = GuardError::type_mismatch("runs", "scalar", "List(Utf8)");
        assert_eq!(
            err.to_string(),
            "Type mismatch for column 'runs': expected scalar, found List(Utf8)"
        );
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_resource_faults_are_not_contract_violations() {
        let io = GuardError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert!(!io.is_contract_violation());
        assert!(!GuardError::data_source("Parquet", "corrupt footer").is_contract_violation());
        assert!(!GuardError::Internal("oops".to_string()).is_contract_violation());
    }

    #[test]
    fn test_data_source_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err =
            GuardError::data_source_with_source("Parquet", "Could not open", Box::new(source));
        assert_eq!(err.to_string(), "Data source error: Could not open");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_context_keeps_classification() {
        let failing: std::result::Result<(), GuardError> =
            Err(GuardError::Configuration("bad digest".to_string()));
        let err = failing.context("Loading config").unwrap_err();
        assert!(err.is_contract_violation());
        assert!(err.to_string().contains("Loading config: bad digest"));

        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = io.with_context(|| "Reading archive".to_string()).unwrap_err();
        assert!(matches!(err, GuardError::Io(_)));
        assert!(err.to_string().contains("Reading archive"));
    }
}
