//! Prelude for commonly used types and traits in bids-guard.

pub use crate::core::{
    run_checks, validate_dataset, DatasetValidationConfig, ValidationCheck, ValidationReport,
    ValidationResult, ValidationTarget,
};
pub use crate::dataset::{ArrowDataset, ColumnarDataset};
pub use crate::error::{ErrorContext, GuardError, Result};
pub use crate::logging::LogConfig;
