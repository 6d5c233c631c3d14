//! The closed set of checks a validation run can execute.

use crate::checks::{self, ChecksumAlgorithm};
use crate::dataset::ColumnarDataset;
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::error;

use super::ValidationResult;

fn default_session_column() -> String {
    "session_id".to_string()
}

/// What a check runs against.
#[derive(Debug, Clone, Copy)]
pub enum ValidationTarget<'a> {
    /// A local directory holding a downloaded dataset bundle.
    Directory(&'a Path),
    /// A columnar dataset handle.
    Dataset(&'a dyn ColumnarDataset),
}

impl ValidationTarget<'_> {
    /// Returns the kind of this target.
    pub fn kind(&self) -> TargetKind {
        match self {
            ValidationTarget::Directory(_) => TargetKind::Directory,
            ValidationTarget::Dataset(_) => TargetKind::Dataset,
        }
    }
}

/// Discriminant of [`ValidationTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Directory,
    Dataset,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Directory => write!(f, "directory"),
            TargetKind::Dataset => write!(f, "dataset"),
        }
    }
}

/// A single named check together with its parameters and expectation.
///
/// Checks serialize with a `check` tag, so a list of them can live in a JSON
/// file:
///
/// ```json
/// [
///   {"check": "file_count", "pattern": "sub-*", "expected": 149},
///   {"check": "non_null_count", "column": "t1w", "expected": 149}
/// ]
/// ```
///
/// Paths in filesystem checks are relative to the target directory unless
/// absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum ValidationCheck {
    /// Number of entries matching a glob pattern.
    FileCount { pattern: String, expected: usize },
    /// No empty files, optionally only those matching a pattern.
    ZeroByteFiles {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    /// Files that must exist.
    RequiredFiles { paths: Vec<String> },
    /// Digest of a single file.
    Checksum {
        path: PathBuf,
        expected: String,
        #[serde(default)]
        algorithm: ChecksumAlgorithm,
    },
    /// A CSV/TSV table that must parse.
    TableReadable { path: PathBuf },
    /// Exact column-name set.
    Schema { columns: Vec<String> },
    /// Exact row count.
    RowCount { expected: usize },
    /// Distinct non-null values in a scalar column.
    UniqueValues { column: String, expected: usize },
    /// Non-null cells in any column.
    NonNullCount { column: String, expected: usize },
    /// Distinct sessions with a non-empty list.
    ListSessions {
        list_column: String,
        #[serde(default = "default_session_column")]
        session_column: String,
        expected: usize,
    },
    /// Sum of list lengths.
    TotalListItems { list_column: String, expected: usize },
    /// Equal list lengths per row.
    ListAlignment {
        list_columns: Vec<String>,
        #[serde(default)]
        row_id_columns: Vec<String>,
    },
}

impl ValidationCheck {
    /// Returns the stable identity carried by this check's result, such as
    /// `unique_values:subject_id` or `file_count:sub-*`.
    pub fn name(&self) -> String {
        match self {
            ValidationCheck::FileCount { pattern, .. } => checks::check_name("file_count", pattern),
            ValidationCheck::ZeroByteFiles { pattern } => {
                checks::check_name("zero_byte_files", pattern.as_deref().unwrap_or(""))
            }
            ValidationCheck::RequiredFiles { .. } => "required_files".to_string(),
            ValidationCheck::Checksum {
                path, algorithm, ..
            } => checks::check_name(algorithm.name(), &path.display().to_string()),
            ValidationCheck::TableReadable { path } => {
                checks::check_name("table_readable", &path.display().to_string())
            }
            ValidationCheck::Schema { .. } => "schema".to_string(),
            ValidationCheck::RowCount { .. } => "row_count".to_string(),
            ValidationCheck::UniqueValues { column, .. } => {
                checks::check_name("unique_values", column)
            }
            ValidationCheck::NonNullCount { column, .. } => {
                checks::check_name("non_null_count", column)
            }
            ValidationCheck::ListSessions { list_column, .. } => {
                checks::check_name("list_sessions", list_column)
            }
            ValidationCheck::TotalListItems { list_column, .. } => {
                checks::check_name("total_list_items", list_column)
            }
            ValidationCheck::ListAlignment { list_columns, .. } => {
                checks::check_name("list_alignment", &list_columns.join(","))
            }
        }
    }

    /// Returns the kind of target this check runs against.
    pub fn target_kind(&self) -> TargetKind {
        match self {
            ValidationCheck::FileCount { .. }
            | ValidationCheck::ZeroByteFiles { .. }
            | ValidationCheck::RequiredFiles { .. }
            | ValidationCheck::Checksum { .. }
            | ValidationCheck::TableReadable { .. } => TargetKind::Directory,
            ValidationCheck::Schema { .. }
            | ValidationCheck::RowCount { .. }
            | ValidationCheck::UniqueValues { .. }
            | ValidationCheck::NonNullCount { .. }
            | ValidationCheck::ListSessions { .. }
            | ValidationCheck::TotalListItems { .. }
            | ValidationCheck::ListAlignment { .. } => TargetKind::Dataset,
        }
    }

    /// Executes the check against `target`.
    ///
    /// Resource faults raised while checking (unreadable directories, Arrow
    /// or Parquet errors) come back as a failed result whose details start
    /// with `Error: `. Only contract violations are returned as `Err`.
    ///
    /// # Errors
    ///
    /// - [`GuardError::TargetMismatch`] if the target kind does not match
    ///   [`target_kind`](Self::target_kind).
    /// - [`GuardError::ColumnNotFound`], [`GuardError::TypeMismatch`] or
    ///   [`GuardError::Configuration`] for invalid parameters.
    pub fn execute(&self, target: ValidationTarget<'_>) -> Result<ValidationResult> {
        let outcome = match target {
            ValidationTarget::Directory(root) if self.target_kind() == TargetKind::Directory => {
                self.execute_on_directory(root)
            }
            ValidationTarget::Dataset(dataset) if self.target_kind() == TargetKind::Dataset => {
                self.execute_on_dataset(dataset)
            }
            _ => {
                return Err(GuardError::TargetMismatch {
                    check: self.name(),
                    expected: self.target_kind().to_string(),
                })
            }
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(e) if e.is_contract_violation() => Err(e),
            Err(e) => {
                let name = self.name();
                error!(check.name = %name, error = %e, "Check raised a fault");
                Ok(ValidationResult::fail(name, format!("Error: {e}")))
            }
        }
    }

    fn execute_on_directory(&self, root: &Path) -> Result<ValidationResult> {
        match self {
            ValidationCheck::FileCount { pattern, expected } => {
                checks::check_count(root, pattern, *expected)
            }
            ValidationCheck::ZeroByteFiles { pattern: None } => checks::check_zero_byte_files(root),
            ValidationCheck::ZeroByteFiles {
                pattern: Some(pattern),
            } => checks::check_zero_byte_files_matching(root, pattern),
            ValidationCheck::RequiredFiles { paths } => checks::check_required_files(root, paths),
            ValidationCheck::Checksum {
                path,
                expected,
                algorithm,
            } => {
                if !algorithm.is_valid_digest(expected) {
                    return Err(GuardError::Configuration(format!(
                        "'{expected}' is not a valid {} digest",
                        algorithm.name()
                    )));
                }
                Ok(checks::verify_checksum_named(
                    self.name(),
                    &root.join(path),
                    expected,
                    *algorithm,
                ))
            }
            ValidationCheck::TableReadable { path } => Ok(checks::check_table_readable_named(
                self.name(),
                &root.join(path),
            )),
            _ => Err(GuardError::Internal(format!(
                "{} is not a directory check",
                self.name()
            ))),
        }
    }

    fn execute_on_dataset(&self, dataset: &dyn ColumnarDataset) -> Result<ValidationResult> {
        match self {
            ValidationCheck::Schema { columns } => Ok(checks::check_schema(dataset, columns)),
            ValidationCheck::RowCount { expected } => {
                Ok(checks::check_row_count(dataset, *expected))
            }
            ValidationCheck::UniqueValues { column, expected } => {
                checks::check_unique_values(dataset, column, *expected)
            }
            ValidationCheck::NonNullCount { column, expected } => {
                checks::check_non_null_count(dataset, column, *expected)
            }
            ValidationCheck::ListSessions {
                list_column,
                session_column,
                expected,
            } => checks::check_list_sessions(dataset, list_column, session_column, *expected),
            ValidationCheck::TotalListItems {
                list_column,
                expected,
            } => checks::check_total_list_items(dataset, list_column, *expected),
            ValidationCheck::ListAlignment {
                list_columns,
                row_id_columns,
            } => checks::check_list_alignment(dataset, list_columns, row_id_columns),
            _ => Err(GuardError::Internal(format!(
                "{} is not a dataset check",
                self.name()
            ))),
        }
    }
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
