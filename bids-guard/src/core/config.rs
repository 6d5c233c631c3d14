//! Per-dataset expectations.
//!
//! A [`DatasetValidationConfig`] is plain data: the expected counts, columns
//! and digests for one dataset. It expands into the ordered list of
//! [`ValidationCheck`]s that [`validate_dataset`](super::validate_dataset)
//! runs. Configs are usually loaded from JSON:
//!
//! ```json
//! {
//!   "name": "arc",
//!   "expected_counts": {"sub-*": 230},
//!   "required_files": ["dataset_description.json", "participants.tsv"],
//!   "expected_columns": ["subject_id", "session_id", "t1w", "bold"],
//!   "expected_rows": 902,
//!   "unique_values": {"subject_id": 230},
//!   "non_null_counts": {"t1w": 441},
//!   "list_sessions": {"bold": 850}
//! }
//! ```

use super::{TargetKind, ValidationCheck};
use crate::checks::ChecksumAlgorithm;
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

fn default_session_column() -> String {
    "session_id".to_string()
}

/// Expected structure of one dataset.
///
/// Every map is a `BTreeMap`, so the derived check order is stable across
/// runs and platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetValidationConfig {
    /// Dataset name, used as the report name.
    pub name: String,

    /// Glob pattern (relative to the dataset root) to expected entry count.
    #[serde(default)]
    pub expected_counts: BTreeMap<String, usize>,

    /// Relative paths that must exist.
    #[serde(default)]
    pub required_files: Vec<String>,

    /// Relative (or absolute) path to expected MD5 digest.
    #[serde(default)]
    pub checksums: BTreeMap<PathBuf, String>,

    /// Whether to fail on empty files anywhere under the root.
    #[serde(default = "default_true")]
    pub check_zero_byte_files: bool,

    /// CSV/TSV sidecar tables that must parse.
    #[serde(default)]
    pub readable_tables: Vec<PathBuf>,

    /// Exact column-name set of the hosted dataset.
    #[serde(default)]
    pub expected_columns: Vec<String>,

    /// Expected row count of the hosted dataset.
    #[serde(default)]
    pub expected_rows: Option<usize>,

    /// Column to expected distinct non-null value count.
    #[serde(default)]
    pub unique_values: BTreeMap<String, usize>,

    /// Column to expected non-null count.
    #[serde(default)]
    pub non_null_counts: BTreeMap<String, usize>,

    /// Column identifying the session of a row.
    #[serde(default = "default_session_column")]
    pub session_column: String,

    /// List column to expected number of sessions with a non-empty list.
    #[serde(default)]
    pub list_sessions: BTreeMap<String, usize>,

    /// List column to expected total item count.
    #[serde(default)]
    pub total_list_items: BTreeMap<String, usize>,

    /// Groups of list columns whose per-row lengths must agree.
    #[serde(default)]
    pub aligned_lists: Vec<Vec<String>>,

    /// Columns identifying a row in misalignment reports.
    #[serde(default)]
    pub row_id_columns: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl DatasetValidationConfig {
    /// Creates an empty config with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expected_counts: BTreeMap::new(),
            required_files: Vec::new(),
            checksums: BTreeMap::new(),
            check_zero_byte_files: true,
            readable_tables: Vec::new(),
            expected_columns: Vec::new(),
            expected_rows: None,
            unique_values: BTreeMap::new(),
            non_null_counts: BTreeMap::new(),
            session_column: default_session_column(),
            list_sessions: BTreeMap::new(),
            total_list_items: BTreeMap::new(),
            aligned_lists: Vec::new(),
            row_id_columns: Vec::new(),
        }
    }

    /// Starts a fluent builder.
    pub fn builder(name: impl Into<String>) -> DatasetValidationConfigBuilder {
        DatasetValidationConfigBuilder::new(name)
    }

    /// Parses a config from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config from a JSON file and validates it.
    #[instrument]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read dataset config {}", path.display())
        })?;
        let config = Self::from_json_str(&json)?;
        debug!(config.name = %config.name, "Loaded dataset config");
        Ok(config)
    }

    /// Checks the config for values no check could meaningfully run with.
    ///
    /// # Errors
    ///
    /// [`GuardError::Configuration`] if a name is empty, a checksum is not a
    /// 32-character hex MD5 digest, or an `aligned_lists` group is empty.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GuardError::Configuration(
                "dataset name must not be empty".to_string(),
            ));
        }
        for (path, digest) in &self.checksums {
            if !ChecksumAlgorithm::Md5.is_valid_digest(digest) {
                return Err(GuardError::Configuration(format!(
                    "checksum for {} is not a 32-character hex MD5 digest: '{digest}'",
                    path.display()
                )));
            }
        }
        if let Some(index) = self.aligned_lists.iter().position(Vec::is_empty) {
            return Err(GuardError::Configuration(format!(
                "aligned_lists group {index} is empty"
            )));
        }
        if self.session_column.trim().is_empty() && !self.list_sessions.is_empty() {
            return Err(GuardError::Configuration(
                "session_column must be set when list_sessions is configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks run against the downloaded directory, in order: required
    /// files, entry counts, zero-byte scan, checksums, readable tables.
    pub fn file_checks(&self) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();
        if !self.required_files.is_empty() {
            checks.push(ValidationCheck::RequiredFiles {
                paths: self.required_files.clone(),
            });
        }
        checks.extend(
            self.expected_counts
                .iter()
                .map(|(pattern, &expected)| ValidationCheck::FileCount {
                    pattern: pattern.clone(),
                    expected,
                }),
        );
        if self.check_zero_byte_files {
            checks.push(ValidationCheck::ZeroByteFiles { pattern: None });
        }
        checks.extend(
            self.checksums
                .iter()
                .map(|(path, digest)| ValidationCheck::Checksum {
                    path: path.clone(),
                    expected: digest.clone(),
                    algorithm: ChecksumAlgorithm::Md5,
                }),
        );
        checks.extend(
            self.readable_tables
                .iter()
                .map(|path| ValidationCheck::TableReadable { path: path.clone() }),
        );
        checks
    }

    /// Checks run against the hosted dataset, in order: schema, row count,
    /// unique values, non-null counts, list sessions, list totals, list
    /// alignment.
    pub fn dataset_checks(&self) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();
        if !self.expected_columns.is_empty() {
            checks.push(ValidationCheck::Schema {
                columns: self.expected_columns.clone(),
            });
        }
        if let Some(expected) = self.expected_rows {
            checks.push(ValidationCheck::RowCount { expected });
        }
        checks.extend(
            self.unique_values
                .iter()
                .map(|(column, &expected)| ValidationCheck::UniqueValues {
                    column: column.clone(),
                    expected,
                }),
        );
        checks.extend(
            self.non_null_counts
                .iter()
                .map(|(column, &expected)| ValidationCheck::NonNullCount {
                    column: column.clone(),
                    expected,
                }),
        );
        checks.extend(
            self.list_sessions
                .iter()
                .map(|(column, &expected)| ValidationCheck::ListSessions {
                    list_column: column.clone(),
                    session_column: self.session_column.clone(),
                    expected,
                }),
        );
        checks.extend(
            self.total_list_items
                .iter()
                .map(|(column, &expected)| ValidationCheck::TotalListItems {
                    list_column: column.clone(),
                    expected,
                }),
        );
        checks.extend(
            self.aligned_lists
                .iter()
                .map(|group| ValidationCheck::ListAlignment {
                    list_columns: group.clone(),
                    row_id_columns: self.row_id_columns.clone(),
                }),
        );
        checks
    }

    /// Returns the checks for a target of the given kind.
    pub fn checks_for(&self, kind: TargetKind) -> Vec<ValidationCheck> {
        match kind {
            TargetKind::Directory => self.file_checks(),
            TargetKind::Dataset => self.dataset_checks(),
        }
    }
}

/// Builder for [`DatasetValidationConfig`].
///
/// ```rust
/// use bids_guard::core::DatasetValidationConfig;
///
/// let config = DatasetValidationConfig::builder("isles24")
///     .expected_count("sub-*", 149)
///     .required_file("dataset_description.json")
///     .expected_columns(["subject_id", "ncct", "dwi"])
///     .expected_rows(149)
///     .non_null_count("ncct", 149)
///     .build()
///     .unwrap();
/// assert_eq!(config.file_checks().len(), 3);
/// ```
#[derive(Debug)]
pub struct DatasetValidationConfigBuilder {
    config: DatasetValidationConfig,
}

impl DatasetValidationConfigBuilder {
    /// Creates a builder for a dataset with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: DatasetValidationConfig::new(name),
        }
    }

    /// Expects `count` entries matching `pattern`.
    pub fn expected_count(mut self, pattern: impl Into<String>, count: usize) -> Self {
        self.config.expected_counts.insert(pattern.into(), count);
        self
    }

    /// Requires a file to exist.
    pub fn required_file(mut self, path: impl Into<String>) -> Self {
        self.config.required_files.push(path.into());
        self
    }

    /// Expects a file to have the given MD5 digest.
    pub fn checksum(mut self, path: impl Into<PathBuf>, md5: impl Into<String>) -> Self {
        self.config.checksums.insert(path.into(), md5.into());
        self
    }

    /// Turns the zero-byte scan on or off.
    pub fn check_zero_byte_files(mut self, enabled: bool) -> Self {
        self.config.check_zero_byte_files = enabled;
        self
    }

    /// Requires a CSV/TSV table to parse.
    pub fn readable_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.readable_tables.push(path.into());
        self
    }

    /// Sets the exact expected column set.
    pub fn expected_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.expected_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the expected row count.
    pub fn expected_rows(mut self, rows: usize) -> Self {
        self.config.expected_rows = Some(rows);
        self
    }

    /// Expects `count` distinct non-null values in `column`.
    pub fn unique_values(mut self, column: impl Into<String>, count: usize) -> Self {
        self.config.unique_values.insert(column.into(), count);
        self
    }

    /// Expects `count` non-null cells in `column`.
    pub fn non_null_count(mut self, column: impl Into<String>, count: usize) -> Self {
        self.config.non_null_counts.insert(column.into(), count);
        self
    }

    /// Sets the session-identifying column (default `session_id`).
    pub fn session_column(mut self, column: impl Into<String>) -> Self {
        self.config.session_column = column.into();
        self
    }

    /// Expects `count` sessions with a non-empty `list_column`.
    pub fn list_sessions(mut self, list_column: impl Into<String>, count: usize) -> Self {
        self.config.list_sessions.insert(list_column.into(), count);
        self
    }

    /// Expects `count` items across all rows of `list_column`.
    pub fn total_list_items(mut self, list_column: impl Into<String>, count: usize) -> Self {
        self.config.total_list_items.insert(list_column.into(), count);
        self
    }

    /// Requires the given list columns to have equal lengths per row.
    pub fn aligned_lists<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .aligned_lists
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the columns that identify rows in misalignment reports.
    pub fn row_id_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.row_id_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Validates and returns the config.
    pub fn build(self) -> Result<DatasetValidationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
