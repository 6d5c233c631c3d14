//! The columnar dataset handle consumed by the columnar checks.
//!
//! [`ColumnarDataset`] is deliberately metadata-shaped: row counts, column
//! names, list lengths, presence flags and display strings of scalar values.
//! The only way to reach payload bytes is [`ColumnarDataset::blob_bytes`], which
//! no check calls. Imaging volumes stored in blob columns can therefore be
//! arbitrarily large, or not even valid NIfTI, without affecting validation.

use crate::prelude::*;
use arrow::datatypes::DataType;
use std::fmt::{self, Debug};

mod arrow_dataset;
pub mod sources;

pub use arrow_dataset::ArrowDataset;

/// How a column's cells are shaped, as far as validation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Strings, numbers, booleans, dates and other directly comparable values
    Scalar,
    /// Large binary payloads, including `{bytes, path}` struct encodings
    Blob,
    /// Variable-length sequences of scalars or blobs
    List,
}

impl ColumnKind {
    /// Classifies an Arrow data type.
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::List(_)
            | DataType::LargeList(_)
            | DataType::FixedSizeList(_, _)
            | DataType::ListView(_)
            | DataType::LargeListView(_) => ColumnKind::List,
            DataType::Binary
            | DataType::LargeBinary
            | DataType::BinaryView
            | DataType::FixedSizeBinary(_)
            | DataType::Struct(_) => ColumnKind::Blob,
            _ => ColumnKind::Scalar,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Scalar => write!(f, "scalar"),
            ColumnKind::Blob => write!(f, "blob"),
            ColumnKind::List => write!(f, "list"),
        }
    }
}

/// A lazily inspectable tabular dataset.
///
/// Rows are addressed by position, `0..num_rows()`. Every per-row accessor
/// returns one entry per row in that order.
///
/// Implementations must answer `list_lengths`, `presence` and
/// `non_null_count` without reading or parsing payload bytes.
pub trait ColumnarDataset: Debug + Send + Sync {
    /// Total number of rows.
    fn num_rows(&self) -> usize;

    /// Declared column names in schema order.
    fn column_names(&self) -> Vec<String>;

    /// The kind of the named column.
    fn column_kind(&self, column: &str) -> Result<ColumnKind>;

    /// Display strings of a scalar column, `None` for null cells.
    ///
    /// Fails with [`GuardError::TypeMismatch`] for blob and list columns.
    fn scalar_values(&self, column: &str) -> Result<Vec<Option<String>>>;

    /// Per-row lengths of a list column. A null list has length zero.
    ///
    /// Fails with [`GuardError::TypeMismatch`] for non-list columns.
    fn list_lengths(&self, column: &str) -> Result<Vec<usize>>;

    /// Per-row presence flags (`true` when the cell is not null).
    fn presence(&self, column: &str) -> Result<Vec<bool>>;

    /// Number of non-null cells in a column.
    fn non_null_count(&self, column: &str) -> Result<usize> {
        Ok(self.presence(column)?.into_iter().filter(|present| *present).count())
    }

    /// Raw payload bytes of one blob cell, `None` for null.
    ///
    /// This is the explicit opt-in path for callers that want to decode
    /// content themselves.
    fn blob_bytes(&self, column: &str, row: usize) -> Result<Option<Vec<u8>>>;

    /// Returns true if the named column exists.
    fn has_column(&self, column: &str) -> bool {
        self.column_names().iter().any(|name| name == column)
    }
}
