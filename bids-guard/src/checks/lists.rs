//! Checks over list-valued columns.
//!
//! All three checks work on per-row list lengths, which come straight from
//! list offsets. A column of lists of images is validated without touching
//! a single image.

use super::{bracketed, check_name};
use crate::core::ValidationResult;
use crate::dataset::ColumnarDataset;
use crate::prelude::*;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use tracing::{debug, instrument};

/// Checks how many distinct sessions have at least one item in a list column.
///
/// Rows whose list is empty (or null) are ignored, and so are rows whose
/// session value is null. Passes iff the number of distinct remaining session
/// values equals `expected`.
#[instrument(skip(dataset))]
pub fn check_list_sessions<D>(
    dataset: &D,
    list_column: &str,
    session_column: &str,
    expected: usize,
) -> Result<ValidationResult>
where
    D: ColumnarDataset + ?Sized,
{
    let name = check_name("list_sessions", list_column);
    let lengths = dataset.list_lengths(list_column)?;
    let sessions = dataset.scalar_values(session_column)?;

    let represented: BTreeSet<String> = lengths
        .iter()
        .zip(sessions)
        .filter(|(length, _)| **length > 0)
        .filter_map(|(_, session)| session)
        .collect();

    debug!(result.sessions = represented.len(), "Counted sessions with non-empty lists");
    if represented.len() == expected {
        Ok(ValidationResult::pass(name))
    } else {
        let found: Vec<&String> = represented.iter().collect();
        Ok(ValidationResult::fail(
            name,
            format!(
                "column '{list_column}': expected {expected} sessions with non-empty lists, found {} {}",
                represented.len(),
                bracketed(&found)
            ),
        ))
    }
}

/// Checks that a list column holds `expected` items across all rows.
#[instrument(skip(dataset))]
pub fn check_total_list_items<D>(
    dataset: &D,
    list_column: &str,
    expected: usize,
) -> Result<ValidationResult>
where
    D: ColumnarDataset + ?Sized,
{
    let name = check_name("total_list_items", list_column);
    let total: usize = dataset.list_lengths(list_column)?.into_iter().sum();

    debug!(result.total_items = total, "Summed list lengths");
    if total == expected {
        Ok(ValidationResult::pass(name))
    } else {
        Ok(ValidationResult::fail(
            name,
            format!("column '{list_column}': expected {expected} list items in total, found {total}"),
        ))
    }
}

/// Checks that the named list columns have equal lengths on every row.
///
/// Every misaligned row is reported on its own line, identified by the
/// `col=value` pairs of `row_id_columns` and its row index, followed by the
/// length of each list:
///
/// ```text
/// 1 of 3 rows have misaligned list lengths across [runs, runs_meta]
///   subject_id=sub-3, session_id=ses-2 (row 2): runs=2, runs_meta=1
/// ```
///
/// # Errors
///
/// - [`GuardError::Configuration`] if `list_columns` is empty, or if rows
///   misalign and `row_id_columns` is empty.
/// - [`GuardError::ColumnNotFound`] / [`GuardError::TypeMismatch`] for
///   unknown columns, non-list `list_columns` or non-scalar `row_id_columns`.
#[instrument(skip(dataset))]
pub fn check_list_alignment<D, L, R>(
    dataset: &D,
    list_columns: &[L],
    row_id_columns: &[R],
) -> Result<ValidationResult>
where
    D: ColumnarDataset + ?Sized,
    L: AsRef<str> + std::fmt::Debug,
    R: AsRef<str> + std::fmt::Debug,
{
    if list_columns.is_empty() {
        return Err(GuardError::Configuration(
            "list alignment needs at least one list column".to_string(),
        ));
    }
    let list_names: Vec<&str> = list_columns.iter().map(|c| c.as_ref()).collect();
    let name = check_name("list_alignment", &list_names.join(","));

    let lengths = list_names
        .iter()
        .map(|column| dataset.list_lengths(column))
        .collect::<Result<Vec<_>>>()?;
    // Resolve row ids up front so a bad id column fails even on clean data.
    let row_ids = row_id_columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            dataset.scalar_values(column).map(|values| (column, values))
        })
        .collect::<Result<Vec<_>>>()?;

    let misaligned: Vec<usize> = (0..dataset.num_rows())
        .filter(|&row| {
            let first = lengths[0][row];
            lengths.iter().any(|column| column[row] != first)
        })
        .collect();

    debug!(result.misaligned = misaligned.len(), "Compared list lengths");
    if misaligned.is_empty() {
        return Ok(ValidationResult::pass(name));
    }
    if row_ids.is_empty() {
        return Err(GuardError::Configuration(format!(
            "{} rows misaligned across {} but no row id columns were given to identify them",
            misaligned.len(),
            bracketed(&list_names)
        )));
    }

    let mut details = format!(
        "{} of {} rows have misaligned list lengths across {}",
        misaligned.len(),
        dataset.num_rows(),
        bracketed(&list_names)
    );
    for row in misaligned {
        let key = row_ids
            .iter()
            .map(|(column, values)| {
                format!("{column}={}", values[row].as_deref().unwrap_or("null"))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let counts = list_names
            .iter()
            .zip(&lengths)
            .map(|(column, column_lengths)| format!("{column}={}", column_lengths[row]))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(details, "\n  {key} (row {row}): {counts}");
    }

    Ok(ValidationResult::fail(name, details))
}
