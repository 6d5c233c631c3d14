//! Schema check comparing declared column names.

use super::bracketed;
use crate::core::ValidationResult;
use crate::dataset::ColumnarDataset;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Checks that the dataset declares exactly the expected columns.
///
/// Both sides are compared as sets, so order and duplicates are ignored. On
/// failure the details always carry both an `Extra:` list (declared but not
/// expected) and a `Missing:` list (expected but not declared), each sorted,
/// even when one of them is empty.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "test-utils")]
/// # {
/// use bids_guard::checks::check_schema;
/// use bids_guard::test_fixtures::imaging_dataset;
///
/// let dataset = imaging_dataset(false);
/// let result = check_schema(&dataset, &["subject_id", "img"]);
/// assert!(!result.passed());
/// assert_eq!(result.details(), "Extra: [runs, runs_meta, session_id]; Missing: []");
/// # }
/// ```
#[instrument(skip(dataset, expected_columns))]
pub fn check_schema<D, S>(dataset: &D, expected_columns: &[S]) -> ValidationResult
where
    D: ColumnarDataset + ?Sized,
    S: AsRef<str>,
{
    let actual: BTreeSet<String> = dataset.column_names().into_iter().collect();
    let expected: BTreeSet<String> = expected_columns
        .iter()
        .map(|column| column.as_ref().to_string())
        .collect();

    if actual == expected {
        debug!(schema.columns = actual.len(), "Schema matches");
        return ValidationResult::pass("schema");
    }

    let extra: Vec<&String> = actual.difference(&expected).collect();
    let missing: Vec<&String> = expected.difference(&actual).collect();
    debug!(
        schema.extra = extra.len(),
        schema.missing = missing.len(),
        "Schema mismatch"
    );
    ValidationResult::fail(
        "schema",
        format!("Extra: {}; Missing: {}", bracketed(&extra), bracketed(&missing)),
    )
}
