//! Non-null count check.

use super::check_name;
use crate::core::ValidationResult;
use crate::dataset::ColumnarDataset;
use crate::prelude::*;
use tracing::{debug, instrument};

/// Checks that a column holds exactly `expected` non-null cells.
///
/// Works on any column kind. For blob and list columns the count comes from
/// presence metadata alone; payload bytes are never read, so invalid image
/// content does not change the outcome. An empty list is present, a null list
/// is not.
#[instrument(skip(dataset))]
pub fn check_non_null_count<D>(
    dataset: &D,
    column: &str,
    expected: usize,
) -> Result<ValidationResult>
where
    D: ColumnarDataset + ?Sized,
{
    let name = check_name("non_null_count", column);
    let actual = dataset.non_null_count(column)?;
    let rows = dataset.num_rows();

    debug!(result.non_null = actual, result.rows = rows, "Counted non-null cells");
    if actual == expected {
        Ok(ValidationResult::pass(name))
    } else {
        Ok(ValidationResult::fail(
            name,
            format!(
                "column '{column}': expected {expected} non-null values, found {actual} ({} null of {rows} rows)",
                rows.saturating_sub(actual)
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::imaging_dataset;

    #[test]
    fn test_blob_column_counts_presence() {
        let dataset = imaging_dataset(false);
        assert!(check_non_null_count(&dataset, "img", 2).unwrap().passed());
    }

    #[test]
    fn test_mismatch_details() {
        let dataset = imaging_dataset(false);
        let result = check_non_null_count(&dataset, "img", 3).unwrap();
        assert!(!result.passed());
        assert_eq!(
            result.details(),
            "column 'img': expected 3 non-null values, found 2 (1 null of 3 rows)"
        );
    }

    #[test]
    fn test_empty_lists_are_present() {
        let dataset = imaging_dataset(false);
        assert!(check_non_null_count(&dataset, "runs", 3).unwrap().passed());
        assert!(check_non_null_count(&dataset, "subject_id", 3).unwrap().passed());
    }

    #[test]
    fn test_unknown_column() {
        let dataset = imaging_dataset(false);
        assert!(check_non_null_count(&dataset, "t1w", 1)
            .unwrap_err()
            .is_contract_violation());
    }
}
