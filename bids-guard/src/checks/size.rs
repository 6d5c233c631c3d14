//! Row count check.

use crate::core::ValidationResult;
use crate::dataset::ColumnarDataset;
use tracing::{debug, instrument};

/// Checks that the dataset has exactly `expected` rows.
#[instrument(skip(dataset))]
pub fn check_row_count<D>(dataset: &D, expected: usize) -> ValidationResult
where
    D: ColumnarDataset + ?Sized,
{
    let actual = dataset.num_rows();
    debug!(result.row_count = actual, "Counted rows");
    if actual == expected {
        ValidationResult::pass("row_count")
    } else {
        ValidationResult::fail(
            "row_count",
            format!("expected {expected} rows, found {actual}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ArrowDataset;
    use crate::test_fixtures::{imaging_dataset, imaging_schema};

    #[test]
    fn test_row_count_equals() {
        let dataset = imaging_dataset(false);
        assert!(check_row_count(&dataset, 3).passed());
    }

    #[test]
    fn test_row_count_mismatch() {
        let dataset = imaging_dataset(false);
        let result = check_row_count(&dataset, 4);
        assert!(!result.passed());
        assert_eq!(result.details(), "expected 4 rows, found 3");
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = ArrowDataset::try_new(imaging_schema(), Vec::new()).unwrap();
        assert!(check_row_count(&dataset, 0).passed());
        assert!(!check_row_count(&dataset, 1).passed());
    }
}
