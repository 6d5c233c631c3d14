//! Distinct-value count check.

use super::check_name;
use crate::core::ValidationResult;
use crate::dataset::ColumnarDataset;
use crate::prelude::*;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Checks that a scalar column holds exactly `expected` distinct values.
///
/// Null is not a distinct value: a column of `["a", null, "a"]` has one
/// distinct value.
///
/// # Errors
///
/// [`GuardError::ColumnNotFound`] for an unknown column and
/// [`GuardError::TypeMismatch`] for blob or list columns.
#[instrument(skip(dataset))]
pub fn check_unique_values<D>(
    dataset: &D,
    column: &str,
    expected: usize,
) -> Result<ValidationResult>
where
    D: ColumnarDataset + ?Sized,
{
    let name = check_name("unique_values", column);
    let values = dataset.scalar_values(column)?;
    let nulls = values.iter().filter(|value| value.is_none()).count();
    let distinct: HashSet<String> = values.into_iter().flatten().collect();

    debug!(
        result.distinct = distinct.len(),
        result.nulls = nulls,
        "Counted distinct values"
    );
    if distinct.len() == expected {
        Ok(ValidationResult::pass(name))
    } else {
        Ok(ValidationResult::fail(
            name,
            format!(
                "column '{column}': expected {expected} distinct values, found {} ({nulls} nulls not counted)",
                distinct.len()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ArrowDataset;
    use crate::test_fixtures::imaging_dataset;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    #[test]
    fn test_unique_subjects() {
        let dataset = imaging_dataset(false);
        assert!(check_unique_values(&dataset, "subject_id", 3).unwrap().passed());
    }

    #[test]
    fn test_repeated_sessions() {
        let dataset = imaging_dataset(false);
        assert!(check_unique_values(&dataset, "session_id", 2).unwrap().passed());

        let result = check_unique_values(&dataset, "session_id", 3).unwrap();
        assert!(!result.passed());
        assert_eq!(result.check_name(), "unique_values:session_id");
        assert!(result.details().contains("expected 3 distinct values, found 2"));
    }

    #[test]
    fn test_nulls_are_not_distinct_values() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("site", DataType::Utf8, true),
            Field::new("age", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("a"), None, Some("a"), None])),
                Arc::new(Int64Array::from(vec![Some(30), Some(31), None, Some(30)])),
            ],
        )
        .unwrap();
        let dataset = ArrowDataset::from_batch(batch);

        assert!(check_unique_values(&dataset, "site", 1).unwrap().passed());
        let result = check_unique_values(&dataset, "site", 2).unwrap();
        assert!(result.details().contains("2 nulls not counted"));
        assert!(check_unique_values(&dataset, "age", 2).unwrap().passed());
    }

    #[test]
    fn test_contract_violations() {
        let dataset = imaging_dataset(false);
        assert!(matches!(
            check_unique_values(&dataset, "participant", 3),
            Err(GuardError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            check_unique_values(&dataset, "runs", 3),
            Err(GuardError::TypeMismatch { .. })
        ));
    }
}
