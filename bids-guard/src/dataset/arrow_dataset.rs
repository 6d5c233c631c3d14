//! [`ColumnarDataset`] over Arrow record batches.

use super::{ColumnKind, ColumnarDataset};
use crate::prelude::*;
use arrow::array::{
    Array, ArrayRef, AsArray, GenericListArray, GenericListViewArray, OffsetSizeTrait,
};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};

/// An in-memory dataset made of one or more Arrow record batches.
///
/// List lengths are read from list offsets and presence from null buffers,
/// so the value buffers holding image payloads are never touched. Rows are
/// numbered across batches in batch order.
///
/// # Examples
///
/// ```rust
/// use arrow::array::StringArray;
/// use arrow::datatypes::{DataType, Field, Schema};
/// use arrow::record_batch::RecordBatch;
/// use bids_guard::dataset::{ArrowDataset, ColumnarDataset};
/// use std::sync::Arc;
///
/// let schema = Arc::new(Schema::new(vec![Field::new("subject_id", DataType::Utf8, false)]));
/// let batch = RecordBatch::try_new(
///     schema,
///     vec![Arc::new(StringArray::from(vec!["sub-1", "sub-2"]))],
/// )
/// .unwrap();
///
/// let dataset = ArrowDataset::from_batch(batch);
/// assert_eq!(dataset.num_rows(), 2);
/// assert_eq!(dataset.column_names(), vec!["subject_id"]);
/// ```
#[derive(Debug, Clone)]
pub struct ArrowDataset {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    num_rows: usize,
}

impl ArrowDataset {
    /// Creates a dataset from a schema and batches that all follow it.
    ///
    /// Every batch must carry the schema's field names and data types in
    /// order; nullability may differ. An empty batch list is a valid,
    /// zero-row dataset.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        let expected = schema.fields().len();
        for (index, batch) in batches.iter().enumerate() {
            if batch.num_columns() != expected {
                return Err(GuardError::data_source(
                    "Arrow",
                    format!(
                        "batch {index} has {} columns, schema declares {expected}",
                        batch.num_columns()
                    ),
                ));
            }
            let batch_schema = batch.schema();
            let mismatch = schema
                .fields()
                .iter()
                .zip(batch_schema.fields().iter())
                .find(|(declared, actual)| {
                    declared.name() != actual.name() || declared.data_type() != actual.data_type()
                });
            if let Some((declared, actual)) = mismatch {
                return Err(GuardError::data_source(
                    "Arrow",
                    format!(
                        "batch {index} has field '{}: {}', schema declares '{}: {}'",
                        actual.name(),
                        actual.data_type(),
                        declared.name(),
                        declared.data_type()
                    ),
                ));
            }
        }
        let num_rows = batches.iter().map(RecordBatch::num_rows).sum();
        Ok(Self {
            schema,
            batches,
            num_rows,
        })
    }

    /// Creates a dataset from a single batch.
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            num_rows: batch.num_rows(),
            batches: vec![batch],
        }
    }

    /// The Arrow schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The underlying batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.schema
            .index_of(column)
            .map_err(|_| GuardError::column_not_found(column))
    }

    fn column_chunks(&self, column: &str) -> Result<Vec<&ArrayRef>> {
        let index = self.column_index(column)?;
        Ok(self.batches.iter().map(|batch| batch.column(index)).collect())
    }

    fn data_type(&self, column: &str) -> Result<&DataType> {
        let index = self.column_index(column)?;
        Ok(self.schema.field(index).data_type())
    }

    /// Maps a global row number to `(batch, row within batch)`.
    fn locate(&self, row: usize) -> Result<(usize, usize)> {
        let mut start = 0;
        for (index, batch) in self.batches.iter().enumerate() {
            if row < start + batch.num_rows() {
                return Ok((index, row - start));
            }
            start += batch.num_rows();
        }
        Err(GuardError::Configuration(format!(
            "row {row} is out of range for a dataset with {} rows",
            self.num_rows
        )))
    }
}

fn push_presence(array: &dyn Array, out: &mut Vec<bool>) {
    match array.logical_nulls() {
        Some(nulls) => out.extend(nulls.iter()),
        None => out.extend(std::iter::repeat_n(true, array.len())),
    }
}

fn push_offset_lengths<O: OffsetSizeTrait>(list: &GenericListArray<O>, out: &mut Vec<usize>) {
    for (row, window) in list.value_offsets().windows(2).enumerate() {
        // A null slot may still span a non-empty offset range.
        out.push(if list.is_valid(row) {
            window[1].as_usize() - window[0].as_usize()
        } else {
            0
        });
    }
}

fn push_view_lengths<O: OffsetSizeTrait>(
    column: &str,
    view: Option<&GenericListViewArray<O>>,
    out: &mut Vec<usize>,
) -> Result<()> {
    let view = view
        .ok_or_else(|| GuardError::Internal(format!("column '{column}' is not a list view")))?;
    for (row, size) in view.sizes().iter().enumerate() {
        out.push(if view.is_valid(row) { size.as_usize() } else { 0 });
    }
    Ok(())
}

fn push_list_lengths(column: &str, array: &dyn Array, out: &mut Vec<usize>) -> Result<()> {
    match array.data_type() {
        DataType::List(_) => push_offset_lengths(array.as_list::<i32>(), out),
        DataType::LargeList(_) => push_offset_lengths(array.as_list::<i64>(), out),
        DataType::FixedSizeList(_, size) => {
            let size = usize::try_from(*size).unwrap_or(0);
            for row in 0..array.len() {
                out.push(if array.is_valid(row) { size } else { 0 });
            }
        }
        DataType::ListView(_) => {
            let view = array.as_any().downcast_ref::<GenericListViewArray<i32>>();
            push_view_lengths(column, view, out)?;
        }
        DataType::LargeListView(_) => {
            let view = array.as_any().downcast_ref::<GenericListViewArray<i64>>();
            push_view_lengths(column, view, out)?;
        }
        other => {
            return Err(GuardError::type_mismatch(column, "list", other.to_string()));
        }
    }
    Ok(())
}

fn binary_value(column: &str, array: &dyn Array, row: usize) -> Result<Option<Vec<u8>>> {
    if array.is_null(row) {
        return Ok(None);
    }
    let bytes = match array.data_type() {
        DataType::Binary => array.as_binary::<i32>().value(row).to_vec(),
        DataType::LargeBinary => array.as_binary::<i64>().value(row).to_vec(),
        DataType::BinaryView => array.as_binary_view().value(row).to_vec(),
        DataType::FixedSizeBinary(_) => array.as_fixed_size_binary().value(row).to_vec(),
        DataType::Struct(_) => {
            // Image features are encoded as {bytes, path}.
            let parts = array.as_struct();
            let payload = parts
                .column_by_name("bytes")
                .or_else(|| {
                    parts.columns().iter().find(|child| {
                        matches!(
                            child.data_type(),
                            DataType::Binary | DataType::LargeBinary | DataType::BinaryView
                        )
                    })
                })
                .ok_or_else(|| {
                    GuardError::type_mismatch(
                        column,
                        "struct with a binary field",
                        array.data_type().to_string(),
                    )
                })?;
            return binary_value(column, payload.as_ref(), row);
        }
        other => return Err(GuardError::type_mismatch(column, "blob", other.to_string())),
    };
    Ok(Some(bytes))
}

impl ColumnarDataset for ArrowDataset {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    fn column_kind(&self, column: &str) -> Result<ColumnKind> {
        Ok(ColumnKind::from_data_type(self.data_type(column)?))
    }

    fn scalar_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        let data_type = self.data_type(column)?;
        if ColumnKind::from_data_type(data_type) != ColumnKind::Scalar {
            return Err(GuardError::type_mismatch(column, "scalar", data_type.to_string()));
        }

        let options = FormatOptions::default();
        let mut values = Vec::with_capacity(self.num_rows);
        let mut presence = Vec::new();
        for chunk in self.column_chunks(column)? {
            presence.clear();
            push_presence(chunk.as_ref(), &mut presence);
            let formatter = ArrayFormatter::try_new(chunk.as_ref(), &options)?;
            for (row, present) in presence.iter().enumerate() {
                values.push(present.then(|| formatter.value(row).to_string()));
            }
        }
        Ok(values)
    }

    fn list_lengths(&self, column: &str) -> Result<Vec<usize>> {
        let mut lengths = Vec::with_capacity(self.num_rows);
        for chunk in self.column_chunks(column)? {
            push_list_lengths(column, chunk.as_ref(), &mut lengths)?;
        }
        Ok(lengths)
    }

    fn presence(&self, column: &str) -> Result<Vec<bool>> {
        let mut presence = Vec::with_capacity(self.num_rows);
        for chunk in self.column_chunks(column)? {
            push_presence(chunk.as_ref(), &mut presence);
        }
        Ok(presence)
    }

    fn non_null_count(&self, column: &str) -> Result<usize> {
        Ok(self
            .column_chunks(column)?
            .iter()
            .map(|chunk| chunk.len() - chunk.logical_null_count())
            .sum())
    }

    fn blob_bytes(&self, column: &str, row: usize) -> Result<Option<Vec<u8>>> {
        let index = self.column_index(column)?;
        let data_type = self.schema.field(index).data_type();
        if ColumnKind::from_data_type(data_type) != ColumnKind::Blob {
            return Err(GuardError::type_mismatch(column, "blob", data_type.to_string()));
        }
        let (batch, offset) = self.locate(row)?;
        binary_value(column, self.batches[batch].column(index).as_ref(), offset)
    }
}
