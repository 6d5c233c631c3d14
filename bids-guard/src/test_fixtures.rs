//! Fixtures shared by unit tests, integration tests and benchmarks.
//!
//! The imaging fixture mirrors how hosted neuroimaging datasets encode their
//! rows: scalar identifier columns, a single-image column stored as a
//! `{bytes, path}` struct, a list-of-images column and a list-of-strings
//! column. The image bytes are deliberately not valid NIfTI.

use crate::dataset::ArrowDataset;
use arrow::array::{ArrayRef, BinaryArray, ListArray, StringArray, StructArray};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Fields of the `{bytes, path}` image encoding.
pub fn image_fields() -> Fields {
    Fields::from(vec![
        Field::new("bytes", DataType::Binary, true),
        Field::new("path", DataType::Utf8, true),
    ])
}

fn image_list_item() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Struct(image_fields()), true))
}

fn string_list_item() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Utf8, true))
}

/// Schema of the imaging fixture.
pub fn imaging_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("subject_id", DataType::Utf8, false),
        Field::new("session_id", DataType::Utf8, false),
        Field::new("img", DataType::Struct(image_fields()), true),
        Field::new("runs", DataType::List(image_list_item()), true),
        Field::new("runs_meta", DataType::List(string_list_item()), true),
    ]))
}

/// Builds a `{bytes, path}` image array; `None` entries are null images.
pub fn image_array(images: &[Option<(&str, &[u8])>]) -> StructArray {
    let paths: StringArray = images.iter().map(|image| image.map(|(path, _)| path)).collect();
    let bytes: BinaryArray = images.iter().map(|image| image.map(|(_, bytes)| bytes)).collect();
    let validity = NullBuffer::from(images.iter().map(Option::is_some).collect::<Vec<_>>());
    StructArray::new(
        image_fields(),
        vec![Arc::new(bytes) as ArrayRef, Arc::new(paths) as ArrayRef],
        Some(validity),
    )
}

/// Builds a list-of-images array from per-row image lists.
pub fn image_list_array(rows: &[Vec<(&str, &[u8])>]) -> ListArray {
    let flattened: Vec<Option<(&str, &[u8])>> =
        rows.iter().flat_map(|row| row.iter().copied().map(Some)).collect();
    ListArray::new(
        image_list_item(),
        OffsetBuffer::from_lengths(rows.iter().map(Vec::len)),
        Arc::new(image_array(&flattened)),
        None,
    )
}

/// Builds a list-of-strings array from per-row string lists.
pub fn string_list_array(rows: &[Vec<&str>]) -> ListArray {
    let values: StringArray = rows.iter().flatten().map(|value| Some(*value)).collect();
    ListArray::new(
        string_list_item(),
        OffsetBuffer::from_lengths(rows.iter().map(Vec::len)),
        Arc::new(values),
        None,
    )
}

/// A three-row batch.
///
/// | subject_id | session_id | img  | runs | runs_meta        |
/// |------------|------------|------|------|------------------|
/// | sub-1      | ses-1      | blob | 1    | 1                |
/// | sub-2      | ses-1      | null | 0    | 0                |
/// | sub-3      | ses-2      | blob | 2    | 2 (1 if misalign)|
pub fn imaging_batch(misalign: bool) -> RecordBatch {
    let runs_meta_third = if misalign { vec!["m2"] } else { vec!["m2", "m3"] };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["sub-1", "sub-2", "sub-3"])),
        Arc::new(StringArray::from(vec!["ses-1", "ses-1", "ses-2"])),
        Arc::new(image_array(&[
            Some(("a.nii.gz", b"not-a-nifti".as_slice())),
            None,
            Some(("c.nii.gz", b"still-not-a-nifti".as_slice())),
        ])),
        Arc::new(image_list_array(&[
            vec![("r1.nii.gz", b"x".as_slice())],
            vec![],
            vec![("r2.nii.gz", b"y".as_slice()), ("r3.nii.gz", b"z".as_slice())],
        ])),
        Arc::new(string_list_array(&[vec!["m1"], vec![], runs_meta_third])),
    ];

    RecordBatch::try_new(imaging_schema(), columns).expect("fixture batch matches its schema")
}

/// The imaging fixture as a dataset.
pub fn imaging_dataset(misalign: bool) -> ArrowDataset {
    ArrowDataset::from_batch(imaging_batch(misalign))
}
