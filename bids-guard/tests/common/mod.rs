//! Shared fixtures for integration tests.

#![allow(dead_code)]

use arrow::array::{
    ArrayRef, BinaryBuilder, ListBuilder, StringArray, StringBuilder, StructBuilder,
};
use arrow::datatypes::{DataType, Field, Fields};
use arrow::record_batch::RecordBatch;
use bids_guard::dataset::{ArrowDataset, ColumnKind, ColumnarDataset};
use bids_guard::error::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub type Image<'a> = (&'a str, &'a [u8]);

/// Columns of the mock hosted dataset.
pub const MOCK_COLUMNS: [&str; 5] = ["subject_id", "session_id", "img", "runs", "runs_meta"];

pub fn image_fields() -> Fields {
    Fields::from(vec![
        Field::new("bytes", DataType::Binary, true),
        Field::new("path", DataType::Utf8, true),
    ])
}

fn append_image(builder: &mut StructBuilder, image: Option<Image<'_>>) {
    let (path, bytes) = match image {
        Some((path, bytes)) => (Some(path), Some(bytes)),
        None => (None, None),
    };
    builder
        .field_builder::<BinaryBuilder>(0)
        .unwrap()
        .append_option(bytes);
    builder
        .field_builder::<StringBuilder>(1)
        .unwrap()
        .append_option(path);
    builder.append(image.is_some());
}

/// Three rows shaped like a hosted BIDS dataset. None of the image bytes are
/// valid NIfTI.
///
/// | subject | session | img  | runs | runs_meta          |
/// |---------|---------|------|------|--------------------|
/// | sub-1   | ses-1   | a    | 1    | 1                  |
/// | sub-2   | ses-1   | null | 0    | 0                  |
/// | sub-3   | ses-2   | c    | 2    | 2 (1 if misaligned)|
pub fn mock_batch(misalign: bool) -> RecordBatch {
    let mut img = StructBuilder::from_fields(image_fields(), 3);
    append_image(&mut img, Some(("a.nii.gz", &b"not-a-nifti"[..])));
    append_image(&mut img, None);
    append_image(&mut img, Some(("c.nii.gz", &b"still-not-a-nifti"[..])));

    let mut runs = ListBuilder::new(StructBuilder::from_fields(image_fields(), 3));
    let run_rows: [&[Image<'_>]; 3] = [
        &[("r1.nii.gz", &b"x"[..])],
        &[],
        &[("r2.nii.gz", &b"y"[..]), ("r3.nii.gz", &b"z"[..])],
    ];
    for row in run_rows {
        for image in row {
            append_image(runs.values(), Some(*image));
        }
        runs.append(true);
    }

    let third: &[&str] = if misalign { &["m2"] } else { &["m2", "m3"] };
    let mut runs_meta = ListBuilder::new(StringBuilder::new());
    let meta_rows: [&[&str]; 3] = [&["m1"], &[], third];
    for row in meta_rows {
        for value in row {
            runs_meta.values().append_value(value);
        }
        runs_meta.append(true);
    }

    RecordBatch::try_from_iter(vec![
        (
            "subject_id",
            Arc::new(StringArray::from(vec!["sub-1", "sub-2", "sub-3"])) as ArrayRef,
        ),
        (
            "session_id",
            Arc::new(StringArray::from(vec!["ses-1", "ses-1", "ses-2"])) as ArrayRef,
        ),
        ("img", Arc::new(img.finish()) as ArrayRef),
        ("runs", Arc::new(runs.finish()) as ArrayRef),
        ("runs_meta", Arc::new(runs_meta.finish()) as ArrayRef),
    ])
    .unwrap()
}

pub fn mock_dataset(misalign: bool) -> ArrowDataset {
    ArrowDataset::from_batch(mock_batch(misalign))
}

/// The same rows spread over two record batches.
pub fn mock_dataset_split(misalign: bool) -> ArrowDataset {
    let batch = mock_batch(misalign);
    ArrowDataset::try_new(batch.schema(), vec![batch.slice(0, 2), batch.slice(2, 1)]).unwrap()
}

/// A dataset that panics if anything asks for payload bytes.
#[derive(Debug)]
pub struct DecodeTrap<D>(pub D);

impl<D: ColumnarDataset> ColumnarDataset for DecodeTrap<D> {
    fn num_rows(&self) -> usize {
        self.0.num_rows()
    }

    fn column_names(&self) -> Vec<String> {
        self.0.column_names()
    }

    fn column_kind(&self, column: &str) -> Result<ColumnKind> {
        self.0.column_kind(column)
    }

    fn scalar_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        self.0.scalar_values(column)
    }

    fn list_lengths(&self, column: &str) -> Result<Vec<usize>> {
        self.0.list_lengths(column)
    }

    fn presence(&self, column: &str) -> Result<Vec<bool>> {
        self.0.presence(column)
    }

    fn blob_bytes(&self, column: &str, row: usize) -> Result<Option<Vec<u8>>> {
        panic!("payload of {column}[{row}] was read during validation");
    }
}

pub fn write_file(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// MD5 of `archive.zip` in [`bids_tree`].
pub const ARCHIVE_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

/// A small downloaded BIDS tree: two subjects, three sessions, one archive.
pub fn bids_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_file(root, "dataset_description.json", br#"{"Name": "mock", "BIDSVersion": "1.8.0"}"#);
    write_file(
        root,
        "participants.tsv",
        b"participant_id\tage\tsex\nsub-01\t54\tM\nsub-02\t61\tF\n",
    );
    write_file(root, "archive.zip", b"hello world");
    for (subject, session) in [("01", "1"), ("01", "2"), ("02", "1")] {
        let stem = format!("sub-{subject}/ses-{session}/anat/sub-{subject}_ses-{session}");
        write_file(root, &format!("{stem}_T1w.nii.gz"), b"\x1f\x8b\x08 t1w");
        write_file(root, &format!("{stem}_T1w.json"), b"{}");
    }
    dir
}
