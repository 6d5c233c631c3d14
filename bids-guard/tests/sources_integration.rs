//! Loading hosted datasets through DataFusion and Parquet, then validating.

mod common;

use bids_guard::prelude::*;
use common::{mock_batch, DecodeTrap};
use datafusion::prelude::{ParquetReadOptions, SessionContext};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;

fn write_parquet(path: &Path, misalign: bool) {
    let batch = mock_batch(misalign);
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn list_config() -> DatasetValidationConfig {
    DatasetValidationConfig::builder("mock")
        .expected_rows(3)
        .unique_values("subject_id", 3)
        .list_sessions("runs", 2)
        .total_list_items("runs", 3)
        .aligned_lists(["runs", "runs_meta"])
        .row_id_columns(["subject_id", "session_id"])
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_validate_registered_parquet_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train-00000.parquet");
    write_parquet(&path, true);

    let ctx = SessionContext::new();
    ctx.register_parquet("mock", path.to_str().unwrap(), ParquetReadOptions::default())
        .await
        .unwrap();
    let dataset = ArrowDataset::from_table(&ctx, "mock").await.unwrap();

    let report = validate_dataset(ValidationTarget::Dataset(&DecodeTrap(dataset)), &list_config())
        .unwrap();
    let failed: Vec<&str> = report.failures().iter().map(|r| r.check_name()).collect();
    assert_eq!(failed, vec!["list_alignment:runs,runs_meta"]);
}

#[tokio::test]
async fn test_projection_leaves_out_image_columns() {
    let ctx = SessionContext::new();
    ctx.register_batch("mock", mock_batch(false)).unwrap();

    let dataset = ArrowDataset::from_table_columns(
        &ctx,
        "mock",
        &["subject_id", "session_id", "runs", "runs_meta"],
    )
    .await
    .unwrap();
    assert!(!dataset.has_column("img"));

    let report = validate_dataset(ValidationTarget::Dataset(&dataset), &list_config()).unwrap();
    assert!(report.all_passed(), "{:?}", report.failures());
}

#[test]
fn test_validate_parquet_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train-00000.parquet");
    write_parquet(&path, false);

    let dataset = ArrowDataset::from_parquet(&path).unwrap();
    let config = DatasetValidationConfig::builder("mock")
        .expected_columns(common::MOCK_COLUMNS)
        .non_null_count("img", 2)
        .build()
        .unwrap();
    let report =
        validate_dataset(ValidationTarget::Dataset(&DecodeTrap(dataset)), &config).unwrap();
    assert!(report.all_passed(), "{:?}", report.failures());
}

#[test]
fn test_corrupt_parquet_file_is_a_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train-00000.parquet");
    std::fs::write(&path, b"PAR1 but not really").unwrap();

    let err = ArrowDataset::from_parquet(&path).unwrap_err();
    assert!(matches!(err, GuardError::DataSource { .. }));
    assert!(!err.is_contract_violation());
}
