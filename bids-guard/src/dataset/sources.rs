//! Loaders that build an [`ArrowDataset`] from a storage engine.
//!
//! Both loaders accept a column projection. Validating list lengths or blob
//! presence only needs those columns, so a projection keeps unrelated image
//! columns out of memory entirely.

use super::{ArrowDataset, ColumnarDataset};
use crate::prelude::*;
use arrow::record_batch::RecordBatchReader;
use datafusion::prelude::SessionContext;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

impl ArrowDataset {
    /// Collects a table registered in a DataFusion session.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use bids_guard::dataset::{ArrowDataset, ColumnarDataset};
    /// use datafusion::prelude::*;
    ///
    /// # async fn example() -> bids_guard::prelude::Result<()> {
    /// let ctx = SessionContext::new();
    /// ctx.register_parquet("arc", "arc/train.parquet", ParquetReadOptions::default()).await?;
    /// let dataset = ArrowDataset::from_table(&ctx, "arc").await?;
    /// println!("{} rows", dataset.num_rows());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(ctx))]
    pub async fn from_table(ctx: &SessionContext, table: &str) -> Result<Self> {
        Self::load_table(ctx, table, None).await
    }

    /// Collects only the named columns of a DataFusion table.
    #[instrument(skip(ctx))]
    pub async fn from_table_columns(
        ctx: &SessionContext,
        table: &str,
        columns: &[&str],
    ) -> Result<Self> {
        Self::load_table(ctx, table, Some(columns)).await
    }

    async fn load_table(
        ctx: &SessionContext,
        table: &str,
        columns: Option<&[&str]>,
    ) -> Result<Self> {
        let mut df = ctx.table(table).await.map_err(|e| {
            GuardError::data_source_with_source(
                "DataFusion",
                format!("failed to open table '{table}'"),
                Box::new(e),
            )
        })?;

        if let Some(columns) = columns {
            let available: Vec<&str> = df
                .schema()
                .fields()
                .iter()
                .map(|field| field.name().as_str())
                .collect();
            if let Some(missing) = columns.iter().find(|column| !available.contains(*column)) {
                return Err(GuardError::column_not_found(*missing));
            }
            df = df.select_columns(columns)?;
        }

        let schema = Arc::new(df.schema().as_arrow().clone());
        let batches = df.collect().await?;
        let dataset = ArrowDataset::try_new(schema, batches)?;

        info!(
            source.table = %table,
            source.rows = dataset.num_rows(),
            source.batches = dataset.batches().len(),
            "Loaded dataset from DataFusion table"
        );
        Ok(dataset)
    }

    /// Reads a Parquet file.
    pub fn from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_parquet(path.as_ref(), None)
    }

    /// Reads only the named top-level columns of a Parquet file.
    pub fn from_parquet_columns(path: impl AsRef<Path>, columns: &[&str]) -> Result<Self> {
        Self::load_parquet(path.as_ref(), Some(columns))
    }

    #[instrument(fields(source.path = %path.display()))]
    fn load_parquet(path: &Path, columns: Option<&[&str]>) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            GuardError::data_source_with_source(
                "Parquet",
                format!("invalid parquet file {}", path.display()),
                Box::new(e),
            )
        })?;

        if let Some(columns) = columns {
            let arrow_schema = builder.schema().clone();
            let indices = columns
                .iter()
                .map(|column| {
                    arrow_schema
                        .index_of(column)
                        .map_err(|_| GuardError::column_not_found(*column))
                })
                .collect::<Result<Vec<_>>>()?;
            let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
            builder = builder.with_projection(mask);
        }

        let reader = builder.build()?;
        let schema = reader.schema();
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(
            source.batches = batches.len(),
            "Read parquet record batches"
        );
        ArrowDataset::try_new(schema, batches)
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::{ArrowDataset, ColumnarDataset};
    use crate::test_fixtures::imaging_batch;
    use datafusion::prelude::SessionContext;
    use parquet::arrow::ArrowWriter;
    use std::fs::File;

    #[tokio::test]
    async fn test_from_table() {
        let ctx = SessionContext::new();
        ctx.register_batch("imaging", imaging_batch(false)).unwrap();

        let dataset = ArrowDataset::from_table(&ctx, "imaging").await.unwrap();
        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.list_lengths("runs").unwrap(), vec![1, 0, 2]);
        assert_eq!(dataset.non_null_count("img").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_from_table_projection() {
        let ctx = SessionContext::new();
        ctx.register_batch("imaging", imaging_batch(false)).unwrap();

        let dataset = ArrowDataset::from_table_columns(&ctx, "imaging", &["subject_id", "runs"])
            .await
            .unwrap();
        assert_eq!(dataset.column_names(), vec!["subject_id", "runs"]);
        assert_eq!(dataset.list_lengths("runs").unwrap(), vec![1, 0, 2]);

        let missing =
            ArrowDataset::from_table_columns(&ctx, "imaging", &["subject_id", "dwi"]).await;
        assert!(missing.unwrap_err().is_contract_violation());
    }

    #[tokio::test]
    async fn test_from_unknown_table() {
        let ctx = SessionContext::new();
        let err = ArrowDataset::from_table(&ctx, "nope").await.unwrap_err();
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_parquet_round_trip_with_projection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.parquet");
        let batch = imaging_batch(true);

        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), batch.schema(), None)
            .unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let full = ArrowDataset::from_parquet(&path).unwrap();
        assert_eq!(full.num_rows(), 3);
        assert_eq!(full.presence("img").unwrap(), vec![true, false, true]);
        assert_eq!(full.list_lengths("runs_meta").unwrap(), vec![1, 0, 1]);

        let projected = ArrowDataset::from_parquet_columns(&path, &["session_id", "runs"]).unwrap();
        assert_eq!(projected.column_names(), vec!["session_id", "runs"]);
        assert_eq!(projected.list_lengths("runs").unwrap(), vec![1, 0, 2]);

        let err = ArrowDataset::from_parquet_columns(&path, &["t2w"]).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_missing_parquet_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArrowDataset::from_parquet(dir.path().join("absent.parquet")).unwrap_err();
        assert!(!err.is_contract_violation());
    }
}
