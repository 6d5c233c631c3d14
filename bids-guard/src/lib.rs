//! # bids-guard - Structural validation for neuroimaging datasets
//!
//! bids-guard checks that a dataset arrived intact: that a downloaded BIDS
//! tree has the expected subjects and files, that archives match their
//! published digests, and that a hosted columnar copy of the dataset has the
//! expected columns, rows and per-session image lists.
//!
//! It never looks inside the images. Columnar checks answer every question
//! from Arrow metadata (null buffers and list offsets), so a dataset whose
//! image payloads are corrupt or in an unknown format validates exactly like
//! a healthy one with the same shape.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bids_guard::prelude::*;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = DatasetValidationConfig::builder("arc")
//!     .expected_count("sub-*", 230)
//!     .required_file("dataset_description.json")
//!     .expected_columns(["subject_id", "session_id", "t1w", "bold", "bold_meta"])
//!     .unique_values("subject_id", 230)
//!     .non_null_count("t1w", 441)
//!     .list_sessions("bold", 850)
//!     .aligned_lists(["bold", "bold_meta"])
//!     .row_id_columns(["subject_id", "session_id"])
//!     .build()?;
//!
//! // The downloaded tree on disk.
//! let report = validate_dataset(
//!     ValidationTarget::Directory(std::path::Path::new("/data/arc")),
//!     &config,
//! )?;
//! println!("{} of {} file checks passed", report.passed_count(), report.len());
//!
//! // The hosted copy, read straight from Parquet.
//! let dataset = ArrowDataset::from_parquet("/data/arc/train-00000.parquet")?;
//! let report = validate_dataset(ValidationTarget::Dataset(&dataset), &config)?;
//! for failure in report.failures() {
//!     eprintln!("{failure}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`checks`**: the check functions, filesystem and columnar
//! - **`core`**: `ValidationCheck`, results and reports, the runner, and
//!   per-dataset configuration
//! - **`dataset`**: the `ColumnarDataset` trait and its Arrow implementation,
//!   with DataFusion and Parquet loaders
//! - **`error`**: `GuardError` and the `Result` alias
//! - **`logging`**: `tracing` configuration helpers
//!
//! ## Findings versus errors
//!
//! A data problem is a failed [`ValidationResult`](core::ValidationResult),
//! never an `Err`. `Err` is reserved for misuse (an unknown column, a list
//! check pointed at a scalar column, a malformed config) and aborts the run.

pub mod checks;
pub mod core;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod prelude;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
