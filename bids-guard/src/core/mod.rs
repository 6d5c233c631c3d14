//! Core validation types for bids-guard.
//!
//! ## Overview
//!
//! - **[`ValidationCheck`]**: one named check with its parameters and expectation
//! - **[`ValidationTarget`]**: what a check runs against, a directory or a dataset
//! - **[`ValidationResult`]**: the outcome of a single check
//! - **[`ValidationReport`]**: the ordered results of one run
//! - **[`DatasetValidationConfig`]**: per-dataset expectations that expand into checks
//!
//! ## Architecture
//!
//! ```text
//! DatasetValidationConfig
//!     ├── file_checks()    ──▶ run against ValidationTarget::Directory
//!     └── dataset_checks() ──▶ run against ValidationTarget::Dataset
//!                                  │
//!                          ValidationCheck::execute
//!                                  │
//!                          ValidationReport [ValidationResult, ...]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bids_guard::core::{validate_dataset, DatasetValidationConfig, ValidationTarget};
//!
//! # fn example(root: &std::path::Path) -> bids_guard::error::Result<()> {
//! let config = DatasetValidationConfig::builder("isles24")
//!     .expected_count("sub-*", 149)
//!     .required_file("dataset_description.json")
//!     .build()?;
//!
//! let report = validate_dataset(ValidationTarget::Directory(root), &config)?;
//! for failure in report.failures() {
//!     println!("{failure}");
//! }
//! # Ok(())
//! # }
//! ```

mod check;
mod config;
mod result;
mod runner;

pub use check::{TargetKind, ValidationCheck, ValidationTarget};
pub use config::{DatasetValidationConfig, DatasetValidationConfigBuilder};
pub use result::{ValidationReport, ValidationResult};
pub use runner::{run_checks, run_checks_with, validate_dataset};
