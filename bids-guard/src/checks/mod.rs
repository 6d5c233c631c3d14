//! Built-in checks.
//!
//! Filesystem checks inspect a downloaded dataset bundle on disk; columnar
//! checks inspect a [`ColumnarDataset`](crate::dataset::ColumnarDataset)
//! through metadata only. Each check returns exactly one
//! [`ValidationResult`](crate::core::ValidationResult), however many
//! individual problems it found.
//!
//! | Function | Family |
//! |----------|--------|
//! | [`check_count`] | files |
//! | [`check_zero_byte_files`] | files |
//! | [`check_required_files`] | files |
//! | [`check_table_readable`] | files |
//! | [`verify_md5`] / [`verify_checksum`] | files |
//! | [`check_schema`] | columnar |
//! | [`check_row_count`] | columnar |
//! | [`check_unique_values`] | columnar |
//! | [`check_non_null_count`] | columnar |
//! | [`check_list_sessions`] | columnar |
//! | [`check_total_list_items`] | columnar |
//! | [`check_list_alignment`] | columnar |

mod checksum;
mod completeness;
mod files;
mod lists;
mod schema;
mod size;
mod uniqueness;

pub use checksum::{verify_checksum, verify_md5, ChecksumAlgorithm};
pub(crate) use checksum::verify_checksum_named;
pub use completeness::check_non_null_count;
pub use files::{
    check_count, check_required_files, check_table_readable, check_zero_byte_files,
    check_zero_byte_files_matching,
};
pub(crate) use files::check_table_readable_named;
pub use lists::{check_list_alignment, check_list_sessions, check_total_list_items};
pub use schema::check_schema;
pub use size::check_row_count;
pub use uniqueness::check_unique_values;

/// Builds the `kind:subject` identity carried by results.
pub(crate) fn check_name(kind: &str, subject: &str) -> String {
    if subject.is_empty() {
        kind.to_string()
    } else {
        format!("{kind}:{subject}")
    }
}

/// Renders names as `[a, b, c]`.
pub(crate) fn bracketed<S: AsRef<str>>(items: &[S]) -> String {
    let joined = items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<&str>>()
        .join(", ");
    format!("[{joined}]")
}
