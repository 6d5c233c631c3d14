//! Checks over a dataset bundle on disk.

use super::{bracketed, check_name};
use crate::core::ValidationResult;
use crate::prelude::*;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use glob::{MatchOptions, Pattern};
use std::fs::File;
use std::io::{self, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn compile_pattern(pattern: &str) -> Result<Pattern> {
    if Path::new(pattern).is_absolute() {
        return Err(GuardError::Configuration(format!(
            "glob pattern '{pattern}' must be relative to the dataset directory"
        )));
    }
    Pattern::new(pattern)
        .map_err(|e| GuardError::Configuration(format!("invalid glob pattern '{pattern}': {e}")))
}

/// Counts the entries under `directory` that match the relative glob
/// `pattern` and compares against `expected`.
///
/// Entries include directories, so `sub-*` counts subject folders and
/// `sub-*/ses-*/anat/*_T1w.nii.gz` counts anatomical images. `*` does not
/// cross path separators; `**` does.
///
/// # Errors
///
/// [`GuardError::Configuration`] for an invalid or absolute pattern, or a
/// directory path that is not valid UTF-8. [`GuardError::Io`] if `directory`
/// is missing or not a directory, or if an entry cannot be read while
/// globbing.
#[instrument(skip(directory), fields(check.directory = %directory.as_ref().display()))]
pub fn check_count(
    directory: impl AsRef<Path>,
    pattern: &str,
    expected: usize,
) -> Result<ValidationResult> {
    let directory = directory.as_ref();
    compile_pattern(pattern)?;
    if !std::fs::metadata(directory)?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", directory.display()),
        )
        .into());
    }
    let root = directory.to_str().ok_or_else(|| {
        GuardError::Configuration(format!(
            "directory '{}' is not valid UTF-8",
            directory.display()
        ))
    })?;

    let full = format!("{}/{pattern}", Pattern::escape(root.trim_end_matches('/')));
    let entries = glob::glob_with(&full, MATCH_OPTIONS)
        .map_err(|e| GuardError::Configuration(format!("invalid glob pattern '{pattern}': {e}")))?;
    let mut actual = 0usize;
    for entry in entries {
        entry.map_err(io::Error::from)?;
        actual += 1;
    }

    debug!(result.count = actual, check.expected = expected, "Counted matching entries");
    let name = check_name("file_count", pattern);
    if actual == expected {
        Ok(ValidationResult::pass(name))
    } else {
        let delta = actual as i128 - expected as i128;
        Ok(ValidationResult::fail(
            name,
            format!(
                "expected {expected} entries matching '{pattern}', found {actual} (delta {delta:+})"
            ),
        ))
    }
}

/// Fails if any file under `directory` is empty.
///
/// Every zero-byte file is listed by its path relative to `directory`, in a
/// stable (sorted) order. Symbolic links are followed, so a link to an empty
/// blob counts as an empty file. Links whose target is missing are listed
/// separately as broken.
///
/// # Errors
///
/// [`GuardError::Io`] if the directory cannot be walked.
pub fn check_zero_byte_files(directory: impl AsRef<Path>) -> Result<ValidationResult> {
    scan_zero_byte_files(directory.as_ref(), None)
}

/// Like [`check_zero_byte_files`], restricted to files whose relative path
/// matches `pattern` (e.g. `**/*.nii.gz`).
pub fn check_zero_byte_files_matching(
    directory: impl AsRef<Path>,
    pattern: &str,
) -> Result<ValidationResult> {
    let compiled = compile_pattern(pattern)?;
    scan_zero_byte_files(directory.as_ref(), Some((pattern, &compiled)))
}

#[instrument(skip(directory, filter), fields(check.directory = %directory.display()))]
fn scan_zero_byte_files(
    directory: &Path,
    filter: Option<(&str, &Pattern)>,
) -> Result<ValidationResult> {
    let name = check_name("zero_byte_files", filter.map(|(p, _)| p).unwrap_or(""));
    let mut scanned = 0usize;
    let mut empty: Vec<PathBuf> = Vec::new();
    let mut broken: Vec<PathBuf> = Vec::new();
    let selected = |relative: &Path| match filter {
        Some((_, pattern)) => pattern.matches_path_with(relative, MATCH_OPTIONS),
        None => true,
    };

    for entry in WalkDir::new(directory).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 && e.loop_ancestor().is_none() && is_dangling_link(&e) => {
                let relative = relative_to(directory, e.path().unwrap_or(directory));
                if selected(&relative) {
                    broken.push(relative);
                }
                continue;
            }
            Err(e) => return Err(io::Error::from(e).into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_to(directory, entry.path());
        if !selected(&relative) {
            continue;
        }
        scanned += 1;
        let len = entry.metadata().map_err(io::Error::from)?.len();
        if len == 0 {
            empty.push(relative);
        }
    }

    debug!(
        result.scanned = scanned,
        result.empty = empty.len(),
        result.broken = broken.len(),
        "Scanned file sizes"
    );
    if empty.is_empty() && broken.is_empty() {
        return Ok(ValidationResult::pass(name));
    }
    let mut problems = Vec::new();
    if !empty.is_empty() {
        problems.push(format!(
            "{} of {scanned} files are zero bytes: {}",
            empty.len(),
            bracketed(&displayed(&empty))
        ));
    }
    if !broken.is_empty() {
        problems.push(format!(
            "{} broken links: {}",
            broken.len(),
            bracketed(&displayed(&broken))
        ));
    }
    Ok(ValidationResult::fail(name, problems.join("; ")))
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn displayed(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

/// True if the walk error is a symlink whose target cannot be resolved.
fn is_dangling_link(error: &walkdir::Error) -> bool {
    error.path().is_some_and(|path| {
        std::fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
            && std::fs::metadata(path).is_err()
    })
}

/// Checks that every path in `paths` (relative to `directory`) exists.
///
/// # Errors
///
/// [`GuardError::Io`] if existence cannot be determined, e.g. on a
/// permission error.
#[instrument(skip(directory, paths), fields(check.directory = %directory.as_ref().display()))]
pub fn check_required_files<S: AsRef<str>>(
    directory: impl AsRef<Path>,
    paths: &[S],
) -> Result<ValidationResult> {
    let directory = directory.as_ref();
    let mut missing = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !directory.join(path).try_exists()? {
            missing.push(path);
        }
    }

    let name = check_name("required_files", "");
    if missing.is_empty() {
        debug!(check.required = paths.len(), "All required files present");
        Ok(ValidationResult::pass(name))
    } else {
        Ok(ValidationResult::fail(
            name,
            format!(
                "missing {} of {} required files: {}",
                missing.len(),
                paths.len(),
                bracketed(&missing)
            ),
        ))
    }
}

/// Checks that a CSV or TSV table can be opened and parsed end to end.
///
/// The delimiter follows the extension: `.tsv` is tab-separated, anything
/// else comma-separated. The first line is the header. The schema is
/// inferred from the whole file and then every record is read against it.
pub fn check_table_readable(path: impl AsRef<Path>) -> ValidationResult {
    let path = path.as_ref();
    let name = check_name("table_readable", &path.display().to_string());
    check_table_readable_named(name, path)
}

/// Like [`check_table_readable`], with the result carrying `name`.
#[instrument(skip(path), fields(check.path = %path.display()))]
pub(crate) fn check_table_readable_named(name: String, path: &Path) -> ValidationResult {
    match read_table(path) {
        Ok((0, _)) => ValidationResult::fail(name, format!("no columns in {}", path.display())),
        Ok((columns, rows)) => {
            debug!(result.columns = columns, result.rows = rows, "Table parsed");
            ValidationResult::pass_with_details(name, format!("{columns} columns, {rows} rows"))
        }
        Err(GuardError::Io(e)) => {
            warn!(error = %e, "Could not open table");
            ValidationResult::fail(name, format!("unreadable/missing: {} ({e})", path.display()))
        }
        Err(e) => ValidationResult::fail(name, format!("parse error in {}: {e}", path.display())),
    }
}

fn read_table(path: &Path) -> Result<(usize, usize)> {
    let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };
    let mut file = File::open(path)?;
    let format = Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    let (schema, _) = format.infer_schema(&mut file, None)?;
    let columns = schema.fields().len();
    if columns == 0 {
        return Ok((0, 0));
    }

    file.rewind()?;
    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_delimiter(delimiter)
        .build(file)?;
    let mut rows = 0;
    for batch in reader {
        rows += batch?.num_rows();
    }
    Ok((columns, rows))
}
