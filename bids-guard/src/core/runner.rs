//! Executes checks and collects their results.

use super::{DatasetValidationConfig, ValidationCheck, ValidationReport, ValidationTarget};
use crate::logging::{truncate_field, LogConfig};
use crate::prelude::*;
use std::time::Instant;
use tracing::{debug, info, instrument, warn, Level};

/// Runs `checks` against `target` in order and collects one result per check.
///
/// A failing check never stops the run: every check is executed and the
/// report preserves the input order. Faults inside a check (for example an
/// unreadable directory) are already folded into a failed result by
/// [`ValidationCheck::execute`].
///
/// # Errors
///
/// Returns the first contract violation ([`GuardError::ColumnNotFound`],
/// [`GuardError::TypeMismatch`], [`GuardError::TargetMismatch`] or
/// [`GuardError::Configuration`]). These indicate a bad check list rather
/// than bad data, so no partial report is returned.
pub fn run_checks(
    name: &str,
    target: ValidationTarget<'_>,
    checks: &[ValidationCheck],
) -> Result<ValidationReport> {
    run_checks_with(name, target, checks, &LogConfig::default())
}

/// Like [`run_checks`], with explicit logging settings.
#[instrument(skip(target, checks, log_config), fields(
    dataset.name = %name,
    target.kind = %target.kind(),
    checks.total = checks.len()
))]
pub fn run_checks_with(
    name: &str,
    target: ValidationTarget<'_>,
    checks: &[ValidationCheck],
    log_config: &LogConfig,
) -> Result<ValidationReport> {
    info!(
        dataset.name = %name,
        checks.total = checks.len(),
        "Starting validation"
    );
    let start_time = Instant::now();
    let mut report = ValidationReport::new(name);

    for check in checks {
        let result = check.execute(target)?;
        if result.passed() {
            if log_config.log_check_details && !result.details().is_empty() {
                debug!(
                    check.name = %result.check_name(),
                    check.details = %truncate_field(result.details(), log_config.max_field_length),
                    "Check passed"
                );
            } else {
                debug!(check.name = %result.check_name(), "Check passed");
            }
        } else if log_config.base_level >= Level::WARN {
            warn!(
                check.name = %result.check_name(),
                check.details = %truncate_field(result.details(), log_config.max_field_length),
                "Check failed"
            );
        }
        report.push(result);
    }

    info!(
        dataset.name = %name,
        checks.passed = report.passed_count(),
        checks.failed = report.failed_count(),
        duration_ms = start_time.elapsed().as_millis() as u64,
        "Validation completed"
    );
    Ok(report)
}

/// Validates `target` against the checks `config` derives for its kind.
///
/// A directory target runs [`DatasetValidationConfig::file_checks`], a
/// dataset target runs [`DatasetValidationConfig::dataset_checks`]. The
/// report is named after the config.
///
/// # Errors
///
/// [`GuardError::Configuration`] if the config does not
/// [`validate`](DatasetValidationConfig::validate), plus the contract
/// violations of [`run_checks`].
pub fn validate_dataset(
    target: ValidationTarget<'_>,
    config: &DatasetValidationConfig,
) -> Result<ValidationReport> {
    config.validate()?;
    let checks = config.checks_for(target.kind());
    run_checks(&config.name, target, &checks)
}
