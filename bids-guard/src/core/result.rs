//! Validation result types.

use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of executing a single check.
///
/// A result is created once per check execution and never mutated. A failed
/// result always carries non-empty details; a passing result may carry
/// details but has no obligation to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    check_name: String,
    passed: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    details: String,
}

impl ValidationResult {
    /// Creates a result, rejecting a failure that has no details.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bids_guard::core::ValidationResult;
    ///
    /// assert!(ValidationResult::new("row_count", true, "").is_ok());
    /// assert!(ValidationResult::new("row_count", false, "  ").is_err());
    /// ```
    pub fn new(
        check_name: impl Into<String>,
        passed: bool,
        details: impl Into<String>,
    ) -> Result<Self> {
        let check_name = check_name.into();
        let details = details.into();
        if !passed && details.trim().is_empty() {
            return Err(GuardError::Configuration(format!(
                "failed result for '{check_name}' must carry details"
            )));
        }
        Ok(Self {
            check_name,
            passed,
            details,
        })
    }

    /// Creates a passing result with no details.
    pub fn pass(check_name: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            passed: true,
            details: String::new(),
        }
    }

    /// Creates a passing result with informational details.
    pub fn pass_with_details(check_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            passed: true,
            details: details.into(),
        }
    }

    /// Creates a failed result.
    ///
    /// Blank details are replaced with a generic message naming the check.
    pub fn fail(check_name: impl Into<String>, details: impl Into<String>) -> Self {
        let check_name = check_name.into();
        let mut details = details.into();
        if details.trim().is_empty() {
            details = format!("{check_name} failed");
        }
        Self {
            check_name,
            passed: false,
            details,
        }
    }

    /// The identity of the check that produced this result.
    pub fn check_name(&self) -> &str {
        &self.check_name
    }

    /// Whether the check passed.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Diagnostic details; empty on an unconditional success.
    pub fn details(&self) -> &str {
        &self.details
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "PASS" } else { "FAIL" };
        if self.details.is_empty() {
            write!(f, "[{status}] {}", self.check_name)
        } else {
            write!(f, "[{status}] {}: {}", self.check_name, self.details)
        }
    }
}

/// The ordered results of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Name of the dataset (or ad-hoc run) that was validated
    pub dataset: String,
    /// Timestamp when the validation was run (ISO 8601 format)
    pub timestamp: String,
    /// One result per requested check, in request order
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    /// Creates an empty report.
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            results: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    /// Returns true if every check passed (vacuously true for an empty run).
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ValidationResult::passed)
    }

    /// Returns the failed results in run order.
    pub fn failures(&self) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| !r.passed()).collect()
    }

    /// Number of passing checks.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Number of failing checks.
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no checks ran.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The results in run order.
    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    /// Consumes the report, returning the results in run order.
    pub fn into_results(self) -> Vec<ValidationResult> {
        self.results
    }

    /// Looks up the first result produced by the named check.
    pub fn get(&self, check_name: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.check_name() == check_name)
    }
}

impl IntoIterator for ValidationReport {
    type Item = ValidationResult;
    type IntoIter = std::vec::IntoIter<ValidationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a ValidationResult;
    type IntoIter = std::slice::Iter<'a, ValidationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
