use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable diagnostic codes emitted by the invariant validators.
///
/// These are consumed by automated tests and the batch harness, not just
/// humans; treat them as a contract and never rename an existing code.
pub mod codes {
    // Load-profile rules
    pub const PEAK_NONPOSITIVE: &str = "PEAK_NONPOSITIVE";
    pub const LOAD_NEGATIVE: &str = "LOAD_NEGATIVE";
    pub const BASE_GT_PEAK: &str = "BASE_GT_PEAK";
    pub const ENERGY_NEGATIVE: &str = "ENERGY_NEGATIVE";
    pub const ENERGY_EXCEEDS_THEORETICAL_MAX: &str = "ENERGY_EXCEEDS_THEORETICAL_MAX";
    pub const DUTY_CYCLE_OUT_OF_RANGE: &str = "DUTY_CYCLE_OUT_OF_RANGE";
    pub const CONTRIBUTOR_NEGATIVE: &str = "CONTRIBUTOR_NEGATIVE";
    pub const CONTRIBUTOR_NAN: &str = "CONTRIBUTOR_NAN";
    pub const CONTRIBUTOR_SUM_MISMATCH: &str = "CONTRIBUTOR_SUM_MISMATCH";
    pub const PEAK_IMPLAUSIBLY_LARGE: &str = "PEAK_IMPLAUSIBLY_LARGE";
    pub const ENERGY_ABOVE_DAILY_CEILING: &str = "ENERGY_ABOVE_DAILY_CEILING";

    // Financial rules
    pub const CAPEX_NONPOSITIVE: &str = "CAPEX_NONPOSITIVE";
    pub const SAVINGS_NONPOSITIVE: &str = "SAVINGS_NONPOSITIVE";
    pub const ROI_NONPOSITIVE: &str = "ROI_NONPOSITIVE";
    pub const ROI_IMPLAUSIBLE: &str = "ROI_IMPLAUSIBLE";
    pub const PAYBACK_NONFINITE: &str = "PAYBACK_NONFINITE";
    pub const PAYBACK_EXCEEDS_HORIZON: &str = "PAYBACK_EXCEEDS_HORIZON";

    // Offline monotonicity checker
    pub const MONOTONICITY_VIOLATION: &str = "MONOTONICITY_VIOLATION";
}

/// Issue severity. `Error` fails a quote in the harness; `Warn` is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single validation finding with a stable code and optional structured context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, serde_json::Value>>,
}

impl Issue {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
            context: None,
        }
    }

    pub fn warn(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            code: code.to_string(),
            message: message.into(),
            context: None,
        }
    }

    /// Attach a context value; builds the context map on first use.
    pub fn with_context(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.context
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

/// True if any issue in the slice has error severity.
pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(Issue::is_error)
}

/// Count of error-severity issues in the slice.
pub fn error_count(issues: &[Issue]) -> usize {
    issues.iter().filter(|i| i.is_error()).count()
}
