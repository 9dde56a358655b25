pub mod fuzz;
pub mod monotonic;

pub use fuzz::*;
pub use monotonic::*;

use serde::{Deserialize, Serialize};

use crate::domain::issue::{codes, Issue, Severity};
use crate::domain::{FinancialResult, LoadProfile};

/// Thresholds the rule tables evaluate against. All tunable from config so a
/// deployment can tighten or relax sanity bounds without a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Upper bound on duty cycle. Above 1.0 is physically suspect but real
    /// sites overdrive nominal hours, so the default leaves headroom.
    pub duty_cycle_max: f64,
    /// Peaks above this are flagged as implausible for a single facility.
    pub peak_implausible_kw: f64,
    /// Daily energy above this is flagged as implausible.
    pub energy_daily_ceiling_kwh: f64,
    /// Relative part of the contributor-sum tolerance, scaled by peak.
    pub contributor_tolerance_rel: f64,
    /// Absolute floor of the contributor-sum tolerance, in kW.
    pub contributor_tolerance_abs_kw: f64,
    /// Paybacks beyond this horizon draw a warning.
    pub payback_horizon_years: f64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            duty_cycle_max: 1.25,
            peak_implausible_kw: 250_000.0,
            energy_daily_ceiling_kwh: 2_000_000.0,
            contributor_tolerance_rel: 1e-6,
            contributor_tolerance_abs_kw: 1e-3,
            payback_horizon_years: 25.0,
        }
    }
}

impl ValidationPolicy {
    /// Allowed drift between the contributor sum and the peak.
    pub fn contributor_tolerance(&self, peak_kw: f64) -> f64 {
        (self.contributor_tolerance_rel * peak_kw.abs()).max(self.contributor_tolerance_abs_kw)
    }
}

/// One entry of a rule table: stable code, severity, and a predicate that
/// returns a message when violated.
pub struct Rule<T> {
    pub code: &'static str,
    pub severity: Severity,
    pub check: fn(&T, &ValidationPolicy) -> Option<String>,
}

/// Evaluate every rule in a table against a subject. No short-circuiting: one
/// pass reports every violation so a caller never fixes issues one at a time.
pub fn evaluate<T>(rules: &[Rule<T>], subject: &T, policy: &ValidationPolicy) -> Vec<Issue> {
    rules
        .iter()
        .filter_map(|rule| {
            (rule.check)(subject, policy).map(|message| match rule.severity {
                Severity::Error => Issue::error(rule.code, message),
                Severity::Warn => Issue::warn(rule.code, message),
            })
        })
        .collect()
}

/// Fixed rule table for load profiles. Physical impossibilities are errors;
/// magnitude sanity bounds are warnings.
pub static PROFILE_RULES: &[Rule<LoadProfile>] = &[
    Rule {
        code: codes::PEAK_NONPOSITIVE,
        severity: Severity::Error,
        check: |p, _| {
            if !p.peak_load_kw.is_finite() || p.peak_load_kw <= 0.0 {
                Some(format!(
                    "peak load must be a positive finite number, got {} kW",
                    p.peak_load_kw
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::LOAD_NEGATIVE,
        severity: Severity::Error,
        check: |p, _| {
            if !p.base_load_kw.is_finite() || p.base_load_kw < 0.0 {
                Some(format!(
                    "base load must be non-negative and finite, got {} kW",
                    p.base_load_kw
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::BASE_GT_PEAK,
        severity: Severity::Error,
        check: |p, _| {
            if p.base_load_kw.is_finite() && p.base_load_kw > p.peak_load_kw {
                Some(format!(
                    "base load {} kW exceeds peak {} kW",
                    p.base_load_kw, p.peak_load_kw
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::ENERGY_NEGATIVE,
        severity: Severity::Error,
        check: |p, _| {
            if !p.energy_kwh_per_day.is_finite() || p.energy_kwh_per_day < 0.0 {
                Some(format!(
                    "daily energy must be non-negative and finite, got {} kWh",
                    p.energy_kwh_per_day
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::ENERGY_EXCEEDS_THEORETICAL_MAX,
        severity: Severity::Error,
        check: |p, _| {
            let max = p.theoretical_max_energy();
            if p.energy_kwh_per_day.is_finite() && p.energy_kwh_per_day > max {
                Some(format!(
                    "daily energy {} kWh exceeds 24 h at peak ({} kWh)",
                    p.energy_kwh_per_day, max
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::DUTY_CYCLE_OUT_OF_RANGE,
        severity: Severity::Error,
        check: |p, policy| {
            // Optional field: absent is fine, present must be sane.
            let duty = p.duty_cycle?;
            if !duty.is_finite() || duty < 0.0 || duty > policy.duty_cycle_max {
                Some(format!(
                    "duty cycle {} outside [0, {}]",
                    duty, policy.duty_cycle_max
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::CONTRIBUTOR_NEGATIVE,
        severity: Severity::Error,
        check: |p, _| {
            let bad: Vec<&str> = p
                .kw_contributors
                .iter()
                .filter(|(_, v)| v.is_finite() && **v < 0.0)
                .map(|(k, _)| k.as_str())
                .collect();
            if bad.is_empty() {
                None
            } else {
                Some(format!("negative contributors: {}", bad.join(", ")))
            }
        },
    },
    Rule {
        code: codes::CONTRIBUTOR_NAN,
        severity: Severity::Error,
        check: |p, _| {
            let bad: Vec<&str> = p
                .kw_contributors
                .iter()
                .filter(|(_, v)| !v.is_finite())
                .map(|(k, _)| k.as_str())
                .collect();
            if bad.is_empty() {
                None
            } else {
                Some(format!("non-finite contributors: {}", bad.join(", ")))
            }
        },
    },
    Rule {
        code: codes::CONTRIBUTOR_SUM_MISMATCH,
        severity: Severity::Error,
        check: |p, policy| {
            let sum = p.contributor_sum();
            if !sum.is_finite() {
                // CONTRIBUTOR_NAN already covers this case.
                return None;
            }
            let tolerance = policy.contributor_tolerance(p.peak_load_kw);
            if (sum - p.peak_load_kw).abs() > tolerance {
                Some(format!(
                    "contributors sum to {} kW but peak is {} kW (tolerance {} kW)",
                    sum, p.peak_load_kw, tolerance
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::PEAK_IMPLAUSIBLY_LARGE,
        severity: Severity::Warn,
        check: |p, policy| {
            if p.peak_load_kw.is_finite() && p.peak_load_kw > policy.peak_implausible_kw {
                Some(format!(
                    "peak {} kW exceeds the plausibility bound of {} kW",
                    p.peak_load_kw, policy.peak_implausible_kw
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::ENERGY_ABOVE_DAILY_CEILING,
        severity: Severity::Warn,
        check: |p, policy| {
            if p.energy_kwh_per_day.is_finite()
                && p.energy_kwh_per_day > policy.energy_daily_ceiling_kwh
            {
                Some(format!(
                    "daily energy {} kWh exceeds the plausibility ceiling of {} kWh",
                    p.energy_kwh_per_day, policy.energy_daily_ceiling_kwh
                ))
            } else {
                None
            }
        },
    },
];

/// Fixed rule table for financial results.
pub static FINANCIAL_RULES: &[Rule<FinancialResult>] = &[
    Rule {
        code: codes::CAPEX_NONPOSITIVE,
        severity: Severity::Error,
        check: |f, _| {
            if !f.capex_usd.is_finite() || f.capex_usd <= 0.0 {
                Some(format!(
                    "capex must be a positive finite amount, got {}",
                    f.capex_usd
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::SAVINGS_NONPOSITIVE,
        severity: Severity::Error,
        check: |f, _| {
            if !f.annual_savings_usd.is_finite() || f.annual_savings_usd <= 0.0 {
                Some(format!(
                    "annual savings must be positive, got {}",
                    f.annual_savings_usd
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::ROI_NONPOSITIVE,
        severity: Severity::Error,
        check: |f, _| {
            if !f.roi_percent.is_finite() || f.roi_percent <= 0.0 {
                Some(format!("ROI must be positive, got {}%", f.roi_percent))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::ROI_IMPLAUSIBLE,
        severity: Severity::Error,
        check: |f, _| {
            if f.roi_percent.is_finite() && f.roi_percent >= 100.0 {
                Some(format!(
                    "ROI {}% implies a sub-year payback, which points at bad inputs",
                    f.roi_percent
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::PAYBACK_NONFINITE,
        severity: Severity::Error,
        check: |f, _| {
            if !f.payback_years.is_finite() || f.payback_years <= 0.0 {
                Some(format!(
                    "payback must be a positive finite number of years, got {}",
                    f.payback_years
                ))
            } else {
                None
            }
        },
    },
    Rule {
        code: codes::PAYBACK_EXCEEDS_HORIZON,
        severity: Severity::Warn,
        check: |f, policy| {
            if f.payback_years.is_finite() && f.payback_years > policy.payback_horizon_years {
                Some(format!(
                    "payback {} years exceeds the {}-year horizon",
                    f.payback_years, policy.payback_horizon_years
                ))
            } else {
                None
            }
        },
    },
];

/// Run a load profile through the full profile rule table.
pub fn validate_profile(profile: &LoadProfile, policy: &ValidationPolicy) -> Vec<Issue> {
    evaluate(PROFILE_RULES, profile, policy)
}

/// Run a financial result through the full financial rule table.
pub fn validate_financial(result: &FinancialResult, policy: &ValidationPolicy) -> Vec<Issue> {
    evaluate(FINANCIAL_RULES, result, policy)
}
