use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::calculators::{CalculatorRegistry, IndustryId, RegistryError};
use crate::domain::issue::{codes, Issue};
use crate::domain::FacilityAnswers;

/// Expected trend of peak and energy as the swept field grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// One physical-plausibility sweep: vary a single field across ordered values
/// with everything else pinned to the baseline, and require the profile to
/// move the right way. Runs offline in the harness and the test suite, never
/// against a live quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonotonicitySweep {
    pub industry: IndustryId,
    pub field: String,
    pub values: Vec<f64>,
    pub direction: Direction,
    #[serde(default)]
    pub baseline: FacilityAnswers,
}

impl MonotonicitySweep {
    pub fn increasing(industry: IndustryId, field: &str, values: &[f64]) -> Self {
        Self {
            industry,
            field: field.to_string(),
            values: values.to_vec(),
            direction: Direction::Increasing,
            baseline: FacilityAnswers::new(),
        }
    }
}

/// The stock sweeps the harness runs: one size-driving field per industry.
pub fn default_sweeps() -> Vec<MonotonicitySweep> {
    vec![
        MonotonicitySweep::increasing(IndustryId::CarWash, "cars_per_day_avg", &[120.0, 250.0, 450.0]),
        MonotonicitySweep::increasing(IndustryId::Hotel, "roomCount", &[80.0, 160.0, 320.0]),
        MonotonicitySweep::increasing(IndustryId::DataCenter, "it_load_kw", &[250.0, 500.0, 1000.0]),
        MonotonicitySweep::increasing(IndustryId::Hospital, "bedCount", &[100.0, 200.0, 400.0]),
        MonotonicitySweep::increasing(IndustryId::EvCharging, "dcFastChargers", &[4.0, 8.0, 16.0]),
        MonotonicitySweep::increasing(IndustryId::Retail, "facilitySize", &[10_000.0, 25_000.0, 60_000.0]),
    ]
}

/// Evaluate one sweep. Calculator failures bubble up; trend breaks come back
/// as issues with enough context to reproduce the offending pair.
pub fn run_sweep(
    registry: &CalculatorRegistry,
    sweep: &MonotonicitySweep,
) -> Result<Vec<Issue>, RegistryError> {
    let mut points = Vec::with_capacity(sweep.values.len());
    for value in &sweep.values {
        let mut answers = sweep.baseline.clone();
        answers.insert(&sweep.field, *value);
        let computation = registry.compute(sweep.industry, &answers)?;
        points.push((
            *value,
            computation.profile.peak_load_kw,
            computation.profile.energy_kwh_per_day,
        ));
    }

    let mut issues = Vec::new();
    for ((from_value, from_peak, from_energy), (to_value, to_peak, to_energy)) in
        points.iter().copied().tuple_windows()
    {
        for (metric, from, to) in [
            ("peakLoadKW", from_peak, to_peak),
            ("energyKWhPerDay", from_energy, to_energy),
        ] {
            // Absolute-plus-relative slack for float noise only.
            let tolerance = 1e-9 * from.abs().max(1.0);
            let broken = match sweep.direction {
                Direction::Increasing => to < from - tolerance,
                Direction::Decreasing => to > from + tolerance,
            };
            if broken {
                issues.push(
                    Issue::error(
                        codes::MONOTONICITY_VIOLATION,
                        format!(
                            "{} {}: {} moved {} -> {} as {} went {} -> {}",
                            sweep.industry,
                            sweep.field,
                            metric,
                            from,
                            to,
                            sweep.field,
                            from_value,
                            to_value
                        ),
                    )
                    .with_context("industry", sweep.industry.to_string())
                    .with_context("field", sweep.field.as_str())
                    .with_context("metric", metric)
                    .with_context("from_value", from_value)
                    .with_context("to_value", to_value)
                    .with_context("from", from)
                    .with_context("to", to),
                );
            }
        }
    }
    Ok(issues)
}

/// Run every sweep, collecting all violations.
pub fn run_all(
    registry: &CalculatorRegistry,
    sweeps: &[MonotonicitySweep],
) -> Result<Vec<Issue>, RegistryError> {
    let mut issues = Vec::new();
    for sweep in sweeps {
        issues.extend(run_sweep(registry, sweep)?);
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sweeps_hold_for_default_calculators() {
        let registry = CalculatorRegistry::with_defaults();
        let issues = run_all(&registry, &default_sweeps()).unwrap();
        assert!(issues.is_empty(), "violations: {issues:?}");
    }

    #[test]
    fn test_a_real_trend_break_is_reported() {
        // Longer hours spread the same vehicle volume thinner, so car wash
        // peak falls as hours rise. Declaring it increasing must fail.
        let registry = CalculatorRegistry::with_defaults();
        let sweep = MonotonicitySweep::increasing(
            IndustryId::CarWash,
            "operatingHours",
            &[8.0, 12.0, 16.0],
        );
        let issues = run_sweep(&registry, &sweep).unwrap();
        assert!(!issues.is_empty());
        let issue = &issues[0];
        assert_eq!(issue.code, codes::MONOTONICITY_VIOLATION);
        let context = issue.context.as_ref().unwrap();
        assert_eq!(context["field"], "operatingHours");
        assert!(context.contains_key("metric"));
        assert!(context.contains_key("from_value"));
    }

    #[test]
    fn test_flat_response_satisfies_monotonicity() {
        // Retail ignores unknown fields, so the profile is flat across the
        // sweep; equal values are within tolerance.
        let registry = CalculatorRegistry::with_defaults();
        let sweep =
            MonotonicitySweep::increasing(IndustryId::Retail, "unrelatedField", &[1.0, 2.0, 3.0]);
        assert!(run_sweep(&registry, &sweep).unwrap().is_empty());
    }

    #[test]
    fn test_baseline_is_held_fixed() {
        let registry = CalculatorRegistry::with_defaults();
        let mut sweep = MonotonicitySweep::increasing(
            IndustryId::Hotel,
            "roomCount",
            &[80.0, 160.0, 320.0],
        );
        sweep.baseline = FacilityAnswers::new().set("hasPool", true).set("occupancyRate", 0.9);
        assert!(run_sweep(&registry, &sweep).unwrap().is_empty());
    }

    #[test]
    fn test_sweep_on_missing_calculator_propagates_the_error() {
        let registry = CalculatorRegistry::new();
        let sweep =
            MonotonicitySweep::increasing(IndustryId::Hotel, "roomCount", &[80.0, 160.0]);
        assert!(run_sweep(&registry, &sweep).is_err());
    }
}
