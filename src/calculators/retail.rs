use std::collections::BTreeMap;

use super::{apply_peak_override, capacity_factor, integrate_energy, Computation, IndustryId, LoadCalculator};
use crate::calculators::CalculatorError;
use crate::domain::{AnswerReader, FacilityAnswers, LoadProfile, UniversalInputs};

/// Load model for retail floors. Purely area-driven; a grocery section adds
/// refrigeration that runs through the night and lifts the base load.
pub struct RetailCalculator;

impl LoadCalculator for RetailCalculator {
    fn industry(&self) -> IndustryId {
        IndustryId::Retail
    }

    fn compute(&self, answers: &FacilityAnswers) -> Result<Computation, CalculatorError> {
        let mut reader = AnswerReader::new(answers);
        let universal = UniversalInputs::read(&mut reader, 14.0, 25_000.0);

        let has_grocery = reader.flag("hasGrocery", false);
        let sqft = universal.facility_size_sqft;

        let mut contributors = BTreeMap::new();
        contributors.insert("hvac".to_string(), sqft * 0.0025);
        contributors.insert("lighting".to_string(), sqft * 0.0015);
        if has_grocery {
            contributors.insert("refrigeration".to_string(), sqft * 0.002);
        }
        contributors.insert("pos_misc".to_string(), sqft * 0.0005);

        let peak_kw: f64 = contributors.values().sum();
        let refrigeration = contributors.get("refrigeration").copied().unwrap_or(0.0);
        // Refrigeration keeps running after close.
        let base_kw = peak_kw * 0.2 + refrigeration * 0.8;
        let energy = integrate_energy(base_kw, peak_kw, universal.operating_hours, 0.9);
        let duty_cycle = capacity_factor(energy, peak_kw);

        let mut profile = LoadProfile {
            base_load_kw: base_kw,
            peak_load_kw: peak_kw,
            energy_kwh_per_day: energy,
            duty_cycle: Some(duty_cycle),
            kw_contributors: contributors,
            assumptions: Vec::new(),
            warnings: Vec::new(),
        };
        apply_peak_override(&mut profile, &mut reader, universal.peak_load_override_mw);

        let (assumptions, warnings, audit) = reader.finish();
        profile.assumptions = assumptions;
        profile.warnings = warnings;
        Ok(Computation {
            profile,
            universal,
            audit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate_profile, ValidationPolicy};

    fn compute(answers: &FacilityAnswers) -> Computation {
        RetailCalculator.compute(answers).unwrap()
    }

    #[test]
    fn test_defaults_produce_a_clean_profile() {
        let profile = compute(&FacilityAnswers::new()).profile;
        assert!((profile.peak_load_kw - 112.5).abs() < 1e-9);
        assert!(validate_profile(&profile, &ValidationPolicy::default()).is_empty());
    }

    #[test]
    fn test_grocery_adds_refrigeration_and_lifts_the_base() {
        let dry = compute(&FacilityAnswers::new()).profile;
        let grocery = compute(&FacilityAnswers::new().set("hasGrocery", true)).profile;
        assert!(!dry.kw_contributors.contains_key("refrigeration"));
        assert!(grocery.kw_contributors.contains_key("refrigeration"));
        assert!(grocery.base_load_kw / grocery.peak_load_kw > dry.base_load_kw / dry.peak_load_kw);
    }

    #[test]
    fn test_larger_floor_means_more_load() {
        let small = compute(&FacilityAnswers::new().set("facilitySize", 10_000)).profile;
        let large = compute(&FacilityAnswers::new().set("facilitySize", 60_000)).profile;
        assert!(large.peak_load_kw > small.peak_load_kw);
        assert!(large.energy_kwh_per_day > small.energy_kwh_per_day);
    }

    #[test]
    fn test_longer_hours_means_more_energy_same_peak() {
        let short = compute(&FacilityAnswers::new().set("operatingHours", 10)).profile;
        let long = compute(&FacilityAnswers::new().set("operatingHours", 18)).profile;
        assert_eq!(short.peak_load_kw, long.peak_load_kw);
        assert!(long.energy_kwh_per_day > short.energy_kwh_per_day);
    }
}
