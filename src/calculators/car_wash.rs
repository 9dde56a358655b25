use std::collections::BTreeMap;

use super::{apply_peak_override, integrate_energy, Computation, IndustryId, LoadCalculator};
use crate::calculators::CalculatorError;
use crate::domain::{AnswerReader, FacilityAnswers, FieldSpec, LoadProfile, UniversalInputs};

const BAY_COUNT: FieldSpec = FieldSpec::new("bayCount", 4.0, "bays").aliases(&["bay_count", "numBays"]);
const DAILY_VEHICLES: FieldSpec = FieldSpec::new("dailyVehicles", 150.0, "vehicles/day")
    .aliases(&["cars_per_day_avg", "carsPerDay", "daily_vehicles"]);

/// Nominal throughput of one bay, vehicles per hour. Drives the utilization
/// part of the duty cycle.
const VEHICLES_PER_BAY_HOUR: f64 = 12.0;
/// Direct wash energy per vehicle in kWh (pumps, chemicals, rinse).
const KWH_PER_VEHICLE: f64 = 1.2;

/// Load model for conveyor tunnel and in-bay automatic car washes. Peak is
/// dominated by per-bay equipment; throughput terms scale with daily vehicle
/// volume.
pub struct CarWashCalculator;

impl LoadCalculator for CarWashCalculator {
    fn industry(&self) -> IndustryId {
        IndustryId::CarWash
    }

    fn compute(&self, answers: &FacilityAnswers) -> Result<Computation, CalculatorError> {
        let mut reader = AnswerReader::new(answers);
        let universal = UniversalInputs::read(&mut reader, 12.0, 8_000.0);

        let bays = reader.count(&BAY_COUNT)?;
        let vehicles = reader.count(&DAILY_VEHICLES)?;
        let wash_type = reader.choice("washType", &["tunnel", "in_bay"], "tunnel");

        let (equipment_kw_per_bay, dryer_kw_per_bay) = match wash_type.as_str() {
            "in_bay" => (12.0, 8.0),
            _ => (15.0, 10.0),
        };

        let hours = universal.operating_hours;
        let vehicles_per_hour = if hours > 0.0 { vehicles / hours } else { 0.0 };

        let mut contributors = BTreeMap::new();
        contributors.insert("wash_equipment".to_string(), bays * equipment_kw_per_bay);
        contributors.insert("dryers".to_string(), bays * dryer_kw_per_bay);
        // Two vacuum stations per bay at 1.5 kW each.
        contributors.insert("vacuum_stations".to_string(), bays * 3.0);
        contributors.insert(
            "wash_process".to_string(),
            KWH_PER_VEHICLE * vehicles_per_hour,
        );
        contributors.insert("water_heating".to_string(), vehicles * 0.05);
        contributors.insert(
            "lighting_hvac".to_string(),
            universal.facility_size_sqft * 0.003,
        );

        let peak_kw: f64 = contributors.values().sum();
        let base_kw = peak_kw * 0.15;

        let bay_capacity = bays * VEHICLES_PER_BAY_HOUR;
        let utilization = if bay_capacity > 0.0 {
            vehicles_per_hour / bay_capacity
        } else {
            1.0
        };
        let activity = utilization.clamp(0.85, 1.10);

        let energy = integrate_energy(base_kw, peak_kw, hours, activity);
        let duty_cycle = (hours / 24.0) * activity;

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
        CarWashCalculator.compute(answers).unwrap()
    }

    #[test]
    fn test_defaults_produce_a_clean_plausible_profile() {
        let computation = compute(&FacilityAnswers::new());
        let profile = &computation.profile;
        assert!(profile.peak_load_kw > 100.0 && profile.peak_load_kw < 300.0);
        assert!(profile.base_load_kw < profile.peak_load_kw);
        assert!(profile.energy_kwh_per_day <= profile.theoretical_max_energy());
        assert!(validate_profile(profile, &ValidationPolicy::default()).is_empty());
        // Every expected field was defaulted, so each got an assumption.
        assert!(profile.assumptions.len() >= 4);
    }

    #[test]
    fn test_overloaded_single_bay_site() {
        // One bay cannot actually wash 150 vehicles in 10 hours; the duty
        // cycle saturates just above the operating-hours fraction.
        let answers = FacilityAnswers::new()
            .set("bayCount", 1)
            .set("dailyVehicles", 150)
            .set("operatingHours", 10);
        let profile = compute(&answers).profile;
        assert!(profile.peak_load_kw > 0.0);
        let hours_fraction = 10.0 / 24.0;
        assert!((profile.duty_cycle.unwrap() - hours_fraction).abs() < 0.1);
        assert!(validate_profile(&profile, &ValidationPolicy::default()).is_empty());
    }

    #[test]
    fn test_more_vehicles_means_more_load() {
        let low = compute(&FacilityAnswers::new().set("cars_per_day_avg", 120)).profile;
        let high = compute(&FacilityAnswers::new().set("cars_per_day_avg", 450)).profile;
        assert!(high.peak_load_kw > low.peak_load_kw);
        assert!(high.energy_kwh_per_day > low.energy_kwh_per_day);
    }

    #[test]
    fn test_in_bay_draws_less_than_tunnel() {
        let tunnel = compute(&FacilityAnswers::new().set("washType", "tunnel")).profile;
        let in_bay = compute(&FacilityAnswers::new().set("washType", "in_bay")).profile;
        assert!(in_bay.peak_load_kw < tunnel.peak_load_kw);
    }

    #[test]
    fn test_negative_bay_count_is_rejected() {
        let answers = FacilityAnswers::new().set("bayCount", -3);
        assert!(CarWashCalculator.compute(&answers).is_err());
    }

    #[test]
    fn test_unknown_wash_type_falls_back_with_warning() {
        let computation = compute(&FacilityAnswers::new().set("washType", "hand_wash"));
        assert!(computation
            .profile
            .warnings
            .iter()
            .any(|w| w.contains("washType")));
    }
}
