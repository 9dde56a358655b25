use std::collections::BTreeMap;

use super::{apply_peak_override, capacity_factor, integrate_energy, Computation, IndustryId, LoadCalculator};
use crate::calculators::CalculatorError;
use crate::domain::{AnswerReader, FacilityAnswers, FieldSpec, LoadProfile, UniversalInputs};

const ROOM_COUNT: FieldSpec =
    FieldSpec::new("roomCount", 120.0, "rooms").aliases(&["room_count", "rooms"]);
const OCCUPANCY: FieldSpec = FieldSpec::new("occupancyRate", 0.70, "fraction")
    .aliases(&["occupancy_rate", "occupancy"])
    .bounded(0.0, 1.0);

/// Load model for full-service hotels. Rooms and central HVAC dominate; the
/// profile is flat compared to daytime businesses because guests are on site
/// around the clock.
pub struct HotelCalculator;

impl LoadCalculator for HotelCalculator {
    fn industry(&self) -> IndustryId {
        IndustryId::Hotel
    }

    fn compute(&self, answers: &FacilityAnswers) -> Result<Computation, CalculatorError> {
        let mut reader = AnswerReader::new(answers);
        let universal = UniversalInputs::read(&mut reader, 24.0, 80_000.0);

        let rooms = reader.count(&ROOM_COUNT)?;
        let occupancy = reader.number(&OCCUPANCY);
        let has_pool = reader.flag("hasPool", false);

        let mut contributors = BTreeMap::new();
        contributors.insert("guest_rooms".to_string(), rooms * 0.6 * occupancy);
        contributors.insert(
            "hvac_central".to_string(),
            universal.facility_size_sqft * 0.0025,
        );
        contributors.insert("kitchen_laundry".to_string(), rooms * 0.25);
        contributors.insert(
            "common_lighting".to_string(),
            universal.facility_size_sqft * 0.001,
        );
        // One elevator bank per 100 rooms.
        contributors.insert("elevators".to_string(), (rooms / 100.0).ceil() * 10.0);
        if has_pool {
            contributors.insert("pool_spa".to_string(), 30.0);
        }

        let peak_kw: f64 = contributors.values().sum();
        let base_kw = peak_kw * 0.45;
        let energy = integrate_energy(base_kw, peak_kw, universal.operating_hours, 0.5);
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
