use std::collections::BTreeMap;

use super::{apply_peak_override, capacity_factor, integrate_energy, Computation, IndustryId, LoadCalculator};
use crate::calculators::CalculatorError;
use crate::domain::{AnswerReader, FacilityAnswers, FieldSpec, LoadProfile, UniversalInputs};

const BED_COUNT: FieldSpec =
    FieldSpec::new("bedCount", 200.0, "beds").aliases(&["bed_count", "beds", "licensedBeds"]);
const IMAGING_SUITES: FieldSpec =
    FieldSpec::new("imagingSuites", 2.0, "suites").aliases(&["imaging_suites"]);
const OPERATING_ROOMS: FieldSpec =
    FieldSpec::new("operatingRooms", 5.0, "rooms").aliases(&["operating_rooms", "orCount"]);

/// Load model for acute-care hospitals. Scale comes from licensed beds and
/// building HVAC; imaging and surgical suites add chunky fixed blocks. Runs
/// around the clock with a high floor.
pub struct HospitalCalculator;

impl LoadCalculator for HospitalCalculator {
    fn industry(&self) -> IndustryId {
        IndustryId::Hospital
    }

    fn compute(&self, answers: &FacilityAnswers) -> Result<Computation, CalculatorError> {
        let mut reader = AnswerReader::new(answers);
        let universal = UniversalInputs::read(&mut reader, 24.0, 150_000.0);

        let beds = reader.count(&BED_COUNT)?;
        let imaging = reader.count(&IMAGING_SUITES)?;
        let operating_rooms = reader.count(&OPERATING_ROOMS)?;

        let mut contributors = BTreeMap::new();
        contributors.insert("patient_care".to_string(), beds * 1.5);
        contributors.insert("hvac".to_string(), universal.facility_size_sqft * 0.004);
        contributors.insert("imaging_suites".to_string(), imaging * 70.0);
        contributors.insert("surgical_suites".to_string(), operating_rooms * 15.0);
        contributors.insert("lab_pharmacy".to_string(), beds * 0.3);
        contributors.insert("kitchen_laundry".to_string(), beds * 0.5);

        let peak_kw: f64 = contributors.values().sum();
        let base_kw = peak_kw * 0.6;
        let energy = integrate_energy(base_kw, peak_kw, universal.operating_hours, 0.55);
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
