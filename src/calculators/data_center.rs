use std::collections::BTreeMap;

use super::{apply_peak_override, capacity_factor, integrate_energy, Computation, IndustryId, LoadCalculator};
use crate::calculators::CalculatorError;
use crate::domain::{AnswerReader, FacilityAnswers, FieldSpec, LoadProfile, UniversalInputs};

const IT_LOAD: FieldSpec = FieldSpec::new("it_load_kw", 500.0, "kW")
    .aliases(&["itLoadKW", "it_load", "criticalLoadKW"])
    .min(0.0);
const PUE: FieldSpec = FieldSpec::new("pue", 1.5, "ratio").bounded(1.0, 3.0);
const UTILIZATION: FieldSpec = FieldSpec::new("utilization", 0.80, "fraction")
    .aliases(&["serverUtilization"])
    .bounded(0.0, 1.0);

/// Load model for data centers. Everything hangs off the critical IT load and
/// the PUE overhead ratio, split into cooling, distribution losses, and
/// lighting. The profile is nearly flat.
pub struct DataCenterCalculator;

impl LoadCalculator for DataCenterCalculator {
    fn industry(&self) -> IndustryId {
        IndustryId::DataCenter
    }

    fn compute(&self, answers: &FacilityAnswers) -> Result<Computation, CalculatorError> {
        let mut reader = AnswerReader::new(answers);
        let universal = UniversalInputs::read(&mut reader, 24.0, 20_000.0);

        let it_load = reader.number(&IT_LOAD);
        let pue = reader.number(&PUE);
        let utilization = reader.number(&UTILIZATION);

        // Overhead above the IT load splits 70/20/10 across cooling, power
        // distribution, and lighting, so contributors sum to pue * it_load.
        let overhead = (pue - 1.0) * it_load;
        let mut contributors = BTreeMap::new();
        contributors.insert("it_load".to_string(), it_load);
        contributors.insert("cooling".to_string(), overhead * 0.7);
        contributors.insert("power_distribution".to_string(), overhead * 0.2);
        contributors.insert("lighting_aux".to_string(), overhead * 0.1);

        let peak_kw: f64 = contributors.values().sum();
        let base_kw = peak_kw * 0.85;
        let energy = integrate_energy(base_kw, peak_kw, universal.operating_hours, utilization);
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
