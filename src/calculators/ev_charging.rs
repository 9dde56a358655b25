use std::collections::BTreeMap;

use super::{apply_peak_override, capacity_factor, integrate_energy, Computation, IndustryId, LoadCalculator};
use crate::calculators::CalculatorError;
use crate::domain::{AnswerReader, FacilityAnswers, FieldSpec, LoadProfile, UniversalInputs};

const DC_FAST_COUNT: FieldSpec = FieldSpec::new("dcFastChargers", 8.0, "chargers")
    .aliases(&["dcfc_count", "dc_fast_chargers"]);
const LEVEL2_COUNT: FieldSpec =
    FieldSpec::new("level2Chargers", 4.0, "chargers").aliases(&["level2_chargers", "l2_count"]);
const DC_FAST_POWER: FieldSpec = FieldSpec::new("dcFastPowerKW", 150.0, "kW")
    .aliases(&["dcfc_power_kw"])
    .min(0.0);
const LEVEL2_POWER: FieldSpec = FieldSpec::new("level2PowerKW", 11.0, "kW")
    .aliases(&["level2_power_kw"])
    .min(0.0);
const CONCURRENCY: FieldSpec = FieldSpec::new("concurrencyFactor", 0.70, "fraction")
    .aliases(&["concurrency"])
    .bounded(0.0, 1.0);

/// Load model for EV charging hubs. Peak is nameplate charger power derated by
/// the concurrency factor; energy reflects that plugs sit idle for much of the
/// day even at busy sites.
pub struct EvChargingCalculator;

impl LoadCalculator for EvChargingCalculator {
    fn industry(&self) -> IndustryId {
        IndustryId::EvCharging
    }

    fn compute(&self, answers: &FacilityAnswers) -> Result<Computation, CalculatorError> {
        let mut reader = AnswerReader::new(answers);
        let universal = UniversalInputs::read(&mut reader, 24.0, 2_000.0);

        let dc_fast = reader.count(&DC_FAST_COUNT)?;
        let level2 = reader.count(&LEVEL2_COUNT)?;
        let dc_fast_kw = reader.number(&DC_FAST_POWER);
        let level2_kw = reader.number(&LEVEL2_POWER);
        let concurrency = reader.number(&CONCURRENCY);

        let mut contributors = BTreeMap::new();
        contributors.insert(
            "dc_fast_chargers".to_string(),
            dc_fast * dc_fast_kw * concurrency,
        );
        contributors.insert(
            "level2_chargers".to_string(),
            level2 * level2_kw * concurrency,
        );
        // Canopy lighting, payment kiosks, network gear.
        contributors.insert("site_auxiliary".to_string(), 5.0 + 0.3 * (dc_fast + level2));

        let peak_kw: f64 = contributors.values().sum();
        let auxiliary = contributors["site_auxiliary"];
        // Only the auxiliary gear and trickle sessions run continuously.
        let base_kw = auxiliary + 0.05 * (peak_kw - auxiliary);
        let energy = integrate_energy(base_kw, peak_kw, universal.operating_hours, 0.35);
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
