pub mod car_wash;
pub mod data_center;
pub mod ev_charging;
pub mod hospital;
pub mod hotel;
pub mod retail;

pub use car_wash::CarWashCalculator;
pub use data_center::DataCenterCalculator;
pub use ev_charging::EvChargingCalculator;
pub use hospital::HospitalCalculator;
pub use hotel::HotelCalculator;
pub use retail::RetailCalculator;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::domain::{
    AnswerError, AnswerReader, FacilityAnswers, InputAudit, LoadProfile, UniversalInputs,
};

/// Closed set of supported industries. The slug is the strum snake_case
/// rendering; everything else goes through the alias table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndustryId {
    CarWash,
    Hotel,
    DataCenter,
    Hospital,
    EvCharging,
    Retail,
}

/// Spellings seen in the wild mapped onto the closed enum. Lookup is exact
/// match after normalisation; there is deliberately no substring matching, so
/// "car wash and detailing" is unknown rather than silently car_wash.
static INDUSTRY_ALIASES: Lazy<HashMap<&'static str, IndustryId>> = Lazy::new(|| {
    HashMap::from([
        ("carwash", IndustryId::CarWash),
        ("auto_wash", IndustryId::CarWash),
        ("hospitality", IndustryId::Hotel),
        ("motel", IndustryId::Hotel),
        ("resort", IndustryId::Hotel),
        ("datacenter", IndustryId::DataCenter),
        ("data_centre", IndustryId::DataCenter),
        ("colocation", IndustryId::DataCenter),
        ("colo", IndustryId::DataCenter),
        ("healthcare", IndustryId::Hospital),
        ("medical_center", IndustryId::Hospital),
        ("ev", IndustryId::EvCharging),
        ("ev_hub", IndustryId::EvCharging),
        ("ev_station", IndustryId::EvCharging),
        ("charging_station", IndustryId::EvCharging),
        ("grocery", IndustryId::Retail),
        ("supermarket", IndustryId::Retail),
        ("retail_store", IndustryId::Retail),
    ])
});

impl IndustryId {
    /// Resolve a user-supplied slug: normalise case and separators, then try
    /// the canonical slugs and the alias table. Unknown slugs are an error at
    /// lookup time, never a guess.
    pub fn resolve(slug: &str) -> Result<Self, RegistryError> {
        let normalised = slug.trim().to_lowercase().replace(['-', ' '], "_");
        if let Ok(id) = normalised.parse::<IndustryId>() {
            return Ok(id);
        }
        if let Some(id) = INDUSTRY_ALIASES.get(normalised.as_str()) {
            return Ok(*id);
        }
        Err(RegistryError::UnknownIndustry {
            slug: slug.to_string(),
            known: IndustryId::iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown industry '{slug}' (known: {known})")]
    UnknownIndustry { slug: String, known: String },
    #[error("no calculator registered for industry '{0}'")]
    NotRegistered(IndustryId),
    #[error(transparent)]
    Calculator(#[from] CalculatorError),
}

/// Unrecoverable calculator input problems. Everything recoverable is handled
/// inside the calculator as an assumption or warning instead.
#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error(transparent)]
    Input(#[from] AnswerError),
}

/// Everything a calculator produces: the normalized profile, which carries
/// its own assumptions and warnings, plus the universal fields and the input
/// audit for the layer A trace.
#[derive(Debug, Clone)]
pub struct Computation {
    pub profile: LoadProfile,
    pub universal: UniversalInputs,
    pub audit: InputAudit,
}

/// One per industry. Implementations are pure functions of the answers:
/// identical answers must produce a byte-identical profile.
pub trait LoadCalculator: Send + Sync {
    fn industry(&self) -> IndustryId;

    /// Identifier recorded in the trace template.
    fn calculator_id(&self) -> String {
        format!("{}_v7", self.industry())
    }

    fn compute(&self, answers: &FacilityAnswers) -> Result<Computation, CalculatorError>;
}

/// Maps industries to calculators. Lookup of an unregistered industry is an
/// error, mirroring slug resolution.
#[derive(Default)]
pub struct CalculatorRegistry {
    calculators: HashMap<IndustryId, Box<dyn LoadCalculator>>,
}

impl CalculatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every supported industry wired in.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CarWashCalculator));
        registry.register(Box::new(HotelCalculator));
        registry.register(Box::new(DataCenterCalculator));
        registry.register(Box::new(HospitalCalculator));
        registry.register(Box::new(EvChargingCalculator));
        registry.register(Box::new(RetailCalculator));
        registry
    }

    /// Register a calculator under its own industry id. Re-registering an
    /// industry replaces the previous calculator.
    pub fn register(&mut self, calculator: Box<dyn LoadCalculator>) {
        self.calculators.insert(calculator.industry(), calculator);
    }

    pub fn get(&self, industry: IndustryId) -> Result<&dyn LoadCalculator, RegistryError> {
        self.calculators
            .get(&industry)
            .map(|c| c.as_ref())
            .ok_or(RegistryError::NotRegistered(industry))
    }

    /// Resolve and run in one step.
    pub fn compute(
        &self,
        industry: IndustryId,
        answers: &FacilityAnswers,
    ) -> Result<Computation, RegistryError> {
        Ok(self.get(industry)?.compute(answers)?)
    }

    pub fn industries(&self) -> Vec<IndustryId> {
        let mut ids: Vec<IndustryId> = self.calculators.keys().copied().collect();
        ids.sort();
        ids
    }
}

/// Daily energy as base load around the clock plus the activity band during
/// operating hours. With hours clamped to 24 and the activity factor to [0, 1]
/// the result can never exceed 24 h at peak.
pub(crate) fn integrate_energy(
    base_kw: f64,
    peak_kw: f64,
    operating_hours: f64,
    activity_factor: f64,
) -> f64 {
    let hours = operating_hours.clamp(0.0, 24.0);
    let activity = activity_factor.clamp(0.0, 1.0);
    base_kw * 24.0 + (peak_kw - base_kw).max(0.0) * hours * activity
}

/// Duty cycle as the fraction of theoretical 24 h peak throughput actually
/// consumed. Used by the industries without a more specific heuristic.
pub(crate) fn capacity_factor(energy_kwh: f64, peak_kw: f64) -> f64 {
    if peak_kw > 0.0 {
        energy_kwh / (peak_kw * 24.0)
    } else {
        0.0
    }
}

/// When a metered peak from a utility bill is supplied, it wins over the
/// modelled peak: the whole profile is rescaled proportionally so the
/// contributor breakdown keeps summing to the peak.
pub(crate) fn apply_peak_override(
    profile: &mut LoadProfile,
    reader: &mut AnswerReader<'_>,
    override_mw: f64,
) {
    if override_mw <= 0.0 || profile.peak_load_kw <= 0.0 {
        return;
    }
    let target_kw = override_mw * 1000.0;
    let factor = target_kw / profile.peak_load_kw;
    profile.rescale_contributors(factor);
    profile.base_load_kw *= factor;
    profile.energy_kwh_per_day *= factor;
    profile.peak_load_kw = target_kw;
    reader.assume(format!(
        "metered peak {override_mw} MW overrides the modelled peak; profile rescaled by {factor:.3}"
    ));
}
