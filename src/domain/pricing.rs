use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Confidence ladder for tiered prices. Every band quotes all five levels;
/// callers pick one and the table guarantees monotone non-decreasing prices
/// along the ladder.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    LowPlus,
    Mid,
    MidPlus,
    High,
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 5] = [
        ConfidenceLevel::Low,
        ConfidenceLevel::LowPlus,
        ConfidenceLevel::Mid,
        ConfidenceLevel::MidPlus,
        ConfidenceLevel::High,
    ];
}

/// Which physical quantity a price category's bands are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SizeAxis {
    /// Bands expressed in kW of power.
    PowerKw,
    /// Bands expressed in MWh of stored energy.
    EnergyMwh,
}

/// Display unit for quoting system size to a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizeUnit {
    Kw,
    Mw,
}

impl std::fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeUnit::Kw => write!(f, "kW"),
            SizeUnit::Mw => write!(f, "MW"),
        }
    }
}

/// Pick the unit a quote should be rendered in: kW for small systems, MW once
/// the power rating crosses the threshold.
pub fn preferred_size_unit(power_kw: f64, crossover_mw: f64) -> SizeUnit {
    if power_kw >= crossover_mw * 1000.0 {
        SizeUnit::Mw
    } else {
        SizeUnit::Kw
    }
}
