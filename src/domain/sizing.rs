use serde::{Deserialize, Serialize};

use super::answers::GridConnection;
use super::profile::LoadProfile;

/// Recommended battery system size derived from a validated load profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSizing {
    /// Inverter power rating in kW.
    #[serde(rename = "powerKW")]
    pub power_kw: f64,
    /// Usable storage capacity in kWh.
    #[serde(rename = "energyKWh")]
    pub energy_kwh: f64,
    /// Discharge duration at rated power, in hours.
    #[serde(rename = "durationHours")]
    pub duration_hours: f64,
}

/// Extra discharge hours required per grid-connection quality. Sites that
/// cannot lean on the utility carry more storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridDurationAdders {
    pub unreliable: f64,
    pub limited: f64,
    pub off_grid: f64,
    pub microgrid: f64,
}

impl Default for GridDurationAdders {
    fn default() -> Self {
        Self {
            unreliable: 2.0,
            limited: 1.0,
            off_grid: 4.0,
            microgrid: 1.0,
        }
    }
}

impl GridDurationAdders {
    pub fn for_connection(&self, grid: GridConnection) -> f64 {
        match grid {
            GridConnection::Reliable => 0.0,
            GridConnection::Unreliable => self.unreliable,
            GridConnection::Limited => self.limited,
            GridConnection::OffGrid => self.off_grid,
            GridConnection::Microgrid => self.microgrid,
        }
    }
}

/// Per-industry sizing knobs. Values live in configuration, not code, so a
/// deployment can retune ratios without a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingPolicy {
    /// Fraction of facility peak the battery should cover.
    pub power_ratio: f64,
    /// Baseline discharge duration in hours, before grid adders.
    pub duration_hours: f64,
    #[serde(skip)]
    pub grid_adders: GridDurationAdders,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            power_ratio: 0.5,
            duration_hours: 4.0,
            grid_adders: GridDurationAdders::default(),
        }
    }
}

/// Size the system: power from the peak and the coverage ratio, duration from
/// the industry baseline plus the grid-connection adder, energy as the product.
pub fn derive_sizing(
    profile: &LoadProfile,
    policy: &SizingPolicy,
    grid: GridConnection,
) -> EquipmentSizing {
    let power_kw = profile.peak_load_kw * policy.power_ratio;
    let duration_hours = policy.duration_hours + policy.grid_adders.for_connection(grid);
    EquipmentSizing {
        power_kw,
        energy_kwh: power_kw * duration_hours,
        duration_hours,
    }
}
