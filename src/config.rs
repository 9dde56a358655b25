use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::{
    ConfidenceLevel, FinancialPolicy, GridDurationAdders, SizingPolicy, TariffInputs,
};
use crate::validation::ValidationPolicy;

/// Full engine configuration. Defaults are compiled in; `config/default.toml`
/// and `BQE__`-prefixed environment variables override them in that order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pricing: PricingConfig,
    pub validation: ValidationPolicy,
    pub sizing: SizingConfig,
    pub financial: FinancialPolicy,
    /// Tariff used when a caller supplies none of its own.
    pub tariff: TariffInputs,
    pub harness: HarnessConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingSourceKind {
    #[default]
    Builtin,
    TomlFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub source: PricingSourceKind,
    /// Tier file, required when `source = "toml_file"`.
    pub path: Option<PathBuf>,
    pub default_confidence: ConfidenceLevel,
    /// Systems at or above this power are quoted in MW.
    pub crossover_mw: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            source: PricingSourceKind::Builtin,
            path: None,
            default_confidence: ConfidenceLevel::Mid,
            crossover_mw: 50.0,
        }
    }
}

/// Per-industry sizing ratio/duration pairs, overridable per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingOverride {
    pub power_ratio: f64,
    pub duration_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub grid_adders: GridDurationAdders,
    pub industries: BTreeMap<String, SizingOverride>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        let mut industries = BTreeMap::new();
        industries.insert(
            "car_wash".to_string(),
            SizingOverride {
                power_ratio: 0.6,
                duration_hours: 2.0,
            },
        );
        industries.insert(
            "hotel".to_string(),
            SizingOverride {
                power_ratio: 0.5,
                duration_hours: 4.0,
            },
        );
        industries.insert(
            "data_center".to_string(),
            SizingOverride {
                power_ratio: 0.8,
                duration_hours: 4.0,
            },
        );
        industries.insert(
            "hospital".to_string(),
            SizingOverride {
                power_ratio: 0.7,
                duration_hours: 6.0,
            },
        );
        industries.insert(
            "ev_charging".to_string(),
            SizingOverride {
                power_ratio: 0.8,
                duration_hours: 2.0,
            },
        );
        industries.insert(
            "retail".to_string(),
            SizingOverride {
                power_ratio: 0.5,
                duration_hours: 2.0,
            },
        );
        Self {
            grid_adders: GridDurationAdders::default(),
            industries,
        }
    }
}

impl SizingConfig {
    /// Resolve the sizing policy for an industry slug, falling back to the
    /// generic ratio/duration pair for industries without an override.
    pub fn policy_for(&self, slug: &str) -> SizingPolicy {
        let base = SizingPolicy {
            grid_adders: self.grid_adders,
            ..SizingPolicy::default()
        };
        match self.industries.get(slug) {
            Some(o) => SizingPolicy {
                power_ratio: o.power_ratio,
                duration_hours: o.duration_hours,
                grid_adders: self.grid_adders,
            },
            None => base,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Evaluate fixtures concurrently.
    pub parallel: bool,
    /// Optional YAML fixture file replacing the builtin set.
    pub fixtures_path: Option<PathBuf>,
    /// Random well-formed profiles pushed through the validator per run.
    pub fuzz_samples: usize,
    pub fuzz_seed: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            fixtures_path: None,
            fuzz_samples: 250,
            fuzz_seed: 7,
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("BQE__").split("__"));
        Ok(figment.extract()?)
    }
}
