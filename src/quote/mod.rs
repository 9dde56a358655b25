use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::calculators::{CalculatorRegistry, IndustryId, RegistryError};
use crate::config::{EngineConfig, PricingSourceKind};
use crate::domain::issue::has_errors;
use crate::domain::{
    derive_sizing, preferred_size_unit, AnswerValue, ConfidenceLevel, EquipmentSizing,
    FacilityAnswers, FinancialPolicy, FinancialResult, Issue, LoadProfile, QuoteTrace, SizeUnit,
    SizingHints, TariffInputs, TemplateMeta,
};
use crate::pricing::{
    PricingConfigSource, PricingError, PricingSnapshot, PricingTable, SizeQuery,
    StaticCatalogSource, TomlFileSource,
};
use crate::validation::{validate_financial, validate_profile};

/// Configuration-level failures. Bad facility data never lands here; it comes
/// back as a rejected [`QuoteOutcome`] instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("invalid tariff inputs: {0}")]
    Tariff(#[from] validator::ValidationErrors),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Validated,
    Rejected,
}

/// Everything a quote run produces. On rejection the partial artifacts stay
/// attached so a reviewer can see exactly what failed and why.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteOutcome {
    #[serde(rename = "quoteId")]
    pub quote_id: Uuid,
    pub industry: IndustryId,
    pub status: QuoteStatus,
    pub profile: Option<LoadProfile>,
    pub sizing: Option<EquipmentSizing>,
    pub financial: Option<FinancialResult>,
    /// Unit the system size should be displayed in, once sizing exists.
    #[serde(rename = "sizeUnit")]
    pub size_unit: Option<SizeUnit>,
    pub issues: Vec<Issue>,
    pub traces: Vec<QuoteTrace>,
}

impl QuoteOutcome {
    pub fn is_validated(&self) -> bool {
        self.status == QuoteStatus::Validated
    }
}

/// Price a sized system and fold in the tariff. The only stage that touches
/// the tier resolver, keeping load modelling and pricing strictly separated.
pub fn derive_financials(
    sizing: &EquipmentSizing,
    table: &PricingTable,
    tariff: &TariffInputs,
    policy: &FinancialPolicy,
    level: ConfidenceLevel,
) -> Result<FinancialResult, PricingError> {
    let bess = table.resolve("bess", SizeQuery::PowerKw(sizing.power_kw), level)?;
    let bos = table.resolve("bos", SizeQuery::PowerKw(sizing.power_kw), level)?;
    debug!(
        power_kw = sizing.power_kw,
        bess_unit_price = bess.unit_price,
        bess_source = %bess.data_source,
        bos_unit_price = bos.unit_price,
        bos_source = %bos.data_source,
        "tier prices resolved"
    );

    let capex_usd = sizing.energy_kwh * bess.unit_price + sizing.power_kw * bos.unit_price;

    let demand_savings = sizing.power_kw
        * tariff.demand_charge_usd_per_kw_month
        * 12.0
        * policy.shave_effectiveness;
    let arbitrage = sizing.energy_kwh
        * tariff.cycles_per_day
        * 365.0
        * tariff.rate_spread()
        * policy.round_trip_efficiency;
    let annual_savings_usd = demand_savings + arbitrage;

    let (payback_years, roi_percent) = if annual_savings_usd > 0.0 && capex_usd > 0.0 {
        let payback = capex_usd / annual_savings_usd;
        (payback, 100.0 / payback)
    } else {
        (f64::INFINITY, 0.0)
    };

    Ok(FinancialResult {
        capex_usd,
        annual_savings_usd,
        payback_years,
        roi_percent,
    })
}

/// The quoting pipeline: answers through calculator, validator, sizing, and
/// financials, with a forensic trace per layer. Progression is strict; a
/// rejected stage ends the run with everything collected so far.
pub struct QuoteEngine {
    registry: CalculatorRegistry,
    pricing: Arc<PricingSnapshot>,
    config: EngineConfig,
}

impl QuoteEngine {
    pub fn new(
        registry: CalculatorRegistry,
        pricing: Arc<PricingSnapshot>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            pricing,
            config,
        }
    }

    /// Build the engine from configuration: default registry plus the
    /// configured pricing source, loaded and validated up front.
    pub async fn from_config(config: EngineConfig) -> anyhow::Result<Self> {
        let source: Box<dyn PricingConfigSource> = match config.pricing.source {
            PricingSourceKind::Builtin => Box::new(StaticCatalogSource),
            PricingSourceKind::TomlFile => {
                let path = config
                    .pricing
                    .path
                    .clone()
                    .context("pricing.path is required when pricing.source = \"toml_file\"")?;
                Box::new(TomlFileSource::new(path))
            }
        };
        let snapshot = PricingSnapshot::from_source(source.as_ref()).await?;
        Ok(Self::new(
            CalculatorRegistry::with_defaults(),
            Arc::new(snapshot),
            config,
        ))
    }

    pub fn registry(&self) -> &CalculatorRegistry {
        &self.registry
    }

    pub fn pricing(&self) -> &PricingSnapshot {
        &self.pricing
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn default_tariff(&self) -> TariffInputs {
        self.config.tariff
    }

    /// Run the full pipeline for one facility.
    pub fn quote(
        &self,
        industry_slug: &str,
        answers: &FacilityAnswers,
        tariff: &TariffInputs,
    ) -> Result<QuoteOutcome, EngineError> {
        let industry = IndustryId::resolve(industry_slug)?;
        tariff.validate()?;

        let quote_id = Uuid::new_v4();
        let calculator = self.registry.get(industry)?;
        let computation = calculator
            .compute(answers)
            .map_err(RegistryError::from)?;
        let template = TemplateMeta::new(industry.to_string(), calculator.calculator_id());

        let trace_a = QuoteTrace::layer_a(
            quote_id,
            template.clone(),
            computation.audit,
            &computation.profile,
        );

        let mut issues = validate_profile(&computation.profile, &self.config.validation);
        if has_errors(&issues) {
            warn!(
                industry = %industry,
                errors = issues.iter().filter(|i| i.is_error()).count(),
                "load profile rejected"
            );
            return Ok(QuoteOutcome {
                quote_id,
                industry,
                status: QuoteStatus::Rejected,
                profile: Some(computation.profile),
                sizing: None,
                financial: None,
                size_unit: None,
                issues,
                traces: vec![trace_a],
            });
        }

        let policy = self.config.sizing.policy_for(&industry.to_string());
        let grid = computation.universal.grid_connection;
        let sizing = derive_sizing(&computation.profile, &policy, grid);
        let hints = SizingHints {
            power_ratio: policy.power_ratio,
            duration_hours: sizing.duration_hours,
            grid_adjustment_hours: policy.grid_adders.for_connection(grid),
        };

        let level = self.config.pricing.default_confidence;
        let table = self.pricing.current();
        let financial =
            derive_financials(&sizing, &table, tariff, &self.config.financial, level)?;

        let mut layer_b_inputs = BTreeMap::new();
        layer_b_inputs.insert(
            "demandChargeUSDPerKWMonth".to_string(),
            AnswerValue::Number(tariff.demand_charge_usd_per_kw_month),
        );
        layer_b_inputs.insert(
            "peakRateUSDPerKWh".to_string(),
            AnswerValue::Number(tariff.peak_rate_usd_per_kwh),
        );
        layer_b_inputs.insert(
            "offpeakRateUSDPerKWh".to_string(),
            AnswerValue::Number(tariff.offpeak_rate_usd_per_kwh),
        );
        layer_b_inputs.insert(
            "cyclesPerDay".to_string(),
            AnswerValue::Number(tariff.cycles_per_day),
        );
        layer_b_inputs.insert(
            "confidence".to_string(),
            AnswerValue::Text(level.to_string()),
        );
        let trace_b = QuoteTrace::layer_b(quote_id, template, hints, layer_b_inputs, Vec::new());

        issues.extend(validate_financial(&financial, &self.config.validation));
        let status = if has_errors(&issues) {
            QuoteStatus::Rejected
        } else {
            QuoteStatus::Validated
        };

        info!(
            industry = %industry,
            status = ?status,
            peak_kw = computation.profile.peak_load_kw,
            power_kw = sizing.power_kw,
            capex_usd = financial.capex_usd,
            "quote complete"
        );

        Ok(QuoteOutcome {
            quote_id,
            industry,
            status,
            profile: Some(computation.profile),
            size_unit: Some(preferred_size_unit(
                sizing.power_kw,
                self.config.pricing.crossover_mw,
            )),
            sizing: Some(sizing),
            financial: Some(financial),
            issues,
            traces: vec![trace_a, trace_b],
        })
    }
}
