use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::answers::{AnswerValue, InputAudit, InputFallback};
use super::profile::LoadProfile;

/// Questionnaire template lineage carried on every trace. Bump the version
/// whenever a serialized trace field is renamed.
pub const TEMPLATE_VERSION: &str = "7.0";

/// Which half of the pipeline a trace describes. Layer A is the load-profile
/// computation; layer B is sizing and financials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceLayer {
    A,
    B,
}

/// Identifies the template and calculator a trace came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub industry: String,
    pub version: String,
    #[serde(rename = "calculatorId")]
    pub calculator_id: String,
}

impl TemplateMeta {
    pub fn new(industry: impl Into<String>, calculator_id: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
            version: TEMPLATE_VERSION.to_string(),
            calculator_id: calculator_id.into(),
        }
    }
}

/// Layer B sizing inputs recorded for replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingHints {
    #[serde(rename = "powerRatio")]
    pub power_ratio: f64,
    #[serde(rename = "durationHours")]
    pub duration_hours: f64,
    /// Extra hours added for the site's grid connection.
    #[serde(rename = "gridAdjustmentHours")]
    pub grid_adjustment_hours: f64,
}

/// One forensic record per pipeline layer: enough to reproduce the computation
/// and explain every substituted input. Serialized field names are a stable
/// contract with downstream tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteTrace {
    #[serde(rename = "quoteId")]
    pub quote_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub layer: TraceLayer,
    pub template: TemplateMeta,
    #[serde(rename = "inputsUsed")]
    pub inputs_used: BTreeMap<String, AnswerValue>,
    #[serde(rename = "missingInputs")]
    pub missing_inputs: Vec<String>,
    #[serde(rename = "inputFallbacks")]
    pub input_fallbacks: BTreeMap<String, InputFallback>,
    pub assumptions: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<LoadProfile>,
    /// Hex digest of the profile, for cheap cross-run comparison.
    #[serde(rename = "profileHash", skip_serializing_if = "Option::is_none")]
    pub profile_hash: Option<String>,
    #[serde(rename = "sizingHints", skip_serializing_if = "Option::is_none")]
    pub sizing_hints: Option<SizingHints>,
}

impl QuoteTrace {
    /// Build the layer A record from a calculator's audit and profile. The
    /// trace mirrors the profile's own assumptions and warnings at the top
    /// level so tooling can read them without digging into the profile.
    pub fn layer_a(
        quote_id: Uuid,
        template: TemplateMeta,
        audit: InputAudit,
        profile: &LoadProfile,
    ) -> Self {
        Self {
            quote_id,
            timestamp: Utc::now(),
            layer: TraceLayer::A,
            template,
            inputs_used: audit.inputs_used,
            missing_inputs: audit.missing_inputs,
            input_fallbacks: audit.fallbacks,
            assumptions: profile.assumptions.clone(),
            warnings: profile.warnings.clone(),
            profile: Some(profile.clone()),
            profile_hash: Some(format!("{:016x}", profile.content_hash())),
            sizing_hints: None,
        }
    }

    /// Build the layer B record from the sizing hints and the tariff figures
    /// actually used.
    pub fn layer_b(
        quote_id: Uuid,
        template: TemplateMeta,
        hints: SizingHints,
        inputs_used: BTreeMap<String, AnswerValue>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            quote_id,
            timestamp: Utc::now(),
            layer: TraceLayer::B,
            template,
            inputs_used,
            missing_inputs: Vec::new(),
            input_fallbacks: BTreeMap::new(),
            assumptions: Vec::new(),
            warnings,
            profile: None,
            profile_hash: None,
            sizing_hints: Some(hints),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> LoadProfile {
        let mut contributors = BTreeMap::new();
        contributors.insert("load".to_string(), 80.0);
        LoadProfile {
            base_load_kw: 20.0,
            peak_load_kw: 80.0,
            energy_kwh_per_day: 600.0,
            duty_cycle: Some(0.45),
            kw_contributors: contributors,
            assumptions: vec!["bayCount not provided; assuming 4 bays".to_string()],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_layer_a_trace_carries_profile_and_hash() {
        let profile = sample_profile();
        let trace = QuoteTrace::layer_a(
            Uuid::new_v4(),
            TemplateMeta::new("car_wash", "car_wash_v7"),
            InputAudit::default(),
            &profile,
        );
        assert_eq!(trace.layer, TraceLayer::A);
        assert_eq!(trace.template.version, TEMPLATE_VERSION);
        assert_eq!(trace.profile.as_ref(), Some(&profile));
        // The top-level notes mirror what the profile carries.
        assert_eq!(trace.assumptions, profile.assumptions);
        assert_eq!(
            trace.profile_hash.as_deref(),
            Some(format!("{:016x}", profile.content_hash()).as_str())
        );
        assert!(trace.sizing_hints.is_none());
    }

    #[test]
    fn test_layer_b_trace_has_hints_not_profile() {
        let trace = QuoteTrace::layer_b(
            Uuid::new_v4(),
            TemplateMeta::new("hotel", "hotel_v7"),
            SizingHints {
                power_ratio: 0.5,
                duration_hours: 4.0,
                grid_adjustment_hours: 0.0,
            },
            BTreeMap::new(),
            Vec::new(),
        );
        assert_eq!(trace.layer, TraceLayer::B);
        assert!(trace.profile.is_none());
        assert!(trace.sizing_hints.is_some());
    }

    #[test]
    fn test_contract_field_names() {
        let trace = QuoteTrace::layer_a(
            Uuid::new_v4(),
            TemplateMeta::new("retail", "retail_v7"),
            InputAudit::default(),
            &sample_profile(),
        );
        let json = serde_json::to_value(&trace).unwrap();
        assert!(json.get("inputsUsed").is_some());
        assert!(json.get("missingInputs").is_some());
        assert!(json.get("inputFallbacks").is_some());
        assert!(json.get("profileHash").is_some());
        assert_eq!(json["layer"], "A");
        assert_eq!(json["template"]["version"], "7.0");
        assert!(json["template"].get("calculatorId").is_some());
        // Layer B only fields stay out of layer A records.
        assert!(json.get("sizingHints").is_none());
    }
}
