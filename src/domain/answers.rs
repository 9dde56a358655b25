use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Scalar or array value carried in a facility questionnaire answer.
///
/// Answers are genuinely schema-less at the edge: the questionnaire layer may
/// send numbers, selects, flags, or arrays for any field name. Calculators
/// coerce their own expected subset via [`AnswerReader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Flag(bool),
    Text(String),
    List(Vec<AnswerValue>),
}

impl AnswerValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AnswerValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            AnswerValue::Number(_) => "number",
            AnswerValue::Flag(_) => "flag",
            AnswerValue::Text(_) => "text",
            AnswerValue::List(_) => "list",
        }
    }
}

impl From<f64> for AnswerValue {
    fn from(n: f64) -> Self {
        AnswerValue::Number(n)
    }
}

impl From<i64> for AnswerValue {
    fn from(n: i64) -> Self {
        AnswerValue::Number(n as f64)
    }
}

impl From<i32> for AnswerValue {
    fn from(n: i32) -> Self {
        AnswerValue::Number(n as f64)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        AnswerValue::Flag(b)
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        AnswerValue::Text(s)
    }
}

/// Open mapping from field name to answer value, keyed per industry template.
///
/// Unknown extra fields are tolerated and ignored; missing expected fields are
/// defaulted by the calculator with an assumption record. BTreeMap keeps
/// iteration deterministic for the forensic trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityAnswers {
    fields: BTreeMap<String, AnswerValue>,
}

impl FacilityAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used heavily by fixtures and tests.
    pub fn set(mut self, field: &str, value: impl Into<AnswerValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<AnswerValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&AnswerValue> {
        self.fields.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Unrecoverable answer problems. Everything else degrades to a default.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("field '{field}' must not be negative (got {value})")]
    NegativeCount { field: String, value: f64 },
}

/// Why a field fell back to a substituted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    Missing,
    Malformed,
    OutOfRange,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Missing => write!(f, "missing"),
            FallbackReason::Malformed => write!(f, "malformed"),
            FallbackReason::OutOfRange => write!(f, "out_of_range"),
        }
    }
}

/// A substituted field value and the reason it was substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFallback {
    pub value: AnswerValue,
    pub reason: FallbackReason,
}

/// Bookkeeping produced while coercing answers: the resolved inputs actually
/// used (after substitution), which expected fields were absent, and every
/// fallback applied. Feeds the forensic trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputAudit {
    pub inputs_used: BTreeMap<String, AnswerValue>,
    pub missing_inputs: Vec<String>,
    pub fallbacks: BTreeMap<String, InputFallback>,
}

/// Declared expectation for one questionnaire field: canonical name, accepted
/// aliases, documented default, display unit, and optional plausible bounds.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub default: f64,
    pub unit: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, default: f64, unit: &'static str) -> Self {
        Self {
            name,
            aliases: &[],
            default,
            unit,
            min: None,
            max: None,
        }
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn bounded(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }
}

/// Coerces a calculator's expected fields out of the open answer bag, recording
/// one assumption per defaulted field and a fallback entry for every
/// substitution. Centralises the fallback policy so defaults never reappear
/// ad hoc inside the arithmetic.
pub struct AnswerReader<'a> {
    answers: &'a FacilityAnswers,
    assumptions: Vec<String>,
    warnings: Vec<String>,
    audit: InputAudit,
}

impl<'a> AnswerReader<'a> {
    pub fn new(answers: &'a FacilityAnswers) -> Self {
        Self {
            answers,
            assumptions: Vec::new(),
            warnings: Vec::new(),
            audit: InputAudit::default(),
        }
    }

    fn lookup(&self, spec: &FieldSpec) -> Option<(&'a str, &'a AnswerValue)> {
        if let Some(v) = self.answers.get(spec.name) {
            return Some((spec.name, v));
        }
        for alias in spec.aliases {
            if let Some(v) = self.answers.get(alias) {
                return Some((alias, v));
            }
        }
        None
    }

    fn record_default(&mut self, spec: &FieldSpec, reason: FallbackReason) -> f64 {
        if reason == FallbackReason::Missing {
            self.audit.missing_inputs.push(spec.name.to_string());
            self.assumptions.push(format!(
                "{} not provided; assuming {} {}",
                spec.name, spec.default, spec.unit
            ));
        }
        self.audit.fallbacks.insert(
            spec.name.to_string(),
            InputFallback {
                value: AnswerValue::Number(spec.default),
                reason,
            },
        );
        self.audit
            .inputs_used
            .insert(spec.name.to_string(), AnswerValue::Number(spec.default));
        spec.default
    }

    fn apply_bounds(&mut self, spec: &FieldSpec, raw: f64) -> f64 {
        let lo = spec.min.unwrap_or(f64::NEG_INFINITY);
        let hi = spec.max.unwrap_or(f64::INFINITY);
        if raw < lo || raw > hi {
            let clamped = raw.clamp(lo, hi);
            self.warnings.push(format!(
                "{} = {} outside plausible range [{}, {}]; clamped to {}",
                spec.name, raw, lo, hi, clamped
            ));
            self.audit.fallbacks.insert(
                spec.name.to_string(),
                InputFallback {
                    value: AnswerValue::Number(clamped),
                    reason: FallbackReason::OutOfRange,
                },
            );
            clamped
        } else {
            raw
        }
    }

    /// Read a numeric field, substituting the documented default for missing
    /// or malformed values and clamping to the declared bounds.
    pub fn number(&mut self, spec: &FieldSpec) -> f64 {
        match self.lookup(spec) {
            None => self.record_default(spec, FallbackReason::Missing),
            Some((key, value)) => match value.as_number() {
                Some(n) if n.is_finite() => {
                    let effective = self.apply_bounds(spec, n);
                    self.audit
                        .inputs_used
                        .insert(spec.name.to_string(), AnswerValue::Number(effective));
                    effective
                }
                _ => {
                    self.warnings.push(format!(
                        "{}: expected a number, got {}; using default {} {}",
                        key,
                        value.type_name(),
                        spec.default,
                        spec.unit
                    ));
                    self.record_default(spec, FallbackReason::Malformed)
                }
            },
        }
    }

    /// Read a count-like field. Missing and malformed values degrade to the
    /// default, but an explicitly negative count is unrecoverable.
    pub fn count(&mut self, spec: &FieldSpec) -> Result<f64, AnswerError> {
        match self.lookup(spec) {
            None => Ok(self.record_default(spec, FallbackReason::Missing)),
            Some((key, value)) => match value.as_number() {
                Some(n) if n.is_finite() => {
                    if n < 0.0 {
                        return Err(AnswerError::NegativeCount {
                            field: key.to_string(),
                            value: n,
                        });
                    }
                    let effective = self.apply_bounds(spec, n);
                    self.audit
                        .inputs_used
                        .insert(spec.name.to_string(), AnswerValue::Number(effective));
                    Ok(effective)
                }
                _ => {
                    self.warnings.push(format!(
                        "{}: expected a count, got {}; using default {}",
                        key,
                        value.type_name(),
                        spec.default
                    ));
                    Ok(self.record_default(spec, FallbackReason::Malformed))
                }
            },
        }
    }

    /// Read a boolean flag with a default.
    pub fn flag(&mut self, name: &'static str, default: bool) -> bool {
        match self.answers.get(name).and_then(AnswerValue::as_flag) {
            Some(b) => {
                self.audit
                    .inputs_used
                    .insert(name.to_string(), AnswerValue::Flag(b));
                b
            }
            None => {
                if self.answers.get(name).is_some() {
                    self.warnings
                        .push(format!("{name}: expected a flag; using default {default}"));
                    self.audit.fallbacks.insert(
                        name.to_string(),
                        InputFallback {
                            value: AnswerValue::Flag(default),
                            reason: FallbackReason::Malformed,
                        },
                    );
                } else {
                    self.audit.missing_inputs.push(name.to_string());
                    self.assumptions
                        .push(format!("{name} not provided; assuming {default}"));
                    self.audit.fallbacks.insert(
                        name.to_string(),
                        InputFallback {
                            value: AnswerValue::Flag(default),
                            reason: FallbackReason::Missing,
                        },
                    );
                }
                self.audit
                    .inputs_used
                    .insert(name.to_string(), AnswerValue::Flag(default));
                default
            }
        }
    }

    /// Read a select-style field, normalising to lowercase and falling back to
    /// the default for unknown choices.
    pub fn choice(&mut self, name: &'static str, allowed: &[&str], default: &str) -> String {
        match self.answers.get(name).and_then(AnswerValue::as_text) {
            Some(raw) => {
                let normalised = raw.trim().to_lowercase().replace([' ', '-'], "_");
                if allowed.contains(&normalised.as_str()) {
                    self.audit
                        .inputs_used
                        .insert(name.to_string(), AnswerValue::Text(normalised.clone()));
                    normalised
                } else {
                    self.warnings.push(format!(
                        "{name}: '{raw}' is not one of {allowed:?}; using '{default}'"
                    ));
                    self.substitute_choice(name, default, FallbackReason::Malformed)
                }
            }
            None => {
                if self.answers.get(name).is_some() {
                    self.warnings
                        .push(format!("{name}: expected text; using '{default}'"));
                    self.substitute_choice(name, default, FallbackReason::Malformed)
                } else {
                    self.audit.missing_inputs.push(name.to_string());
                    self.assumptions
                        .push(format!("{name} not provided; assuming '{default}'"));
                    self.substitute_choice(name, default, FallbackReason::Missing)
                }
            }
        }
    }

    fn substitute_choice(
        &mut self,
        name: &str,
        default: &str,
        reason: FallbackReason,
    ) -> String {
        self.audit.fallbacks.insert(
            name.to_string(),
            InputFallback {
                value: AnswerValue::Text(default.to_string()),
                reason,
            },
        );
        self.audit
            .inputs_used
            .insert(name.to_string(), AnswerValue::Text(default.to_string()));
        default.to_string()
    }

    /// Append a free-form assumption note.
    pub fn assume(&mut self, note: impl Into<String>) {
        self.assumptions.push(note.into());
    }

    /// Append a free-form warning.
    pub fn warn(&mut self, note: impl Into<String>) {
        self.warnings.push(note.into());
    }

    /// Consume the reader, handing back assumptions, warnings, and the audit.
    pub fn finish(self) -> (Vec<String>, Vec<String>, InputAudit) {
        (self.assumptions, self.warnings, self.audit)
    }
}

/// Grid connection quality, one of the universal questionnaire fields. Affects
/// backup-duration sizing, not the load profile itself.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GridConnection {
    #[default]
    Reliable,
    Unreliable,
    Limited,
    OffGrid,
    Microgrid,
}

/// Universal questionnaire fields present on every industry template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalInputs {
    pub operating_hours: f64,
    pub facility_size_sqft: f64,
    /// Metered peak from a utility bill, in MW. Zero means "auto-calculate".
    pub peak_load_override_mw: f64,
    pub grid_connection: GridConnection,
    /// Maximum utility connection in MW when the grid is `Limited`. Zero means
    /// unlimited.
    pub grid_capacity_mw: f64,
}

impl UniversalInputs {
    /// Coerce the universal fields, with per-industry defaults for operating
    /// hours and facility size.
    pub fn read(
        reader: &mut AnswerReader<'_>,
        default_operating_hours: f64,
        default_facility_sqft: f64,
    ) -> Self {
        let operating_hours = reader.number(
            &FieldSpec::new("operatingHours", default_operating_hours, "h/day")
                .aliases(&["operating_hours", "hoursPerDay"])
                .bounded(0.0, 24.0),
        );
        let facility_size_sqft = reader.number(
            &FieldSpec::new("facilitySize", default_facility_sqft, "sq ft")
                .aliases(&["facility_size_sqft", "squareFootage"])
                .min(0.0),
        );
        let peak_load_override_mw = reader.number(
            &FieldSpec::new("peakLoad", 0.0, "MW")
                .aliases(&["peak_load_mw", "meteredPeakMW"])
                .min(0.0),
        );
        let grid_connection = reader
            .choice(
                "gridConnection",
                &["reliable", "unreliable", "limited", "off_grid", "microgrid"],
                "reliable",
            )
            .parse()
            .unwrap_or_default();
        let grid_capacity_mw = reader.number(
            &FieldSpec::new("gridCapacity", 0.0, "MW")
                .aliases(&["grid_capacity_mw"])
                .min(0.0),
        );

        Self {
            operating_hours,
            facility_size_sqft,
            peak_load_override_mw,
            grid_connection,
            grid_capacity_mw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VEHICLES: FieldSpec = FieldSpec::new("dailyVehicles", 150.0, "vehicles/day")
        .aliases(&["cars_per_day_avg", "carsPerDay"])
        .min(0.0);

    #[test]
    fn test_number_present() {
        let answers = FacilityAnswers::new().set("dailyVehicles", 240.0);
        let mut reader = AnswerReader::new(&answers);
        assert_eq!(reader.number(&VEHICLES), 240.0);

        let (assumptions, warnings, audit) = reader.finish();
        assert!(assumptions.is_empty());
        assert!(warnings.is_empty());
        assert!(audit.fallbacks.is_empty());
        assert_eq!(
            audit.inputs_used["dailyVehicles"],
            AnswerValue::Number(240.0)
        );
    }

    #[test]
    fn test_number_via_alias() {
        let answers = FacilityAnswers::new().set("cars_per_day_avg", 320);
        let mut reader = AnswerReader::new(&answers);
        assert_eq!(reader.number(&VEHICLES), 320.0);
        // The canonical name is what lands in the audit.
        let (_, _, audit) = reader.finish();
        assert!(audit.inputs_used.contains_key("dailyVehicles"));
    }

    #[test]
    fn test_number_missing_records_assumption_and_fallback() {
        let answers = FacilityAnswers::new();
        let mut reader = AnswerReader::new(&answers);
        assert_eq!(reader.number(&VEHICLES), 150.0);

        let (assumptions, _, audit) = reader.finish();
        assert_eq!(assumptions.len(), 1);
        assert!(assumptions[0].contains("dailyVehicles"));
        assert_eq!(audit.missing_inputs, vec!["dailyVehicles".to_string()]);
        assert_eq!(
            audit.fallbacks["dailyVehicles"].reason,
            FallbackReason::Missing
        );
    }

    #[test]
    fn test_number_malformed_falls_back_with_warning() {
        let answers = FacilityAnswers::new().set("dailyVehicles", "lots");
        let mut reader = AnswerReader::new(&answers);
        assert_eq!(reader.number(&VEHICLES), 150.0);

        let (_, warnings, audit) = reader.finish();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            audit.fallbacks["dailyVehicles"].reason,
            FallbackReason::Malformed
        );
    }

    #[test]
    fn test_number_clamped_to_bounds() {
        let spec = FieldSpec::new("operatingHours", 12.0, "h/day").bounded(0.0, 24.0);
        let answers = FacilityAnswers::new().set("operatingHours", 30.0);
        let mut reader = AnswerReader::new(&answers);
        assert_eq!(reader.number(&spec), 24.0);

        let (_, warnings, audit) = reader.finish();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            audit.fallbacks["operatingHours"].reason,
            FallbackReason::OutOfRange
        );
    }

    #[test]
    fn test_negative_count_is_unrecoverable() {
        let spec = FieldSpec::new("bayCount", 4.0, "bays");
        let answers = FacilityAnswers::new().set("bayCount", -2);
        let mut reader = AnswerReader::new(&answers);
        assert!(reader.count(&spec).is_err());
    }

    #[test]
    fn test_missing_count_defaults() {
        let spec = FieldSpec::new("bayCount", 4.0, "bays");
        let answers = FacilityAnswers::new();
        let mut reader = AnswerReader::new(&answers);
        assert_eq!(reader.count(&spec).unwrap(), 4.0);
    }

    #[test]
    fn test_choice_normalisation() {
        let answers = FacilityAnswers::new().set("gridConnection", "Off-Grid");
        let mut reader = AnswerReader::new(&answers);
        let choice = reader.choice(
            "gridConnection",
            &["reliable", "unreliable", "limited", "off_grid", "microgrid"],
            "reliable",
        );
        assert_eq!(choice, "off_grid");
        assert_eq!(choice.parse::<GridConnection>().unwrap(), GridConnection::OffGrid);
    }

    #[test]
    fn test_choice_unknown_falls_back() {
        let answers = FacilityAnswers::new().set("gridConnection", "quantum");
        let mut reader = AnswerReader::new(&answers);
        let choice = reader.choice("gridConnection", &["reliable", "unreliable"], "reliable");
        assert_eq!(choice, "reliable");
        let (_, warnings, _) = reader.finish();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_universal_inputs_defaults() {
        let answers = FacilityAnswers::new();
        let mut reader = AnswerReader::new(&answers);
        let universal = UniversalInputs::read(&mut reader, 12.0, 10_000.0);
        assert_eq!(universal.operating_hours, 12.0);
        assert_eq!(universal.facility_size_sqft, 10_000.0);
        assert_eq!(universal.peak_load_override_mw, 0.0);
        assert_eq!(universal.grid_connection, GridConnection::Reliable);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let answers = FacilityAnswers::new()
            .set("dailyVehicles", 120)
            .set("favoriteColor", "blue")
            .set("somethingElse", true);
        let mut reader = AnswerReader::new(&answers);
        assert_eq!(reader.number(&VEHICLES), 120.0);
        let (_, warnings, _) = reader.finish();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_untagged_deserialization() {
        let yaml = "bayCount: 4\nwashType: tunnel\nhasPool: true\nratios: [0.5, 0.7]\n";
        let answers: FacilityAnswers = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(answers.get("bayCount"), Some(&AnswerValue::Number(4.0)));
        assert_eq!(
            answers.get("washType"),
            Some(&AnswerValue::Text("tunnel".to_string()))
        );
        assert_eq!(answers.get("hasPool"), Some(&AnswerValue::Flag(true)));
        assert!(matches!(answers.get("ratios"), Some(AnswerValue::List(v)) if v.len() == 2));
    }
}
