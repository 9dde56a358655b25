use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Normalized facility load profile, the common currency between industry
/// calculators and everything downstream (validation, sizing, financials).
///
/// Field names in serialized form are a stable contract consumed by the
/// forensic trace and external tooling; changing them is a breaking change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadProfile {
    /// Continuous floor load in kW, always drawn regardless of activity.
    #[serde(rename = "baseLoadKW")]
    pub base_load_kw: f64,
    /// Worst-case simultaneous demand in kW.
    #[serde(rename = "peakLoadKW")]
    pub peak_load_kw: f64,
    /// Expected daily consumption in kWh.
    #[serde(rename = "energyKWhPerDay")]
    pub energy_kwh_per_day: f64,
    /// Fraction of the day the facility operates near peak, in [0, 1] with
    /// configurable headroom for overdriven sites. Not every source model
    /// produces one.
    #[serde(rename = "dutyCycle", default, skip_serializing_if = "Option::is_none")]
    pub duty_cycle: Option<f64>,
    /// Named breakdown of what makes up the peak, in kW. Keys are sorted so
    /// serialization and hashing are deterministic.
    #[serde(rename = "kWContributors")]
    pub kw_contributors: BTreeMap<String, f64>,
    /// Plain-language notes for every defaulted or substituted input that
    /// shaped this profile.
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// Clamp and unrecognised-choice notices raised while reading the answers.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl LoadProfile {
    /// Upper bound on daily energy: running flat-out at peak for 24 hours.
    pub fn theoretical_max_energy(&self) -> f64 {
        self.peak_load_kw * 24.0
    }

    /// Sum of the named contributors, expected to equal the peak within
    /// tolerance.
    pub fn contributor_sum(&self) -> f64 {
        self.kw_contributors.values().sum()
    }

    /// Scale every contributor by the same factor, preserving the breakdown
    /// shape. Used when a metered peak overrides the modelled one.
    pub fn rescale_contributors(&mut self, factor: f64) {
        for value in self.kw_contributors.values_mut() {
            *value *= factor;
        }
    }

    /// Stable digest of the numeric load shape for trace comparison. Two
    /// profiles hash equal iff every figure (contributors included) is
    /// bit-identical, independent of process or platform. The assumption and
    /// warning text is not part of the digest; rewording a note must not look
    /// like a different load.
    pub fn content_hash(&self) -> u64 {
        // BTreeMap ordering plus bincode's fixed layout make the byte stream
        // deterministic; the hasher uses fixed keys.
        let numeric = (
            self.base_load_kw,
            self.peak_load_kw,
            self.energy_kwh_per_day,
            self.duty_cycle,
            &self.kw_contributors,
        );
        let bytes = bincode::serialize(&numeric).unwrap_or_default();
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        bytes.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> LoadProfile {
        let mut contributors = BTreeMap::new();
        contributors.insert("wash_equipment".to_string(), 60.0);
        contributors.insert("dryers".to_string(), 40.0);
        LoadProfile {
            base_load_kw: 12.0,
            peak_load_kw: 100.0,
            energy_kwh_per_day: 700.0,
            duty_cycle: Some(0.42),
            kw_contributors: contributors,
            assumptions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_theoretical_max() {
        assert_eq!(sample_profile().theoretical_max_energy(), 2400.0);
    }

    #[test]
    fn test_contributor_sum() {
        assert_eq!(sample_profile().contributor_sum(), 100.0);
    }

    #[test]
    fn test_rescale_contributors() {
        let mut profile = sample_profile();
        profile.rescale_contributors(1.5);
        assert_eq!(profile.kw_contributors["wash_equipment"], 90.0);
        assert_eq!(profile.contributor_sum(), 150.0);
    }

    #[test]
    fn test_serialized_field_names_are_stable() {
        let json = serde_json::to_value(sample_profile()).unwrap();
        assert!(json.get("baseLoadKW").is_some());
        assert!(json.get("peakLoadKW").is_some());
        assert!(json.get("energyKWhPerDay").is_some());
        assert!(json.get("dutyCycle").is_some());
        assert!(json.get("kWContributors").is_some());
        assert!(json.get("assumptions").is_some());
        assert!(json.get("warnings").is_some());
    }

    #[test]
    fn test_annotations_ride_along_in_serialized_form() {
        let mut profile = sample_profile();
        profile
            .assumptions
            .push("bayCount not provided; assuming 4 bays".to_string());
        profile
            .warnings
            .push("operatingHours clamped to 24".to_string());
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["assumptions"][0], "bayCount not provided; assuming 4 bays");
        assert_eq!(json["warnings"][0], "operatingHours clamped to 24");
    }

    #[test]
    fn test_absent_duty_cycle_is_omitted_not_null() {
        let mut profile = sample_profile();
        profile.duty_cycle = None;
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("dutyCycle").is_none());
        // And it reads back as absent.
        let restored: LoadProfile = serde_json::from_value(json).unwrap();
        assert_eq!(restored.duty_cycle, None);
    }

    #[test]
    fn test_content_hash_is_stable_and_sensitive() {
        let a = sample_profile();
        let b = sample_profile();
        assert_eq!(a.content_hash(), b.content_hash());

        let mut c = sample_profile();
        c.peak_load_kw += 0.001;
        assert_ne!(a.content_hash(), c.content_hash());

        let mut d = sample_profile();
        d.kw_contributors.insert("vacuum".to_string(), 0.0);
        assert_ne!(a.content_hash(), d.content_hash());

        let mut e = sample_profile();
        e.duty_cycle = None;
        assert_ne!(a.content_hash(), e.content_hash());
    }

    #[test]
    fn test_content_hash_ignores_annotation_text() {
        let a = sample_profile();
        let mut b = sample_profile();
        b.assumptions.push("defaulted bayCount to 4".to_string());
        b.warnings.push("clamped operatingHours".to_string());
        assert_eq!(a.content_hash(), b.content_hash());
    }
}
