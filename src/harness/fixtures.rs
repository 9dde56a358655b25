use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{FacilityAnswers, TariffInputs};

/// Outcome a fixture is expected to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedStatus {
    #[default]
    Validated,
    Rejected,
}

/// One batch scenario: an industry, a set of answers, and optionally its own
/// tariff. Fixtures expecting rejection prove the rule tables still fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub industry: String,
    #[serde(default)]
    pub answers: FacilityAnswers,
    #[serde(default)]
    pub tariff: Option<TariffInputs>,
    #[serde(default)]
    pub expected: ExpectedStatus,
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    fixtures: Vec<Fixture>,
}

/// Load a fixture set from a YAML file, replacing the builtin set entirely.
pub async fn load_fixtures(path: &Path) -> Result<Vec<Fixture>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading fixture file {}", path.display()))?;
    let file: FixtureFile =
        serde_yaml::from_str(&text).context("malformed fixture file")?;
    Ok(file.fixtures)
}

/// The stock scenarios: one realistic site per industry, plus a deliberate
/// tariff entry error that must be rejected.
pub fn builtin_fixtures() -> Vec<Fixture> {
    vec![
        Fixture {
            name: "car_wash_express_tunnel".to_string(),
            industry: "car_wash".to_string(),
            answers: FacilityAnswers::new()
                .set("bayCount", 6)
                .set("dailyVehicles", 400)
                .set("operatingHours", 14)
                .set("washType", "tunnel"),
            tariff: None,
            expected: ExpectedStatus::Validated,
        },
        Fixture {
            name: "hotel_conference_resort".to_string(),
            industry: "hotel".to_string(),
            answers: FacilityAnswers::new()
                .set("roomCount", 250)
                .set("occupancyRate", 0.75)
                .set("hasPool", true)
                .set("facilitySize", 180_000),
            tariff: None,
            expected: ExpectedStatus::Validated,
        },
        Fixture {
            name: "data_center_colo_hall".to_string(),
            industry: "data_center".to_string(),
            answers: FacilityAnswers::new()
                .set("it_load_kw", 1200)
                .set("pue", 1.4)
                .set("utilization", 0.85),
            tariff: None,
            expected: ExpectedStatus::Validated,
        },
        Fixture {
            name: "hospital_regional_campus".to_string(),
            industry: "hospital".to_string(),
            answers: FacilityAnswers::new()
                .set("bedCount", 350)
                .set("imagingSuites", 4)
                .set("operatingRooms", 8)
                .set("facilitySize", 220_000),
            tariff: None,
            expected: ExpectedStatus::Validated,
        },
        Fixture {
            name: "ev_charging_highway_plaza".to_string(),
            industry: "ev_charging".to_string(),
            answers: FacilityAnswers::new()
                .set("dcFastChargers", 12)
                .set("level2Chargers", 8)
                .set("gridConnection", "limited")
                .set("gridCapacity", 1.5),
            tariff: None,
            expected: ExpectedStatus::Validated,
        },
        Fixture {
            name: "retail_grocery_anchor".to_string(),
            industry: "retail".to_string(),
            answers: FacilityAnswers::new()
                .set("facilitySize", 45_000)
                .set("hasGrocery", true)
                .set("operatingHours", 16),
            tariff: None,
            expected: ExpectedStatus::Validated,
        },
        // A tariff this good means someone slipped a decimal point. The
        // financial rules must throw it out.
        Fixture {
            name: "tariff_entry_error".to_string(),
            industry: "car_wash".to_string(),
            answers: FacilityAnswers::new(),
            tariff: Some(TariffInputs {
                demand_charge_usd_per_kw_month: 500.0,
                peak_rate_usd_per_kwh: 2.0,
                offpeak_rate_usd_per_kwh: 0.0,
                cycles_per_day: 4.0,
            }),
            expected: ExpectedStatus::Rejected,
        },
    ]
}
