//! Compiled-in price catalog, current as of the 2025 vendor survey. Serves as
//! the default source and as the reference shape for file-based tier sets.

use super::table::{DataGrade, PricePoints, PriceUnit, TierRecord};
use crate::domain::SizeAxis;

fn row(
    category: &str,
    axis: SizeAxis,
    price_unit: PriceUnit,
    min: f64,
    max: Option<f64>,
    prices: [f64; 5],
) -> TierRecord {
    TierRecord {
        category: category.to_string(),
        axis,
        price_unit,
        min,
        max,
        prices: PricePoints {
            low: prices[0],
            low_plus: prices[1],
            mid: prices[2],
            mid_plus: prices[3],
            high: prices[4],
        },
        data_source: String::new(),
        confidence: DataGrade::default(),
    }
}

/// Full builtin tier set: battery systems and balance-of-system by power band,
/// utility-scale procurement by energy band.
pub fn builtin_records() -> Vec<TierRecord> {
    use PriceUnit::{UsdPerKw, UsdPerKwh};
    use SizeAxis::{EnergyMwh, PowerKw};

    let mut records = vec![
        // Battery energy storage, $/kWh, banded by system power.
        row("bess", PowerKw, UsdPerKwh, 0.0, Some(500.0), [380.0, 420.0, 460.0, 520.0, 580.0]),
        row("bess", PowerKw, UsdPerKwh, 500.0, Some(3_000.0), [330.0, 360.0, 395.0, 440.0, 490.0]),
        row("bess", PowerKw, UsdPerKwh, 3_000.0, Some(10_000.0), [270.0, 295.0, 320.0, 350.0, 385.0]),
        row("bess", PowerKw, UsdPerKwh, 10_000.0, Some(50_000.0), [230.0, 250.0, 270.0, 295.0, 325.0]),
        row("bess", PowerKw, UsdPerKwh, 50_000.0, None, [195.0, 210.0, 228.0, 248.0, 272.0]),
        // Balance of system (inverters, switchgear, install), $/kW.
        row("bos", PowerKw, UsdPerKw, 0.0, Some(3_000.0), [120.0, 135.0, 150.0, 170.0, 190.0]),
        row("bos", PowerKw, UsdPerKw, 3_000.0, Some(50_000.0), [90.0, 100.0, 110.0, 125.0, 140.0]),
        row("bos", PowerKw, UsdPerKw, 50_000.0, None, [70.0, 78.0, 85.0, 95.0, 105.0]),
        // Utility procurement programs quote against delivered MWh.
        row("utility_procurement", EnergyMwh, UsdPerKwh, 0.0, Some(40.0), [310.0, 330.0, 350.0, 375.0, 400.0]),
        row("utility_procurement", EnergyMwh, UsdPerKwh, 40.0, Some(200.0), [250.0, 265.0, 280.0, 300.0, 320.0]),
        row("utility_procurement", EnergyMwh, UsdPerKwh, 200.0, None, [205.0, 215.0, 228.0, 242.0, 260.0]),
    ];
    // Provenance is uniform per category in the builtin set.
    for record in &mut records {
        let (source, grade) = match record.category.as_str() {
            "bess" => ("vendor_survey_2025", DataGrade::High),
            "bos" => ("installer_quotes_2025", DataGrade::Mid),
            _ => ("utility_rfp_awards_2024", DataGrade::Low),
        };
        record.data_source = source.to_string();
        record.confidence = grade;
    }
    records
}
