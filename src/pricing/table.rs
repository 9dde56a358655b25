use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::{ConfidenceLevel, SizeAxis};

/// What one unit of price buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    UsdPerKwh,
    UsdPerKw,
}

impl std::fmt::Display for PriceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceUnit::UsdPerKwh => write!(f, "$/kWh"),
            PriceUnit::UsdPerKw => write!(f, "$/kW"),
        }
    }
}

/// Quality grade of the source behind a tier row. Provenance metadata only;
/// price selection always goes through the five confidence price points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataGrade {
    High,
    #[default]
    Mid,
    Low,
}

/// The five confidence price points of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoints {
    pub low: f64,
    pub low_plus: f64,
    pub mid: f64,
    pub mid_plus: f64,
    pub high: f64,
}

impl PricePoints {
    pub fn at(&self, level: ConfidenceLevel) -> f64 {
        match level {
            ConfidenceLevel::Low => self.low,
            ConfidenceLevel::LowPlus => self.low_plus,
            ConfidenceLevel::Mid => self.mid,
            ConfidenceLevel::MidPlus => self.mid_plus,
            ConfidenceLevel::High => self.high,
        }
    }

    fn as_array(&self) -> [f64; 5] {
        [self.low, self.low_plus, self.mid, self.mid_plus, self.high]
    }

    fn is_non_decreasing(&self) -> bool {
        self.as_array().windows(2).all(|w| w[0] <= w[1])
    }

    fn all_valid(&self) -> bool {
        self.as_array().iter().all(|p| p.is_finite() && *p > 0.0)
    }
}

/// One raw tier row as loaded from a pricing source, before table validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRecord {
    pub category: String,
    pub axis: SizeAxis,
    pub price_unit: PriceUnit,
    /// Inclusive lower bound of the band, in the axis unit.
    pub min: f64,
    /// Exclusive upper bound; `None` means unbounded.
    pub max: Option<f64>,
    #[serde(flatten)]
    pub prices: PricePoints,
    /// Where the row's numbers came from.
    #[serde(default)]
    pub data_source: String,
    /// How well sourced the row is.
    #[serde(default)]
    pub confidence: DataGrade,
}

/// Size being priced, carrying its own axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeQuery {
    PowerKw(f64),
    EnergyMwh(f64),
}

impl SizeQuery {
    pub fn axis(&self) -> SizeAxis {
        match self {
            SizeQuery::PowerKw(_) => SizeAxis::PowerKw,
            SizeQuery::EnergyMwh(_) => SizeAxis::EnergyMwh,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            SizeQuery::PowerKw(v) | SizeQuery::EnergyMwh(v) => *v,
        }
    }
}

/// A successful tier match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPrice {
    pub category: String,
    pub axis: SizeAxis,
    pub price_unit: PriceUnit,
    pub band_min: f64,
    pub band_max: Option<f64>,
    pub confidence: ConfidenceLevel,
    pub unit_price: f64,
    /// Provenance of the matched band.
    pub data_source: String,
    pub grade: DataGrade,
}

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("unknown price category '{0}'")]
    UnknownCategory(String),
    #[error("category '{category}' is banded by {expected}, queried by {got}")]
    AxisMismatch {
        category: String,
        expected: SizeAxis,
        got: SizeAxis,
    },
    #[error("size {value} ({axis}) is not covered by any '{category}' band")]
    SizeNotCovered {
        category: String,
        axis: SizeAxis,
        value: f64,
    },
    #[error("queried size {0} must be non-negative and finite")]
    InvalidSize(f64),
    #[error("category '{0}' has no bands")]
    EmptyCategory(String),
    #[error("category '{category}' mixes size axes")]
    MixedAxes { category: String },
    #[error("category '{category}' mixes price units")]
    MixedUnits { category: String },
    #[error("category '{category}' first band starts at {start}, expected 0")]
    FirstBandNotZero { category: String, start: f64 },
    #[error("category '{category}' band starting at {min} is empty or inverted")]
    InvertedBand { category: String, min: f64 },
    #[error("category '{category}' has an unbounded band before the last")]
    UnboundedNotLast { category: String },
    #[error(
        "category '{category}' bands must meet exactly: one ends at {prev_max}, the next starts at {next_min}"
    )]
    DiscontinuousBands {
        category: String,
        prev_max: f64,
        next_min: f64,
    },
    #[error("category '{category}' band starting at {min} has a non-positive or non-finite price")]
    InvalidPrice { category: String, min: f64 },
    #[error(
        "category '{category}' band starting at {min} prices must be non-decreasing from low to high"
    )]
    UnorderedPrices { category: String, min: f64 },
}

#[derive(Debug, Clone)]
struct Band {
    min: f64,
    max: Option<f64>,
    prices: PricePoints,
    data_source: String,
    grade: DataGrade,
}

impl Band {
    fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value < max)
    }
}

#[derive(Debug, Clone)]
struct CategoryBands {
    axis: SizeAxis,
    price_unit: PriceUnit,
    bands: Vec<Band>,
}

/// Validated, immutable price table. Construction checks every structural
/// invariant once so lookup can be a plain scan.
#[derive(Debug, Clone)]
pub struct PricingTable {
    categories: BTreeMap<String, CategoryBands>,
}

impl PricingTable {
    /// Build a table from raw tier rows, grouping by category and validating
    /// band structure and price ordering.
    pub fn from_records(records: Vec<TierRecord>) -> Result<Self, PricingError> {
        let mut grouped: BTreeMap<String, Vec<TierRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.category.clone()).or_default().push(record);
        }

        let mut categories = BTreeMap::new();
        for (category, mut rows) in grouped {
            if rows.is_empty() {
                return Err(PricingError::EmptyCategory(category));
            }
            let axis = rows[0].axis;
            let price_unit = rows[0].price_unit;
            if rows.iter().any(|r| r.axis != axis) {
                return Err(PricingError::MixedAxes { category });
            }
            if rows.iter().any(|r| r.price_unit != price_unit) {
                return Err(PricingError::MixedUnits { category });
            }

            rows.sort_by(|a, b| a.min.total_cmp(&b.min));

            let mut bands = Vec::with_capacity(rows.len());
            for (index, row) in rows.iter().enumerate() {
                if !row.prices.all_valid() {
                    return Err(PricingError::InvalidPrice {
                        category,
                        min: row.min,
                    });
                }
                if !row.prices.is_non_decreasing() {
                    return Err(PricingError::UnorderedPrices {
                        category,
                        min: row.min,
                    });
                }
                if let Some(max) = row.max {
                    if max <= row.min {
                        return Err(PricingError::InvertedBand {
                            category,
                            min: row.min,
                        });
                    }
                } else if index + 1 != rows.len() {
                    return Err(PricingError::UnboundedNotLast { category });
                }
                bands.push(Band {
                    min: row.min,
                    max: row.max,
                    prices: row.prices,
                    data_source: row.data_source.clone(),
                    grade: row.confidence,
                });
            }

            if bands[0].min != 0.0 {
                return Err(PricingError::FirstBandNotZero {
                    start: bands[0].min,
                    category,
                });
            }
            for pair in bands.windows(2) {
                // Unbounded bands are last, so prev.max is always Some here.
                let prev_max = pair[0].max.unwrap_or(f64::INFINITY);
                if prev_max != pair[1].min {
                    return Err(PricingError::DiscontinuousBands {
                        category,
                        prev_max,
                        next_min: pair[1].min,
                    });
                }
            }

            categories.insert(
                category,
                CategoryBands {
                    axis,
                    price_unit,
                    bands,
                },
            );
        }

        Ok(Self { categories })
    }

    /// Find the band covering a size and return the price at the requested
    /// confidence level. Every mismatch is a hard error; there is no nearest
    /// band fallback.
    pub fn resolve(
        &self,
        category: &str,
        query: SizeQuery,
        level: ConfidenceLevel,
    ) -> Result<ResolvedPrice, PricingError> {
        let value = query.value();
        if !value.is_finite() || value < 0.0 {
            return Err(PricingError::InvalidSize(value));
        }
        let entry = self
            .categories
            .get(category)
            .ok_or_else(|| PricingError::UnknownCategory(category.to_string()))?;
        if entry.axis != query.axis() {
            return Err(PricingError::AxisMismatch {
                category: category.to_string(),
                expected: entry.axis,
                got: query.axis(),
            });
        }
        let band = entry
            .bands
            .iter()
            .find(|band| band.contains(value))
            .ok_or_else(|| PricingError::SizeNotCovered {
                category: category.to_string(),
                axis: entry.axis,
                value,
            })?;
        Ok(ResolvedPrice {
            category: category.to_string(),
            axis: entry.axis,
            price_unit: entry.price_unit,
            band_min: band.min,
            band_max: band.max,
            confidence: level,
            unit_price: band.prices.at(level),
            data_source: band.data_source.clone(),
            grade: band.grade,
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn band_count(&self) -> usize {
        self.categories.values().map(|c| c.bands.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(low: f64) -> PricePoints {
        PricePoints {
            low,
            low_plus: low + 10.0,
            mid: low + 20.0,
            mid_plus: low + 30.0,
            high: low + 40.0,
        }
    }

    fn record(category: &str, min: f64, max: Option<f64>, low: f64) -> TierRecord {
        TierRecord {
            category: category.to_string(),
            axis: SizeAxis::PowerKw,
            price_unit: PriceUnit::UsdPerKwh,
            min,
            max,
            prices: points(low),
            data_source: "unit_test".to_string(),
            confidence: DataGrade::default(),
        }
    }

    fn two_band_table() -> PricingTable {
        PricingTable::from_records(vec![
            record("bess", 0.0, Some(500.0), 380.0),
            record("bess", 500.0, None, 330.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolves_inside_a_band() {
        let table = two_band_table();
        let price = table
            .resolve("bess", SizeQuery::PowerKw(120.0), ConfidenceLevel::Mid)
            .unwrap();
        assert_eq!(price.band_min, 0.0);
        assert_eq!(price.unit_price, 400.0);
        assert_eq!(price.data_source, "unit_test");
        assert_eq!(price.grade, DataGrade::Mid);
    }

    #[test]
    fn test_boundary_belongs_to_the_upper_band() {
        let table = two_band_table();
        let price = table
            .resolve("bess", SizeQuery::PowerKw(500.0), ConfidenceLevel::Low)
            .unwrap();
        assert_eq!(price.band_min, 500.0);
        assert_eq!(price.unit_price, 330.0);
    }

    #[test]
    fn test_each_confidence_level_reads_its_own_point() {
        let table = two_band_table();
        for (level, expected) in [
            (ConfidenceLevel::Low, 380.0),
            (ConfidenceLevel::LowPlus, 390.0),
            (ConfidenceLevel::Mid, 400.0),
            (ConfidenceLevel::MidPlus, 410.0),
            (ConfidenceLevel::High, 420.0),
        ] {
            let price = table
                .resolve("bess", SizeQuery::PowerKw(10.0), level)
                .unwrap();
            assert_eq!(price.unit_price, expected, "level {level}");
        }
    }

    #[test]
    fn test_unknown_category_is_a_hard_error() {
        let table = two_band_table();
        assert!(matches!(
            table.resolve("chargers", SizeQuery::PowerKw(10.0), ConfidenceLevel::Mid),
            Err(PricingError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_axis_mismatch_is_a_hard_error() {
        let table = two_band_table();
        assert!(matches!(
            table.resolve("bess", SizeQuery::EnergyMwh(5.0), ConfidenceLevel::Mid),
            Err(PricingError::AxisMismatch { .. })
        ));
    }

    #[test]
    fn test_uncovered_size_is_a_hard_error() {
        let table = PricingTable::from_records(vec![record("bess", 0.0, Some(500.0), 380.0)])
            .unwrap();
        assert!(matches!(
            table.resolve("bess", SizeQuery::PowerKw(900.0), ConfidenceLevel::Mid),
            Err(PricingError::SizeNotCovered { .. })
        ));
    }

    #[test]
    fn test_invalid_sizes_are_rejected() {
        let table = two_band_table();
        assert!(matches!(
            table.resolve("bess", SizeQuery::PowerKw(-5.0), ConfidenceLevel::Mid),
            Err(PricingError::InvalidSize(_))
        ));
        assert!(matches!(
            table.resolve("bess", SizeQuery::PowerKw(f64::NAN), ConfidenceLevel::Mid),
            Err(PricingError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_construction_rejects_gap_between_bands() {
        let result = PricingTable::from_records(vec![
            record("bess", 0.0, Some(500.0), 380.0),
            record("bess", 600.0, None, 330.0),
        ]);
        assert!(matches!(
            result,
            Err(PricingError::DiscontinuousBands { .. })
        ));
    }

    #[test]
    fn test_construction_rejects_first_band_above_zero() {
        let result = PricingTable::from_records(vec![record("bess", 100.0, None, 380.0)]);
        assert!(matches!(result, Err(PricingError::FirstBandNotZero { .. })));
    }

    #[test]
    fn test_construction_rejects_unordered_prices() {
        let mut bad = record("bess", 0.0, None, 380.0);
        bad.prices.high = bad.prices.low - 1.0;
        assert!(matches!(
            PricingTable::from_records(vec![bad]),
            Err(PricingError::UnorderedPrices { .. })
        ));
    }

    #[test]
    fn test_construction_rejects_unbounded_band_in_the_middle() {
        let result = PricingTable::from_records(vec![
            record("bess", 0.0, None, 380.0),
            record("bess", 500.0, Some(1000.0), 330.0),
        ]);
        assert!(matches!(result, Err(PricingError::UnboundedNotLast { .. })));
    }

    #[test]
    fn test_construction_rejects_mixed_axes() {
        let mut odd = record("bess", 500.0, None, 330.0);
        odd.axis = SizeAxis::EnergyMwh;
        let result = PricingTable::from_records(vec![record("bess", 0.0, Some(500.0), 380.0), odd]);
        assert!(matches!(result, Err(PricingError::MixedAxes { .. })));
    }

    #[test]
    fn test_construction_rejects_nonpositive_prices() {
        let mut bad = record("bess", 0.0, None, 380.0);
        bad.prices.low = 0.0;
        assert!(matches!(
            PricingTable::from_records(vec![bad]),
            Err(PricingError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_bounded_top_table_is_legal() {
        // An unbounded last band is the norm but not required.
        let table =
            PricingTable::from_records(vec![record("bess", 0.0, Some(500.0), 380.0)]).unwrap();
        assert_eq!(table.band_count(), 1);
    }
}
