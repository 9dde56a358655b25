use serde::{Deserialize, Serialize};
use validator::Validate;

/// Utility tariff figures a quote is priced against. Ranges are sanity bounds
/// on user-entered data, not physical limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TariffInputs {
    /// Demand charge in $/kW per month.
    #[validate(range(min = 0.0, max = 500.0))]
    pub demand_charge_usd_per_kw_month: f64,
    /// On-peak energy rate in $/kWh.
    #[validate(range(min = 0.0, max = 5.0))]
    pub peak_rate_usd_per_kwh: f64,
    /// Off-peak energy rate in $/kWh.
    #[validate(range(min = 0.0, max = 5.0))]
    pub offpeak_rate_usd_per_kwh: f64,
    /// Full charge/discharge cycles per day used for arbitrage revenue.
    #[validate(range(min = 0.0, max = 6.0))]
    pub cycles_per_day: f64,
}

impl Default for TariffInputs {
    fn default() -> Self {
        Self {
            demand_charge_usd_per_kw_month: 18.0,
            peak_rate_usd_per_kwh: 0.24,
            offpeak_rate_usd_per_kwh: 0.10,
            cycles_per_day: 1.0,
        }
    }
}

impl TariffInputs {
    /// Arbitrage spread in $/kWh. An inverted tariff yields zero, not a
    /// negative revenue stream.
    pub fn rate_spread(&self) -> f64 {
        (self.peak_rate_usd_per_kwh - self.offpeak_rate_usd_per_kwh).max(0.0)
    }
}

/// Deployment-tunable constants of the savings model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialPolicy {
    /// Fraction of the demand charge the battery actually shaves.
    pub shave_effectiveness: f64,
    /// AC round-trip efficiency applied to arbitrage throughput.
    pub round_trip_efficiency: f64,
}

impl Default for FinancialPolicy {
    fn default() -> Self {
        Self {
            shave_effectiveness: 0.85,
            round_trip_efficiency: 0.88,
        }
    }
}

/// Headline economics of a quoted system.
///
/// Serialized names are part of the trace contract, same as [`LoadProfile`].
///
/// [`LoadProfile`]: super::profile::LoadProfile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialResult {
    #[serde(rename = "capexUSD")]
    pub capex_usd: f64,
    #[serde(rename = "annualSavingsUSD")]
    pub annual_savings_usd: f64,
    #[serde(rename = "paybackYears")]
    pub payback_years: f64,
    /// Simple first-year return, `100 / paybackYears`. Values at or above 100
    /// mean a sub-year payback, which the rule table treats as implausible.
    #[serde(rename = "roiPercent")]
    pub roi_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_default_tariff_validates() {
        assert!(TariffInputs::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_tariff_rejected() {
        let tariff = TariffInputs {
            demand_charge_usd_per_kw_month: 900.0,
            ..TariffInputs::default()
        };
        let err = tariff.validate().unwrap_err();
        assert!(err
            .field_errors()
            .contains_key("demand_charge_usd_per_kw_month"));
    }

    #[test]
    fn test_inverted_tariff_spread_is_zero() {
        let tariff = TariffInputs {
            peak_rate_usd_per_kwh: 0.08,
            offpeak_rate_usd_per_kwh: 0.12,
            ..TariffInputs::default()
        };
        assert_eq!(tariff.rate_spread(), 0.0);
    }

    #[test]
    fn test_result_serialized_names() {
        let result = FinancialResult {
            capex_usd: 1_000_000.0,
            annual_savings_usd: 150_000.0,
            payback_years: 6.67,
            roi_percent: 15.0,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["capexUSD"], 1_000_000.0);
        assert_eq!(json["annualSavingsUSD"], 150_000.0);
        assert_eq!(json["paybackYears"], 6.67);
        assert_eq!(json["roiPercent"], 15.0);
    }
}
