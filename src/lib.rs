//! Battery storage quoting engine for commercial facilities.
//!
//! A facility questionnaire goes in; a sized, priced, and validated battery
//! quote comes out, with a forensic trace explaining every assumption along
//! the way. The pipeline is strict: per-industry load calculators produce a
//! normalized [`domain::LoadProfile`], the invariant validator accepts or
//! rejects it, equipment sizing and tier-priced financials follow, and the
//! batch harness verifies the whole stack against fixtures, monotonicity
//! sweeps, and a validator fuzz check.

pub mod calculators;
pub mod config;
pub mod domain;
pub mod harness;
pub mod pricing;
pub mod quote;
pub mod telemetry;
pub mod validation;

pub use calculators::{CalculatorRegistry, IndustryId, LoadCalculator};
pub use config::EngineConfig;
pub use quote::{QuoteEngine, QuoteOutcome, QuoteStatus};
