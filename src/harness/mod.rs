pub mod fixtures;

pub use fixtures::{builtin_fixtures, load_fixtures, ExpectedStatus, Fixture};

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::domain::issue::Issue;
use crate::quote::{QuoteEngine, QuoteStatus};
use crate::validation::{self, MonotonicitySweep};

/// Result of one fixture evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureResult {
    pub name: String,
    pub industry: String,
    pub passed: bool,
    pub status: Option<QuoteStatus>,
    pub error_issues: usize,
    pub warnings: usize,
    /// Engine-level failure, for fixtures that never produced an outcome.
    pub error: Option<String>,
}

/// Aggregate of a full batch run. Exit code 2 (crash) never reaches a report;
/// it surfaces as an error from [`run_batch`] instead.
#[derive(Debug, Default, Serialize)]
pub struct HarnessReport {
    pub fixtures: Vec<FixtureResult>,
    pub monotonicity_violations: Vec<Issue>,
    pub fuzz_errors: Vec<Issue>,
}

impl HarnessReport {
    pub fn fixture_failures(&self) -> usize {
        self.fixtures.iter().filter(|f| !f.passed).count()
    }

    pub fn passed(&self) -> bool {
        self.fixture_failures() == 0
            && self.monotonicity_violations.is_empty()
            && self.fuzz_errors.is_empty()
    }

    /// 0 when everything holds, 1 when any fixture, sweep, or fuzz check
    /// failed.
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    pub fn log_summary(&self) {
        for fixture in &self.fixtures {
            if fixture.passed {
                info!(
                    fixture = %fixture.name,
                    industry = %fixture.industry,
                    status = ?fixture.status,
                    warnings = fixture.warnings,
                    "fixture passed"
                );
            } else {
                warn!(
                    fixture = %fixture.name,
                    industry = %fixture.industry,
                    status = ?fixture.status,
                    error = fixture.error.as_deref().unwrap_or("-"),
                    error_issues = fixture.error_issues,
                    "fixture FAILED"
                );
            }
        }
        for violation in &self.monotonicity_violations {
            warn!(%violation, "monotonicity violation");
        }
        if !self.fuzz_errors.is_empty() {
            warn!(
                count = self.fuzz_errors.len(),
                "validator rejected well-formed fuzz profiles"
            );
        }
        info!(
            fixtures = self.fixtures.len(),
            failures = self.fixture_failures(),
            monotonicity_violations = self.monotonicity_violations.len(),
            fuzz_errors = self.fuzz_errors.len(),
            exit_code = self.exit_code(),
            "batch complete"
        );
    }
}

fn evaluate_fixture(engine: &QuoteEngine, fixture: &Fixture) -> FixtureResult {
    let tariff = fixture.tariff.unwrap_or_else(|| engine.default_tariff());
    match engine.quote(&fixture.industry, &fixture.answers, &tariff) {
        Ok(outcome) => {
            let expected = match fixture.expected {
                ExpectedStatus::Validated => QuoteStatus::Validated,
                ExpectedStatus::Rejected => QuoteStatus::Rejected,
            };
            let error_issues = outcome.issues.iter().filter(|i| i.is_error()).count();
            FixtureResult {
                name: fixture.name.clone(),
                industry: fixture.industry.clone(),
                passed: outcome.status == expected,
                status: Some(outcome.status),
                error_issues,
                warnings: outcome.issues.len() - error_issues,
                error: None,
            }
        }
        Err(e) => FixtureResult {
            name: fixture.name.clone(),
            industry: fixture.industry.clone(),
            passed: false,
            status: None,
            error_issues: 0,
            warnings: 0,
            error: Some(e.to_string()),
        },
    }
}

/// Evaluate every fixture, run the monotonicity sweeps, and fuzz the
/// validator. Panics and configuration failures propagate as errors (exit 2);
/// everything else lands in the report.
pub async fn run_batch(
    engine: Arc<QuoteEngine>,
    fixtures: Vec<Fixture>,
    sweeps: &[MonotonicitySweep],
) -> Result<HarnessReport> {
    let mut report = HarnessReport::default();

    if engine.config().harness.parallel {
        let mut set = JoinSet::new();
        for fixture in fixtures {
            let engine = engine.clone();
            set.spawn(async move { evaluate_fixture(&engine, &fixture) });
        }
        while let Some(joined) = set.join_next().await {
            let result = joined.context("fixture task panicked")?;
            report.fixtures.push(result);
        }
        // Join order is nondeterministic; keep reports stable.
        report.fixtures.sort_by(|a, b| a.name.cmp(&b.name));
    } else {
        for fixture in &fixtures {
            report.fixtures.push(evaluate_fixture(&engine, fixture));
        }
    }

    report.monotonicity_violations = validation::run_all(engine.registry(), sweeps)
        .context("monotonicity sweep could not run")?;

    let harness_config = &engine.config().harness;
    report.fuzz_errors = validation::self_check(
        harness_config.fuzz_samples,
        harness_config.fuzz_seed,
        &engine.config().validation,
    );

    Ok(report)
}
