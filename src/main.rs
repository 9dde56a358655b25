use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use bess_quote_engine::config::EngineConfig;
use bess_quote_engine::harness::{self, builtin_fixtures, load_fixtures};
use bess_quote_engine::quote::QuoteEngine;
use bess_quote_engine::telemetry::init_tracing;
use bess_quote_engine::validation;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            error!(error = ?err, "batch harness crashed");
            2
        }
    };
    std::process::exit(code);
}

async fn run() -> anyhow::Result<i32> {
    let config = EngineConfig::load().context("failed to load engine configuration")?;

    let fixtures = match config.harness.fixtures_path.clone() {
        Some(path) => load_fixtures(&path)
            .await
            .with_context(|| format!("failed to load fixtures from {}", path.display()))?,
        None => builtin_fixtures(),
    };

    info!(
        fixtures = fixtures.len(),
        parallel = config.harness.parallel,
        "starting quote batch harness"
    );

    let engine = Arc::new(
        QuoteEngine::from_config(config)
            .await
            .context("failed to initialize quote engine")?,
    );

    let report = harness::run_batch(engine, fixtures, &validation::default_sweeps()).await?;
    report.log_summary();

    Ok(report.exit_code())
}
