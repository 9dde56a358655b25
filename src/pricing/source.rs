use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::catalog;
use super::table::{PricingTable, TierRecord};

/// Where tier records come from. Narrow on purpose: a source only hands back
/// raw rows, the table constructor owns validation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PricingConfigSource: Send + Sync {
    async fn load(&self) -> Result<Vec<TierRecord>>;

    fn name(&self) -> String;
}

/// The compiled-in catalog.
pub struct StaticCatalogSource;

#[async_trait]
impl PricingConfigSource for StaticCatalogSource {
    async fn load(&self) -> Result<Vec<TierRecord>> {
        Ok(catalog::builtin_records())
    }

    fn name(&self) -> String {
        "builtin catalog".to_string()
    }
}

#[derive(Debug, Deserialize)]
struct TierFile {
    tier: Vec<TierRecord>,
}

/// Tier rows from a TOML file of `[[tier]]` tables.
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(text: &str) -> Result<Vec<TierRecord>> {
        let file: TierFile = toml::from_str(text).context("malformed tier file")?;
        Ok(file.tier)
    }
}

#[async_trait]
impl PricingConfigSource for TomlFileSource {
    async fn load(&self) -> Result<Vec<TierRecord>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading tier file {}", self.path.display()))?;
        Self::parse(&text)
    }

    fn name(&self) -> String {
        format!("tier file {}", self.path.display())
    }
}

/// Shared handle to the current validated price table. Reload builds and
/// validates a whole new table before swapping it in, so readers never observe
/// a partial or invalid table and a failed reload keeps the previous one.
pub struct PricingSnapshot {
    inner: RwLock<Arc<PricingTable>>,
}

impl PricingSnapshot {
    pub fn new(table: PricingTable) -> Self {
        Self {
            inner: RwLock::new(Arc::new(table)),
        }
    }

    /// Build the initial snapshot from a source.
    pub async fn from_source(source: &dyn PricingConfigSource) -> Result<Self> {
        let records = source.load().await?;
        let table = PricingTable::from_records(records)?;
        info!(source = %source.name(), bands = table.band_count(), "pricing table loaded");
        Ok(Self::new(table))
    }

    /// Cheap clone of the current table.
    pub fn current(&self) -> Arc<PricingTable> {
        self.inner.read().clone()
    }

    /// Atomically replace the table.
    pub fn replace(&self, table: PricingTable) {
        *self.inner.write() = Arc::new(table);
    }

    /// Fetch, validate, and swap. On any failure the error propagates and the
    /// snapshot is untouched.
    pub async fn reload_from(&self, source: &dyn PricingConfigSource) -> Result<()> {
        let records = source.load().await?;
        let table = PricingTable::from_records(records)?;
        info!(source = %source.name(), bands = table.band_count(), "pricing table reloaded");
        self.replace(table);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfidenceLevel;
    use crate::pricing::table::{DataGrade, SizeQuery};
    use anyhow::anyhow;

    #[tokio::test]
    async fn test_static_source_round_trip() {
        let snapshot = PricingSnapshot::from_source(&StaticCatalogSource).await.unwrap();
        let table = snapshot.current();
        assert!(table
            .resolve("bess", SizeQuery::PowerKw(100.0), ConfidenceLevel::Mid)
            .is_ok());
    }

    #[test]
    fn test_toml_parse() {
        let text = r#"
            [[tier]]
            category = "bess"
            axis = "power_kw"
            price_unit = "usd_per_kwh"
            min = 0.0
            max = 500.0
            low = 380.0
            low_plus = 420.0
            mid = 460.0
            mid_plus = 520.0
            high = 580.0

            [[tier]]
            category = "bess"
            axis = "power_kw"
            price_unit = "usd_per_kwh"
            min = 500.0
            low = 330.0
            low_plus = 360.0
            mid = 395.0
            mid_plus = 440.0
            high = 490.0
            data_source = "q3_vendor_refresh"
            confidence = "high"
        "#;
        let records = TomlFileSource::parse(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].max, Some(500.0));
        // Provenance columns are optional and default when absent.
        assert_eq!(records[0].confidence, DataGrade::Mid);
        assert!(records[0].data_source.is_empty());
        assert_eq!(records[1].max, None);
        assert_eq!(records[1].confidence, DataGrade::High);
        assert_eq!(records[1].data_source, "q3_vendor_refresh");
        assert!(PricingTable::from_records(records).is_ok());
    }

    #[test]
    fn test_toml_parse_rejects_garbage() {
        assert!(TomlFileSource::parse("tier = 12").is_err());
    }

    #[tokio::test]
    async fn test_missing_tier_file_errors() {
        let source = TomlFileSource::new("/definitely/not/here.toml");
        assert!(source.load().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_the_previous_table() {
        let snapshot = PricingSnapshot::from_source(&StaticCatalogSource).await.unwrap();
        let before = snapshot.current().band_count();

        let mut failing = MockPricingConfigSource::new();
        failing.expect_load().returning(|| Err(anyhow!("source offline")));
        failing.expect_name().return_const("mock".to_string());

        assert!(snapshot.reload_from(&failing).await.is_err());
        assert_eq!(snapshot.current().band_count(), before);
    }

    #[tokio::test]
    async fn test_invalid_records_never_reach_the_snapshot() {
        let snapshot = PricingSnapshot::from_source(&StaticCatalogSource).await.unwrap();
        let before = snapshot.current().band_count();

        let mut invalid = MockPricingConfigSource::new();
        invalid.expect_load().returning(|| {
            // A lone band starting above zero fails table validation.
            let mut records = catalog::builtin_records();
            records.retain(|r| r.category == "bess" && r.min > 0.0);
            Ok(records)
        });
        invalid.expect_name().return_const("mock".to_string());

        assert!(snapshot.reload_from(&invalid).await.is_err());
        assert_eq!(snapshot.current().band_count(), before);
    }

    #[tokio::test]
    async fn test_successful_reload_swaps_atomically() {
        let snapshot = PricingSnapshot::from_source(&StaticCatalogSource).await.unwrap();

        let mut smaller = MockPricingConfigSource::new();
        smaller.expect_load().returning(|| {
            let mut records = catalog::builtin_records();
            records.retain(|r| r.category == "bess");
            Ok(records)
        });
        smaller.expect_name().return_const("mock".to_string());

        snapshot.reload_from(&smaller).await.unwrap();
        assert_eq!(snapshot.current().categories().count(), 1);
    }
}
