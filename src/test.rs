//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::error::{Error, ErrorType};
use crate::model::{Amount, Category, CurrencyCode, NewExpense};
use crate::rates::{RateMapping, RatesClient};
use crate::storage::FileStorage;
use crate::tracker::Tracker;
use crate::{Config, Result};
use chrono::NaiveDate;
use std::str::FromStr;
use std::time::Duration;
use tempfile::TempDir;

/// Test environment that sets up an expenses home directory with a Config.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a USD base and EUR target.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("expenses");
        let config = Config::create(&root, CurrencyCode::usd(), CurrencyCode::eur())
            .await
            .unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Storage in the home directory, as the commands use it.
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(self.config.root())
    }

    /// Opens a tracker over the home directory's storage.
    pub async fn tracker(&self) -> Tracker {
        Tracker::open(self.config(), Box::new(self.storage()))
            .await
            .unwrap()
    }

    /// Writes `raw` as the stored expense collection.
    pub async fn put_stored(&self, raw: &str) {
        let path = self.storage().path(crate::store::STORAGE_KEY);
        crate::utils::write(&path, raw).await.unwrap();
    }

    /// Reads the stored expense collection.
    pub async fn stored(&self) -> Option<String> {
        let path = self.storage().path(crate::store::STORAGE_KEY);
        crate::utils::read_optional(&path).await.unwrap()
    }

    /// Names of the files in the backups directory, sorted.
    pub async fn backups(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut dir = crate::utils::read_dir(self.config.backups()).await.unwrap();
        while let Some(entry) = dir.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        names
    }
}

pub fn new_expense(description: &str, amount: &str, category: Category) -> NewExpense {
    NewExpense::new(
        description,
        Amount::from_str(amount).unwrap(),
        category,
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
    )
}

pub fn code(s: &str) -> CurrencyCode {
    CurrencyCode::from_str(s).unwrap()
}

/// A `RatesClient` that always fails with the given error type.
pub struct FailingRates(pub ErrorType);

#[async_trait::async_trait]
impl RatesClient for FailingRates {
    async fn latest(&self, base: &CurrencyCode) -> Result<RateMapping> {
        Err(Error::new(
            self.0,
            format!("Failed to fetch exchange rates for {base}"),
        ))
    }
}

/// A `RatesClient` that answers with a single `rate` per base after a per-base delay.
pub struct DelayedRates {
    delays: Vec<(CurrencyCode, Duration, f64)>,
}

impl DelayedRates {
    pub fn new(delays: &[(&str, u64, f64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(c, ms, rate)| (code(c), Duration::from_millis(*ms), *rate))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl RatesClient for DelayedRates {
    async fn latest(&self, base: &CurrencyCode) -> Result<RateMapping> {
        let (_, delay, rate) = self
            .delays
            .iter()
            .find(|(c, _, _)| c == base)
            .ok_or_else(|| Error::new(ErrorType::Network, format!("unsupported base {base}")))?;
        tokio::time::sleep(*delay).await;
        Ok(RateMapping::new(base.clone(), [("EUR", *rate)]))
    }
}
