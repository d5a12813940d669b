//! Configuration file handling for the expense tracker.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json` and contains the currency
//! selection, the exchange rate endpoint, and backup settings. The rate provider's app id is not
//! stored here; it comes from the environment.

use crate::backup::Backup;
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::CurrencyCode;
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const RATES_URL: &str = "https://openexchangerates.org/api/latest.json";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`. It provides
/// paths to other items that are expected in a certain location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its backups subdirectory, and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the home directory, e.g. `$HOME/expenses`
    /// - `base_currency` - The currency expense amounts are entered in
    /// - `target_currency` - The currency the converter starts out converting to
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        base_currency: CurrencyCode,
        target_currency: CurrencyCode,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")?;

        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            base_currency,
            target_currency,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;
        debug!("Created {}", config_path.display());

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the backups directory exists
    /// - return the loaded configuration object
    pub async fn load(expenses_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = expenses_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The expenses home is missing, run 'expenses init' first")
            .pub_result(ErrorType::Config)?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            return Err(Error::new(
                ErrorType::Config,
                format!("The config file is missing '{}'", config_path.display()),
            ));
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            backups: root.join(BACKUPS),
            root,
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            return Err(Error::new(
                ErrorType::Config,
                format!(
                    "The backups directory is missing '{}'",
                    config.backups.display()
                ),
            ));
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.config_file.base_currency
    }

    pub fn target_currency(&self) -> &CurrencyCode {
        &self.config_file.target_currency
    }

    pub fn rates_url(&self) -> &str {
        &self.config_file.rates_url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.request_timeout_secs)
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Changes the base currency and saves `config.json`. Nothing changes if the save fails.
    pub async fn set_base_currency(&mut self, base: CurrencyCode) -> Result<()> {
        if self.config_file.base_currency == base {
            return Ok(());
        }
        let mut next = self.config_file.clone();
        next.base_currency = base;
        next.save(&self.config_path).await?;
        self.config_file = next;
        Ok(())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "base_currency": "USD",
///   "target_currency": "EUR",
///   "rates_url": "https://openexchangerates.org/api/latest.json",
///   "request_timeout_secs": 30,
///   "backup_copies": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    #[serde(default = "CurrencyCode::usd")]
    base_currency: CurrencyCode,

    #[serde(default = "CurrencyCode::eur")]
    target_currency: CurrencyCode,

    /// The `latest.json` endpoint of the rate provider
    #[serde(default = "default_rates_url")]
    rates_url: String,

    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,
}

fn default_rates_url() -> String {
    RATES_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_currency: CurrencyCode::usd(),
            target_currency: CurrencyCode::eur(),
            rates_url: default_rates_url(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            backup_copies: BACKUP_COPIES,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: &Path) -> Result<Self> {
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
            .pub_result(ErrorType::Config)?;

        if config.app_name != APP_NAME {
            return Err(Error::new(
                ErrorType::Config,
                format!(
                    "Invalid app_name in config file: expected '{APP_NAME}', got '{}'",
                    config.app_name
                ),
            ));
        }

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)
            .context("Unable to serialize config")
            .pub_result(ErrorType::Internal)?;
        utils::write_replace(path, data)
            .await
            .context("Unable to write config file")
            .pub_result(ErrorType::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("expenses_home");
        let gbp = CurrencyCode::from_str("GBP").unwrap();

        let config = Config::create(&home_dir, gbp.clone(), CurrencyCode::eur())
            .await
            .unwrap();

        assert_eq!(config.base_currency(), &gbp);
        assert_eq!(config.target_currency(), &CurrencyCode::eur());
        assert_eq!(config.rates_url(), RATES_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.backup_copies(), 5);
        assert!(config.backups().is_dir());
        assert!(config.config_path().is_file());

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.base_currency(), &gbp);
        assert_eq!(loaded.root(), config.root());
    }

    #[tokio::test]
    async fn test_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(err.is(ErrorType::Config));
    }

    #[tokio::test]
    async fn test_load_missing_backups_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), CurrencyCode::usd(), CurrencyCode::eur())
            .await
            .unwrap();
        tokio::fs::remove_dir(config.backups()).await.unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.is(ErrorType::Config));
        assert!(err.to_string().contains("backups directory"));
    }

    #[tokio::test]
    async fn test_set_base_currency_is_saved() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::create(dir.path(), CurrencyCode::usd(), CurrencyCode::eur())
            .await
            .unwrap();
        let jpy = CurrencyCode::from_str("jpy").unwrap();
        config.set_base_currency(jpy.clone()).await.unwrap();
        assert_eq!(config.base_currency(), &jpy);

        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(loaded.base_currency(), &jpy);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "expenses",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "backup_copies": 5
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let err = ConfigFile::load(&config_path).await.unwrap_err();
        assert!(err.is(ErrorType::Config));
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_invalid_currency() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "expenses",
            "config_version": 1,
            "base_currency": "dollars"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let err = ConfigFile::load(&config_path).await.unwrap_err();
        assert!(err.is(ErrorType::Config));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let t = TempDir::new().unwrap();
        let path = t.path().join("file.json");
        let original = ConfigFile {
            base_currency: CurrencyCode::from_str("CAD").unwrap(),
            request_timeout_secs: 3,
            backup_copies: 9,
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        let read = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, read);
    }
}
