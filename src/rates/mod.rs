//! Exchange rate lookup.
//!
//! The `RatesClient` trait is the seam between the currency converter and the outside world. The
//! live implementation calls the Open Exchange Rates `latest.json` endpoint; the fixed
//! implementation answers from an in-process table so that the whole program can run without
//! network access.

mod fixed;
mod open_exchange;

use crate::error::{Error, ErrorType};
use crate::model::CurrencyCode;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use tracing::warn;

pub use fixed::FixedRates;
pub use open_exchange::OpenExchangeRates;

/// The environment variable holding the Open Exchange Rates app id.
pub const APP_ID_ENV: &str = "OPEN_EXCHANGE_RATES_APP_ID";

/// When this environment variable is set and non-empty the program uses `FixedRates` instead of
/// calling the rate provider.
pub const TEST_MODE_ENV: &str = "EXPENSES_IN_TEST_MODE";

/// Fetches the latest conversion factors for a base currency.
#[async_trait::async_trait]
pub trait RatesClient: Send + Sync {
    /// Makes one attempt to fetch the rates for `base`.
    ///
    /// # Errors
    /// - `Network` for transport failures and non-success responses.
    /// - `Parse` if the response body is not a rate mapping.
    async fn latest(&self, base: &CurrencyCode) -> Result<RateMapping>;
}

/// Conversion factors from one base currency to other currencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateMapping {
    base: CurrencyCode,
    rates: BTreeMap<String, f64>,
}

impl RateMapping {
    /// Keeps only positive, finite factors; anything else is logged and dropped.
    pub fn new<S: Into<String>>(
        base: CurrencyCode,
        rates: impl IntoIterator<Item = (S, f64)>,
    ) -> Self {
        let rates = rates
            .into_iter()
            .map(|(code, rate)| (code.into(), rate))
            .filter(|(code, rate)| {
                let ok = rate.is_finite() && *rate > 0.0;
                if !ok {
                    warn!("Ignoring unusable rate {rate} for {code}");
                }
                ok
            })
            .collect();
        Self { base, rates }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// The factor for `code`, if the provider returned one.
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code.as_str()).copied()
    }

    pub fn rates(&self) -> &BTreeMap<String, f64> {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// The credential for the rate provider. It is never printed.
#[derive(Clone, Eq, PartialEq)]
pub struct AppId(String);

impl AppId {
    /// # Errors
    /// A `Config` error if `value` is missing or blank.
    pub fn new(value: Option<String>) -> Result<Self> {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => Ok(Self(v)),
            _ => Err(Error::new(
                ErrorType::Config,
                format!("{APP_ID_ENV} is not set; an Open Exchange Rates app id is required"),
            )),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var(APP_ID_ENV).ok())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for AppId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("AppId(***)")
    }
}

/// Whether rates come from the provider or from the fixed in-process table.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Live,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// Creates the rates client for `mode`. In `Mode::Live` the app id is required and is checked
/// before anything else happens.
pub fn rates_client(
    config: &Config,
    mode: Mode,
    app_id: Option<String>,
) -> Result<Box<dyn RatesClient>> {
    match mode {
        Mode::Live => {
            let app_id = AppId::new(app_id)?;
            let client = OpenExchangeRates::new(config.rates_url(), app_id, config.request_timeout())?;
            Ok(Box::new(client))
        }
        Mode::Test => Ok(Box::new(FixedRates::default())),
    }
}
