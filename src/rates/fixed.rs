//! Implements the `RatesClient` trait using an in-memory table.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without calling the rate provider.

use crate::error::{Error, ErrorType};
use crate::model::CurrencyCode;
use crate::rates::{RateMapping, RatesClient};
use crate::Result;
use std::collections::HashMap;
use std::str::FromStr;

/// Seed rates, relative to USD.
const USD_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.5),
    ("CAD", 1.36),
    ("AUD", 1.52),
    ("CHF", 0.88),
];

/// A `RatesClient` that answers from a table instead of the network. Bases that are not in the
/// table fail the way an unsupported base fails at the provider.
#[derive(Debug, Clone)]
pub struct FixedRates {
    table: HashMap<CurrencyCode, RateMapping>,
}

impl FixedRates {
    /// A client that knows no bases at all.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Adds (or replaces) the answer for `base`.
    pub fn with<S: Into<String>>(
        mut self,
        base: CurrencyCode,
        rates: impl IntoIterator<Item = (S, f64)>,
    ) -> Self {
        let mapping = RateMapping::new(base.clone(), rates);
        self.table.insert(base, mapping);
        self
    }
}

impl Default for FixedRates {
    /// Cross rates between every currency in the seed table.
    fn default() -> Self {
        let mut fixed = Self::empty();
        for (base, base_rate) in USD_RATES {
            let Ok(code) = CurrencyCode::from_str(base) else {
                continue;
            };
            let rates = USD_RATES
                .iter()
                .map(|(other, other_rate)| (*other, other_rate / base_rate));
            fixed = fixed.with(code, rates);
        }
        fixed
    }
}

#[async_trait::async_trait]
impl RatesClient for FixedRates {
    async fn latest(&self, base: &CurrencyCode) -> Result<RateMapping> {
        self.table.get(base).cloned().ok_or_else(|| {
            Error::new(
                ErrorType::Network,
                format!("Failed to fetch exchange rates for {base}: unsupported base currency"),
            )
        })
    }
}
