//! The currency converter: the amount and target currency the user entered, the rates for the
//! current base currency, and the converted amount derived from them.
//!
//! Fetching is split into `begin_fetch`, which hands out a `FetchTicket`, and `complete`, which
//! applies a result. Every ticket carries a generation number and only the most recently issued
//! ticket's result is applied, so a slow response for an old base currency can never overwrite
//! the rates for the new one.

use crate::error::{Error, ErrorType};
use crate::model::{Amount, CurrencyCode};
use crate::rates::{RateMapping, RatesClient};
use crate::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::{debug, warn};

/// Where the converter is in its fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RatesState {
    /// No fetch has been started.
    Idle,
    /// A fetch is in flight; conversions are not available.
    Loading,
    /// The latest fetch succeeded.
    Ready(RateMapping),
    /// The latest fetch failed.
    Error { error_type: ErrorType, message: String },
}

/// Identifies one fetch. Hand it back to `Converter::complete` with the result.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FetchTicket {
    generation: u64,
    base: CurrencyCode,
}

impl FetchTicket {
    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Whether a completed fetch was applied.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Applied {
    Current,
    /// A newer fetch had been started; the result was discarded.
    Stale,
}

/// A displayable conversion result, e.g. `100 USD = 90.00 EUR`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Conversion {
    pub amount: Decimal,
    pub base: CurrencyCode,
    pub converted: Decimal,
    pub target: CurrencyCode,
}

impl Display for Conversion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} = {:.2} {}",
            self.amount.normalize(),
            self.base,
            self.converted.round_dp(2),
            self.target
        )
    }
}

#[derive(Debug, Clone)]
pub struct Converter {
    base: CurrencyCode,
    target: CurrencyCode,
    amount: String,
    state: RatesState,
    generation: u64,
}

impl Converter {
    /// A converter in the `Idle` state with the amount set to `1`.
    pub fn new(base: CurrencyCode, target: CurrencyCode) -> Self {
        Self {
            base,
            target,
            amount: "1".to_string(),
            state: RatesState::Idle,
            generation: 0,
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn target(&self) -> &CurrencyCode {
        &self.target
    }

    /// The amount exactly as the user typed it.
    pub fn amount_input(&self) -> &str {
        &self.amount
    }

    pub fn state(&self) -> &RatesState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RatesState::Loading)
    }

    /// The current rates, only while `Ready`.
    pub fn rates(&self) -> Option<&RateMapping> {
        match &self.state {
            RatesState::Ready(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// The error message of the last fetch, only while in `Error`.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            RatesState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn set_amount(&mut self, input: impl Into<String>) {
        self.amount = input.into();
    }

    pub fn set_target(&mut self, target: CurrencyCode) {
        self.target = target;
    }

    /// Enters `Loading` for the current base, clearing any rates on display.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.state = RatesState::Loading;
        debug!("Starting rate fetch {} for {}", self.generation, self.base);
        FetchTicket {
            generation: self.generation,
            base: self.base.clone(),
        }
    }

    /// Changes the base currency and then starts a fetch for it.
    pub fn select_base(&mut self, base: CurrencyCode) -> FetchTicket {
        self.base = base;
        self.begin_fetch()
    }

    /// Applies the outcome of the fetch identified by `ticket`, unless a newer fetch has been
    /// started since.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<RateMapping>) -> Applied {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale rates for {} (fetch {}, current {})",
                ticket.base, ticket.generation, self.generation
            );
            return Applied::Stale;
        }
        self.state = match result {
            Ok(mapping) => RatesState::Ready(mapping),
            Err(e) => {
                warn!("Error fetching exchange rates: {e:#}");
                RatesState::Error {
                    error_type: e.error_type(),
                    message: format!("{e}. Please try again later."),
                }
            }
        };
        Applied::Current
    }

    /// Fetches rates for the current base with `client` and applies them. A failed fetch leaves the
    /// converter in `Error` and is also returned.
    pub async fn refresh(&mut self, client: &dyn RatesClient) -> Result<()> {
        let ticket = self.begin_fetch();
        self.fetch_and_complete(ticket, client).await
    }

    /// Runs the fetch for `ticket` and applies it. A failed fetch is also returned.
    pub async fn fetch_and_complete(
        &mut self,
        ticket: FetchTicket,
        client: &dyn RatesClient,
    ) -> Result<()> {
        let (ticket, result) = fetch(client, ticket).await;
        let failure = result
            .as_ref()
            .err()
            .map(|e| Error::new(e.error_type(), format!("{e:#}")));
        self.complete(ticket, result);
        failure.map_or(Ok(()), Err)
    }

    /// `amount × rate[target]`, or `None` if rates are not ready, the target is not in the
    /// mapping, or the amount is not a number.
    pub fn converted(&self) -> Option<Decimal> {
        let rates = self.rates()?;
        let amount = parse_input_amount(&self.amount)?;
        let rate = rate_to_decimal(rates.rate(&self.target)?)?;
        amount.checked_mul(rate)
    }

    /// The converted amount together with what it was converted from.
    pub fn conversion(&self) -> Option<Conversion> {
        let converted = self.converted()?;
        Some(Conversion {
            amount: parse_input_amount(&self.amount)?,
            base: self.base.clone(),
            converted,
            target: self.target.clone(),
        })
    }
}

/// Runs the fetch for `ticket`. This borrows nothing from the converter, so several fetches can be
/// in flight while the user keeps editing.
pub async fn fetch(
    client: &dyn RatesClient,
    ticket: FetchTicket,
) -> (FetchTicket, Result<RateMapping>) {
    let result = client.latest(&ticket.base).await;
    (ticket, result)
}

/// Empty or non-numeric input is "no amount" rather than zero or NaN.
fn parse_input_amount(input: &str) -> Option<Decimal> {
    if input.trim().is_empty() {
        return None;
    }
    Amount::from_str(input).ok().map(|a| a.value())
}

/// Converts through the shortest decimal representation so `0.9` is exactly `0.9`.
fn rate_to_decimal(rate: f64) -> Option<Decimal> {
    Decimal::from_str(&rate.to_string())
        .or_else(|_| Decimal::from_scientific(&format!("{rate:e}")))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::FixedRates;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::from_str(s).unwrap()
    }

    fn ready(base: &str, rates: &[(&str, f64)]) -> Converter {
        let mut c = Converter::new(code(base), code("EUR"));
        let ticket = c.begin_fetch();
        let mapping = RateMapping::new(code(base), rates.iter().copied());
        assert_eq!(c.complete(ticket, Ok(mapping)), Applied::Current);
        c
    }

    #[test]
    fn test_hundred_usd_to_eur() {
        let mut c = ready("USD", &[("EUR", 0.9)]);
        c.set_amount("100");
        assert_eq!(c.converted(), Some(Decimal::from_str("90.0").unwrap()));
        assert_eq!(c.conversion().unwrap().to_string(), "100 USD = 90.00 EUR");
    }

    #[test]
    fn test_recomputes_on_amount_and_target_change() {
        let mut c = ready("USD", &[("EUR", 0.9), ("GBP", 0.8)]);
        c.set_amount("10");
        assert_eq!(c.conversion().unwrap().to_string(), "10 USD = 9.00 EUR");
        c.set_target(code("GBP"));
        assert_eq!(c.conversion().unwrap().to_string(), "10 USD = 8.00 GBP");
        c.set_amount("2.5");
        assert_eq!(c.conversion().unwrap().to_string(), "2.5 USD = 2.00 GBP");
    }

    #[test]
    fn test_missing_target_has_no_conversion() {
        let mut c = ready("USD", &[("EUR", 0.9)]);
        c.set_target(code("JPY"));
        assert_eq!(c.converted(), None);
        assert!(c.conversion().is_none());
    }

    #[test]
    fn test_empty_or_garbage_amount_has_no_conversion() {
        let mut c = ready("USD", &[("EUR", 0.9)]);
        for input in ["", "   ", "abc", "1.2.3"] {
            c.set_amount(input);
            assert_eq!(c.converted(), None, "{input:?}");
            assert!(c.conversion().is_none());
        }
    }

    #[test]
    fn test_no_conversion_while_loading() {
        let mut c = ready("USD", &[("EUR", 0.9)]);
        let _ticket = c.begin_fetch();
        assert!(c.is_loading());
        assert!(c.rates().is_none());
        assert_eq!(c.converted(), None);
    }

    #[test]
    fn test_error_clears_rates() {
        let mut c = ready("USD", &[("EUR", 0.9)]);
        let ticket = c.begin_fetch();
        let err = Error::new(ErrorType::Network, "Failed to fetch exchange rates");
        c.complete(ticket, Err(err));
        assert!(c.rates().is_none());
        assert_eq!(c.converted(), None);
        match c.state() {
            RatesState::Error { error_type, message } => {
                assert_eq!(*error_type, ErrorType::Network);
                assert!(message.contains("Please try again later"));
            }
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[test]
    fn test_late_response_for_old_base_is_discarded() {
        let mut c = Converter::new(code("USD"), code("EUR"));
        let usd_ticket = c.begin_fetch();
        let gbp_ticket = c.select_base(code("GBP"));
        assert_eq!(c.base(), &code("GBP"));

        let gbp = RateMapping::new(code("GBP"), [("EUR", 1.17)]);
        let usd = RateMapping::new(code("USD"), [("EUR", 0.92)]);
        assert_eq!(c.complete(gbp_ticket, Ok(gbp.clone())), Applied::Current);
        assert_eq!(c.complete(usd_ticket, Ok(usd)), Applied::Stale);
        assert_eq!(c.rates(), Some(&gbp));
    }

    #[test]
    fn test_stale_error_does_not_replace_rates() {
        let mut c = Converter::new(code("USD"), code("EUR"));
        let old = c.begin_fetch();
        let new = c.begin_fetch();
        let mapping = RateMapping::new(code("USD"), [("EUR", 0.9)]);
        c.complete(new, Ok(mapping.clone()));
        let err = Error::new(ErrorType::Network, "timeout");
        assert_eq!(c.complete(old, Err(err)), Applied::Stale);
        assert_eq!(c.rates(), Some(&mapping));
    }

    #[tokio::test]
    async fn test_refresh() {
        let client = FixedRates::empty().with(code("USD"), [("EUR", 0.5)]);
        let mut c = Converter::new(code("USD"), code("EUR"));
        assert_eq!(c.state(), &RatesState::Idle);
        c.refresh(&client).await.unwrap();
        c.set_amount("3");
        assert_eq!(c.conversion().unwrap().to_string(), "3 USD = 1.50 EUR");

        c.select_base(code("GBP"));
        let err = c.refresh(&client).await.unwrap_err();
        assert!(err.is(ErrorType::Network));
        assert!(c.error().is_some());
    }

    #[test]
    fn test_rate_to_decimal() {
        assert_eq!(rate_to_decimal(0.9), Some(Decimal::from_str("0.9").unwrap()));
        assert_eq!(
            rate_to_decimal(149.5),
            Some(Decimal::from_str("149.5").unwrap())
        );
        assert!(rate_to_decimal(1e-7).is_some());
    }
}
