//! Implements the `RatesClient` trait against the Open Exchange Rates `latest.json` endpoint.

use crate::error::{Error, ErrorType, IntoResult};
use crate::model::CurrencyCode;
use crate::rates::{AppId, RateMapping, RatesClient};
use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// The body of a `latest.json` response. Only `rates` is required.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: HashMap<String, f64>,
}

/// Fetches rates from Open Exchange Rates with a single GET per call and no retries.
pub struct OpenExchangeRates {
    client: reqwest::Client,
    url: Url,
    app_id: AppId,
}

impl OpenExchangeRates {
    /// # Errors
    /// A `Config` error if `url` is not a valid URL or the HTTP client cannot be built.
    pub fn new(url: &str, app_id: AppId, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)
            .with_context(|| format!("Invalid rates URL '{url}'"))
            .pub_result(ErrorType::Config)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to build the HTTP client")
            .pub_result(ErrorType::Config)?;
        Ok(Self {
            client,
            url,
            app_id,
        })
    }

    /// The request URL for `base`, with the `app_id` and `base` query parameters added.
    fn request_url(&self, base: &CurrencyCode) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("app_id", self.app_id.expose())
            .append_pair("base", base.as_str());
        url
    }
}

#[async_trait::async_trait]
impl RatesClient for OpenExchangeRates {
    async fn latest(&self, base: &CurrencyCode) -> Result<RateMapping> {
        debug!("Fetching exchange rates for {base} from {}", self.url);
        let response = self
            .client
            .get(self.request_url(base))
            .send()
            .await
            // reqwest includes the URL, and therefore the app id, in its errors
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to fetch exchange rates for {base}"))
            .pub_result(ErrorType::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            trace!("Rate provider error body: {body}");
            return Err(Error::new(
                ErrorType::Network,
                format!("Failed to fetch exchange rates for {base}: provider returned {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to read the exchange rate response for {base}"))
            .pub_result(ErrorType::Network)?;
        parse_latest(base, &body)
    }
}

/// Parses a `latest.json` body into a `RateMapping` for `base`.
pub(super) fn parse_latest(base: &CurrencyCode, body: &str) -> Result<RateMapping> {
    let parsed: LatestResponse = serde_json::from_str(body)
        .with_context(|| format!("The exchange rate response for {base} is malformed"))
        .pub_result(ErrorType::Parse)?;
    let mapping = RateMapping::new(base.clone(), parsed.rates);
    debug!("Received {} rates for {base}", mapping.len());
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn client() -> OpenExchangeRates {
        OpenExchangeRates::new(
            "https://openexchangerates.org/api/latest.json",
            AppId::new(Some("my id".into())).unwrap(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_request_url() {
        let url = client().request_url(&CurrencyCode::from_str("GBP").unwrap());
        assert_eq!(
            url.as_str(),
            "https://openexchangerates.org/api/latest.json?app_id=my+id&base=GBP"
        );
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = OpenExchangeRates::new(
            "not a url",
            AppId::new(Some("x".into())).unwrap(),
            Duration::from_secs(5),
        )
        .err()
        .unwrap();
        assert!(err.is(ErrorType::Config));
    }

    #[test]
    fn test_parse_latest() {
        let body = r#"{
            "disclaimer": "Usage subject to terms",
            "timestamp": 1449877801,
            "base": "USD",
            "rates": {"EUR": 0.9, "GBP": 0.79, "JPY": 149.5}
        }"#;
        let mapping = parse_latest(&CurrencyCode::usd(), body).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.rate(&CurrencyCode::eur()), Some(0.9));
    }

    #[test]
    fn test_parse_latest_malformed() {
        for body in ["", "not json", r#"{"base":"USD"}"#, r#"{"rates":{"EUR":"x"}}"#] {
            let err = parse_latest(&CurrencyCode::usd(), body).unwrap_err();
            assert!(err.is(ErrorType::Parse), "{body}");
        }
    }
}
