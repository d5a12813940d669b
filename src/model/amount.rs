//! Amount type for handling monetary values entered by the user.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Amounts are stored as JSON
//! numbers, but strings are accepted on read so that a hand-edited storage file with values like
//! `"1,250.00"` still loads.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents an amount of money in the tracker's base currency.
///
/// Amounts hold at most two decimal places; parsing rounds anything finer away (half to even).
///
/// ```
/// # use expense_tracker::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("12.5").unwrap();
/// assert_eq!(amount.to_string(), "12.50");
/// ```
///
/// Thousands separators are accepted when parsing:
/// ```
/// # use expense_tracker::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("1,000").unwrap();
/// let b = Amount::from_str("1000.00").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.grouped(), "1,000.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Wraps `value`, rounded to two decimal places.
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp(2))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Adds `rhs`, or `None` if the result is out of range.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Sums `amounts`, or `None` if the total is out of range.
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Option<Amount> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |total, amount| total.checked_add(amount))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero. Negative zero is not negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Formats with thousands separators, e.g. `1,234.50`.
    pub fn grouped(&self) -> String {
        let (sign, num) = if self.is_negative() {
            ("-", self.0.abs())
        } else {
            ("", self.0)
        };
        format!(
            "{sign}{}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError {
    input: String,
    source: rust_decimal::Error,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.source, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid amount: {}", self.input, self.source)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses a decimal number, ignoring surrounding whitespace and commas, and rounds it to two
    /// places. Unlike a spreadsheet cell, an empty string is not zero here; it is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let without_commas = s.trim().replace(',', "");
        Decimal::from_str(&without_commas)
            .map(Amount::new)
            .map_err(|source| AmountError {
                input: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0.round_dp(2))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Parsing the decimal text gives the nearest f64, whose shortest form is the same text for
        // any amount with at most 15 significant digits.
        match self.0.round_dp(2).normalize().to_string().parse::<f64>() {
            Ok(f) => serializer.serialize_f64(f),
            Err(e) => Err(serde::ser::Error::custom(format!(
                "amount {} cannot be represented as a number: {e}",
                self.0
            ))),
        }
    }
}

/// What an amount may look like in a storage file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Going through the shortest decimal representation keeps `12.1` as `12.1` rather than
        // the nearest binary fraction.
        let s = match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s,
        };
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
