use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Amount, Category};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The format dates are entered, stored and displayed in.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The largest accepted amount in cents, 999,999,999,999.99. Amounts up to this size are stored as
/// JSON numbers without loss.
const MAX_AMOUNT_CENTS: i64 = 99_999_999_999_999;

/// The opaque, unique identifier of an expense. It is assigned when the expense is added and never
/// changes afterwards.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    /// A new random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ExpenseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExpenseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExpenseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A recorded expense.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    id: ExpenseId,
    description: String,
    amount: Amount,
    category: Category,
    date: NaiveDate,
}

impl Expense {
    pub(crate) fn from_new(id: ExpenseId, new: NewExpense) -> Self {
        Self {
            id,
            description: new.description,
            amount: new.amount,
            category: new.category,
            date: new.date,
        }
    }

    /// Builds a full record, e.g. the result of editing an existing one. The record is not
    /// validated until it reaches the store.
    pub fn new(
        id: ExpenseId,
        description: impl Into<String>,
        amount: Amount,
        category: Category,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            amount,
            category,
            date,
        }
    }

    pub fn id(&self) -> &ExpenseId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Checks the invariants of a stored expense.
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)
    }
}

/// An expense that has not been added yet, i.e. one without an identifier.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    description: String,
    amount: Amount,
    category: Category,
    date: NaiveDate,
}

impl NewExpense {
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        category: Category,
        date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category,
            date,
        }
    }

    /// Builds a `NewExpense` from the text a user typed into the expense form. `date` defaults to
    /// today when it is `None`.
    ///
    /// # Errors
    /// Returns a `Validation` error if the amount, category or date cannot be parsed, or if the
    /// amount is negative.
    pub fn from_input(
        description: &str,
        amount: &str,
        category: &str,
        date: Option<&str>,
    ) -> Result<Self> {
        let amount = parse_amount(amount)?;
        let category = Category::from_str(category)?;
        let date = match date {
            Some(d) => parse_date(d)?,
            None => chrono::Local::now().date_naive(),
        };
        let new = Self::new(description.trim(), amount, category, date);
        new.validate()?;
        Ok(new)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)
    }
}

/// Parses user-entered amount text.
pub fn parse_amount(s: &str) -> Result<Amount> {
    Amount::from_str(s)
        .context("Invalid amount")
        .pub_result(ErrorType::Validation)
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
        .pub_result(ErrorType::Validation)
}

/// Sums `amounts`.
///
/// # Errors
/// A `Validation` error if the total is too large to represent.
pub fn total_amount<I: IntoIterator<Item = Amount>>(amounts: I) -> Result<Amount> {
    Amount::checked_sum(amounts).ok_or_else(|| {
        Error::new(
            ErrorType::Validation,
            "The total of these amounts is too large",
        )
    })
}

fn validate_amount(amount: Amount) -> Result<()> {
    if amount.is_negative() {
        return Err(Error::new(
            ErrorType::Validation,
            format!("Amount must not be negative, got {amount}"),
        ));
    }
    let max = Amount::new(Decimal::new(MAX_AMOUNT_CENTS, 2));
    if amount > max {
        return Err(Error::new(
            ErrorType::Validation,
            format!("Amount must not exceed {}, got {amount}", max.grouped()),
        ));
    }
    Ok(())
}
