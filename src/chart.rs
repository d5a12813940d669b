//! Spending breakdown by category.

use crate::error::{Error, ErrorType};
use crate::model::{total_amount, Amount, Category, Expense};
use crate::Result;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;

/// Slice colors, assigned by slice index and repeating when there are more slices than colors.
pub const PALETTE: [&str; 5] = ["#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884D8"];

/// The width of a full bar in `render`.
const BAR_WIDTH: u32 = 40;

/// One category's portion of total spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub category: Category,
    pub total: Amount,
    /// Fraction of the grand total, from 0 to 1. Zero when the grand total is zero.
    pub share: Decimal,
    pub color: &'static str,
}

/// Sums amounts per category. Categories appear in the order their first expense appears and
/// categories with no expenses are left out.
///
/// # Errors
/// A `Validation` error if a category's total is too large to represent.
pub fn category_totals(expenses: &[Expense]) -> Result<Vec<(Category, Amount)>> {
    let mut totals: Vec<(Category, Amount)> = Vec::new();
    for expense in expenses {
        match totals.iter_mut().find(|(c, _)| *c == expense.category()) {
            Some((category, total)) => {
                *total = total.checked_add(expense.amount()).ok_or_else(|| {
                    Error::new(
                        ErrorType::Validation,
                        format!("The total for {} is too large", category.label()),
                    )
                })?
            }
            None => totals.push((expense.category(), expense.amount())),
        }
    }
    Ok(totals)
}

/// `category_totals` with each category's share and color.
pub fn spending_breakdown(expenses: &[Expense]) -> Result<Vec<Slice>> {
    let totals = category_totals(expenses)?;
    let grand = total_amount(totals.iter().map(|(_, t)| *t))?;
    Ok(totals
        .into_iter()
        .enumerate()
        .map(|(i, (category, total))| Slice {
            category,
            total,
            share: share(total, grand),
            color: PALETTE[i % PALETTE.len()],
        })
        .collect())
}

fn share(part: Amount, whole: Amount) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.value()
        .checked_div(whole.value())
        .unwrap_or(Decimal::ZERO)
}

/// Renders `slices` as text, one line per category, e.g.
/// `Food            120.00   60.0% ████████████████████████`.
pub fn render(slices: &[Slice]) -> String {
    let mut out = String::new();
    for slice in slices {
        let percent = (slice.share * Decimal::ONE_HUNDRED).round_dp(1);
        let width = (slice.share * Decimal::from(BAR_WIDTH))
            .round()
            .to_u32()
            .unwrap_or(0);
        let _ = writeln!(
            out,
            "{:<15} {:>10} {:>6}% {}",
            slice.category.label(),
            slice.total.grouped(),
            format!("{percent:.1}"),
            "█".repeat(width as usize)
        );
    }
    out
}
