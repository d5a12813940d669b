//! Types that represent the core data model, such as `Expense` and `Category`.
mod amount;
mod category;
mod currency;
mod expense;

pub use amount::{Amount, AmountError};
pub use category::Category;
pub use currency::{CurrencyCode, COMMON_CURRENCIES};
pub use expense::{
    parse_amount, parse_date, total_amount, Expense, ExpenseId, NewExpense, DATE_FORMAT,
};
