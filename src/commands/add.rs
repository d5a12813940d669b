use crate::args::AddArgs;
use crate::commands::{open, Out};
use crate::model::{Expense, NewExpense};
use crate::{Config, Result};

/// Records a new expense. The date defaults to today.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<Expense>> {
    let new = NewExpense::from_input(
        args.description(),
        args.amount(),
        args.category(),
        args.date(),
    )?;
    let mut tracker = open(config).await?;
    let expense = tracker.add_expense(new).await?;
    let message = format!(
        "Added {} {} for '{}' ({}) with ID {}",
        expense.amount(),
        tracker.base_currency(),
        expense.description(),
        expense.category(),
        expense.id()
    );
    Ok(Out::new(message, expense))
}
