//! Delete command handler.

use crate::args::DeleteArgs;
use crate::commands::{open, Out};
use crate::model::{Expense, ExpenseId};
use crate::{Config, Result};

/// Deletes one expense by ID. An unknown ID is a `NotFound` error and nothing is changed.
pub async fn delete(config: Config, args: DeleteArgs) -> Result<Out<Expense>> {
    let mut tracker = open(config).await?;
    let removed = tracker
        .delete_expense(&ExpenseId::from(args.id()))
        .await?;
    let message = format!(
        "Deleted expense {} ('{}', {})",
        removed.id(),
        removed.description(),
        removed.amount()
    );
    Ok(Out::new(message, removed))
}
