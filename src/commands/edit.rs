use crate::args::EditArgs;
use crate::commands::{open, Out};
use crate::error::{Error, ErrorType};
use crate::model::{Expense, ExpenseId};
use crate::{Config, Result};

/// Changes the given fields of an expense, leaving the others as they are. The change goes through
/// the same draft-and-save cycle as an inline edit in the list.
pub async fn edit(config: Config, args: EditArgs) -> Result<Out<Expense>> {
    let mut tracker = open(config).await?;
    let id = ExpenseId::from(args.id());
    let draft = tracker.begin_edit(&id)?;
    if let Some(description) = args.description() {
        draft.set_description(description);
    }
    if let Some(amount) = args.amount() {
        draft.set_amount(amount);
    }
    if let Some(category) = args.category() {
        draft.set_category(category);
    }
    if let Some(date) = args.date() {
        draft.set_date(date);
    }

    let expense = tracker.save_edit().await?.ok_or_else(|| {
        Error::new(ErrorType::Internal, format!("Expense '{id}' was not being edited"))
    })?;
    Ok(Out::new(format!("Updated expense {id}"), expense))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::test::{new_expense, TestEnv};

    #[tokio::test]
    async fn test_edit_some_fields() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker().await;
        let first = tracker
            .add_expense(new_expense("Cofee", "4", Category::Other))
            .await
            .unwrap();
        let second = tracker
            .add_expense(new_expense("Bus", "2.75", Category::Transportation))
            .await
            .unwrap();

        let args = EditArgs::new(first.id().as_str())
            .with_description("Coffee")
            .with_category(Category::Food);
        let out = edit(env.config(), args).await.unwrap();
        let updated = out.structure().unwrap();
        assert_eq!(updated.description(), "Coffee");
        assert_eq!(updated.category(), Category::Food);
        assert_eq!(updated.amount(), first.amount());
        assert_eq!(updated.date(), first.date());

        let reopened = env.tracker().await;
        assert_eq!(reopened.expenses(), &[updated.clone(), second]);
    }

    #[tokio::test]
    async fn test_edit_invalid_amount_changes_nothing() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker().await;
        let expense = tracker
            .add_expense(new_expense("Tea", "3", Category::Food))
            .await
            .unwrap();
        let before = env.stored().await;

        let args = EditArgs::new(expense.id().as_str()).with_amount("three");
        let err = edit(env.config(), args).await.unwrap_err();
        assert!(err.is(ErrorType::Validation));
        assert_eq!(env.stored().await, before);
    }

    #[tokio::test]
    async fn test_edit_unknown_id() {
        let env = TestEnv::new().await;
        let err = edit(env.config(), EditArgs::new("missing").with_date("2025-01-01"))
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::NotFound));
    }
}
