//! The expense list: rows for display, and inline editing of at most one row at a time.
//!
//! Edits go into a `Draft`, which holds the field values as the user typed them. Nothing reaches
//! the store until `ListEditor::save`.

use crate::model::{parse_amount, parse_date, Category, Expense, ExpenseId, DATE_FORMAT};
use crate::store::ExpenseStore;
use crate::Result;
use serde::Serialize;
use tracing::debug;

/// A working copy of an expense that is being edited.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Draft {
    id: ExpenseId,
    description: String,
    amount: String,
    category: Category,
    date: String,
}

impl Draft {
    fn from_expense(expense: &Expense) -> Self {
        Self {
            id: expense.id().clone(),
            description: expense.description().to_string(),
            amount: expense.amount().value().normalize().to_string(),
            category: expense.category(),
            date: expense.date().format(DATE_FORMAT).to_string(),
        }
    }

    pub fn id(&self) -> &ExpenseId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
    }

    pub fn set_amount(&mut self, value: impl Into<String>) {
        self.amount = value.into();
    }

    pub fn set_category(&mut self, value: Category) {
        self.category = value;
    }

    pub fn set_date(&mut self, value: impl Into<String>) {
        self.date = value.into();
    }

    /// The expense this draft describes.
    ///
    /// # Errors
    /// A `Validation` error if the amount or date text does not parse or the amount is negative.
    pub fn to_expense(&self) -> Result<Expense> {
        let expense = Expense::new(
            self.id.clone(),
            self.description.trim(),
            parse_amount(&self.amount)?,
            self.category,
            parse_date(&self.date)?,
        );
        expense.validate()?;
        Ok(expense)
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum EditState {
    #[default]
    Viewing,
    Editing(Draft),
}

/// One displayed row. For the row being edited, the values are the draft's.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Row {
    pub id: ExpenseId,
    pub description: String,
    pub amount: String,
    pub category: Category,
    pub date: String,
    pub editing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListEditor {
    state: EditState,
}

impl ListEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    pub fn editing_id(&self) -> Option<&ExpenseId> {
        self.draft().map(Draft::id)
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            EditState::Editing(draft) => Some(draft),
            EditState::Viewing => None,
        }
    }

    /// The draft, for field changes. Only the draft changes, never the store.
    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        match &mut self.state {
            EditState::Editing(draft) => Some(draft),
            EditState::Viewing => None,
        }
    }

    /// Starts editing `expense`. Any other draft is discarded.
    pub fn edit(&mut self, expense: &Expense) {
        debug!("Editing expense {}", expense.id());
        self.state = EditState::Editing(Draft::from_expense(expense));
    }

    /// Writes the draft to `store` and returns to viewing. Returns `None` if nothing was being
    /// edited.
    ///
    /// # Errors
    /// If the draft is invalid or the update fails, the editor stays in `Editing` with the draft
    /// unchanged.
    pub async fn save(&mut self, store: &mut ExpenseStore) -> Result<Option<Expense>> {
        let Some(draft) = self.draft() else {
            return Ok(None);
        };
        let expense = draft.to_expense()?;
        store.update(expense.clone()).await?;
        self.state = EditState::Viewing;
        Ok(Some(expense))
    }

    /// Discards the draft without touching the store.
    pub fn cancel(&mut self) {
        self.state = EditState::Viewing;
    }

    /// Deletes `id` from `store`. If that row was being edited, editing ends.
    pub async fn delete(&mut self, store: &mut ExpenseStore, id: &ExpenseId) -> Result<Expense> {
        let removed = store.delete(id).await?;
        if self.editing_id() == Some(id) {
            self.state = EditState::Viewing;
        }
        Ok(removed)
    }

    /// The rows to display for `expenses`, in order.
    pub fn rows(&self, expenses: &[Expense]) -> Vec<Row> {
        let draft = self.draft();
        expenses
            .iter()
            .map(|e| match draft {
                Some(d) if d.id() == e.id() => Row {
                    id: d.id.clone(),
                    description: d.description.clone(),
                    amount: d.amount.clone(),
                    category: d.category,
                    date: d.date.clone(),
                    editing: true,
                },
                _ => Row {
                    id: e.id().clone(),
                    description: e.description().to_string(),
                    amount: e.amount().to_string(),
                    category: e.category(),
                    date: e.date().format(DATE_FORMAT).to_string(),
                    editing: false,
                },
            })
            .collect()
    }
}
