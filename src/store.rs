//! The expense store: the ordered, in-memory collection of expenses and its persistence.
//!
//! The collection is read from storage exactly once, by `ExpenseStore::hydrate`, and the whole
//! collection is written back after every successful mutation. The in-memory collection only
//! changes once the write has succeeded.

use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{total_amount, Amount, Expense, ExpenseId, NewExpense};
use crate::storage::Storage;
use crate::Result;
use anyhow::Context;
use std::collections::HashSet;
use tracing::{debug, trace};

/// The storage key that holds the serialized expense collection.
pub const STORAGE_KEY: &str = "expenses";

/// What was found in storage when the store was opened.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Hydration {
    /// Nothing had been stored yet.
    Empty,
    /// This many expenses were loaded.
    Loaded(usize),
    /// A payload was present but could not be used. The store starts empty; `raw` is the payload
    /// exactly as it was found so that it can be preserved.
    Corrupt { reason: String, raw: String },
}

/// The ordered collection of expenses, synchronized to a `Storage`.
pub struct ExpenseStore {
    storage: Box<dyn Storage>,
    expenses: Vec<Expense>,
}

impl ExpenseStore {
    /// Reads the collection from `storage`.
    ///
    /// # Errors
    /// Only fails if `storage` itself fails. A corrupt payload is reported as
    /// `Hydration::Corrupt`, not as an error.
    pub async fn hydrate(storage: Box<dyn Storage>) -> Result<(Self, Hydration)> {
        let raw = storage
            .get(STORAGE_KEY)
            .await
            .context("Unable to read the stored expenses")?;
        let (expenses, hydration) = match raw {
            None => (Vec::new(), Hydration::Empty),
            Some(raw) => match parse_collection(&raw) {
                Ok(expenses) => {
                    let n = expenses.len();
                    (expenses, Hydration::Loaded(n))
                }
                Err(e) => (
                    Vec::new(),
                    Hydration::Corrupt {
                        reason: format!("{e:#}"),
                        raw,
                    },
                ),
            },
        };
        debug!("Hydrated expense store: {hydration:?}");
        Ok((Self { storage, expenses }, hydration))
    }

    /// The expenses in insertion order.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn get(&self, id: &ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// The sum of all amounts.
    pub fn total(&self) -> Result<Amount> {
        total_amount(self.expenses.iter().map(Expense::amount))
    }

    /// Validates `new`, gives it a fresh identifier and appends it.
    pub async fn add(&mut self, new: NewExpense) -> Result<Expense> {
        new.validate()?;
        let mut id = ExpenseId::generate();
        while self.get(&id).is_some() {
            id = ExpenseId::generate();
        }
        let expense = Expense::from_new(id, new);
        let mut next = self.expenses.clone();
        next.push(expense.clone());
        self.commit(next).await?;
        debug!("Added expense {}", expense.id());
        Ok(expense)
    }

    /// Replaces the expense with the same identifier, keeping its position.
    ///
    /// # Errors
    /// - `Validation` if `expense` is not valid.
    /// - `NotFound` if no expense has that identifier. Nothing changes in that case.
    pub async fn update(&mut self, expense: Expense) -> Result<()> {
        expense.validate()?;
        let ix = self.position(expense.id())?;
        let id = expense.id().clone();
        let mut next = self.expenses.clone();
        next[ix] = expense;
        self.commit(next).await?;
        debug!("Updated expense {id}");
        Ok(())
    }

    /// Removes the expense with identifier `id` and returns it.
    ///
    /// # Errors
    /// `NotFound` if no expense has that identifier. Nothing changes in that case.
    pub async fn delete(&mut self, id: &ExpenseId) -> Result<Expense> {
        let ix = self.position(id)?;
        let mut next = self.expenses.clone();
        let removed = next.remove(ix);
        self.commit(next).await?;
        debug!("Deleted expense {id}");
        Ok(removed)
    }

    /// Replaces the whole collection, e.g. when importing. The expenses must be valid and have
    /// unique identifiers.
    pub async fn replace_all(&mut self, expenses: Vec<Expense>) -> Result<()> {
        check_collection(&expenses).pub_result(ErrorType::Validation)?;
        self.commit(expenses).await
    }

    fn position(&self, id: &ExpenseId) -> Result<usize> {
        self.expenses
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| Error::new(ErrorType::NotFound, format!("Expense '{id}' not found")))
    }

    /// Persists `next` and, if that worked, makes it the current collection.
    async fn commit(&mut self, next: Vec<Expense>) -> Result<()> {
        let json = serde_json::to_string(&next)
            .context("Unable to serialize expenses")
            .pub_result(ErrorType::Internal)?;
        self.storage
            .set(STORAGE_KEY, &json)
            .await
            .context("Unable to save expenses")?;
        trace!("Persisted {} expenses", next.len());
        self.expenses = next;
        Ok(())
    }
}

/// Parses a stored expense collection.
///
/// # Errors
/// A `Parse` error if `raw` is not a JSON array of valid expenses with unique identifiers.
pub fn parse_collection(raw: &str) -> Result<Vec<Expense>> {
    let expenses: Vec<Expense> = serde_json::from_str(raw)
        .context("The stored expenses are not a valid expense list")
        .pub_result(ErrorType::Parse)?;
    check_collection(&expenses).pub_result(ErrorType::Parse)?;
    Ok(expenses)
}

fn check_collection(expenses: &[Expense]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for expense in expenses {
        anyhow::ensure!(
            seen.insert(expense.id()),
            "Duplicate expense id '{}'",
            expense.id()
        );
        expense
            .validate()
            .with_context(|| format!("Invalid expense '{}'", expense.id()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn new_expense(description: &str, amount: &str, category: Category) -> NewExpense {
        NewExpense::new(
            description,
            Amount::from_str(amount).unwrap(),
            category,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        )
    }

    async fn empty_store() -> (ExpenseStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        let (store, hydration) = ExpenseStore::hydrate(Box::new(storage.clone()))
            .await
            .unwrap();
        assert_eq!(hydration, Hydration::Empty);
        (store, storage)
    }

    #[tokio::test]
    async fn test_add_appends_and_persists() {
        let (mut store, storage) = empty_store().await;
        let a = store
            .add(new_expense("Lunch", "12.50", Category::Food))
            .await
            .unwrap();
        let b = store
            .add(new_expense("Bus", "2.75", Category::Transportation))
            .await
            .unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(store.expenses(), &[a.clone(), b.clone()]);

        let persisted = parse_collection(&storage.value(STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(persisted, vec![a, b]);
    }

    #[tokio::test]
    async fn test_round_trip_through_storage() {
        let (mut store, storage) = empty_store().await;
        let inputs = [
            ("Groceries", "87.43", Category::Food),
            ("Electric", "142.67", Category::Utilities),
            ("Movie", "0", Category::Entertainment),
            ("Taxi", "19.10", Category::Transportation),
            ("Gift", "1250", Category::Other),
        ];
        for (d, a, c) in inputs {
            store.add(new_expense(d, a, c)).await.unwrap();
        }
        let before = store.expenses().to_vec();

        let (reloaded, hydration) = ExpenseStore::hydrate(Box::new(storage)).await.unwrap();
        assert_eq!(hydration, Hydration::Loaded(5));
        assert_eq!(reloaded.expenses(), before.as_slice());
    }

    #[tokio::test]
    async fn test_add_rejects_negative_amount() {
        let (mut store, storage) = empty_store().await;
        let err = store
            .add(new_expense("Refund", "-3", Category::Other))
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::Validation));
        assert!(store.is_empty());
        assert!(storage.value(STORAGE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_round_trip_keeps_fine_and_large_amounts() {
        let (mut store, storage) = empty_store().await;
        let fine = store
            .add(new_expense("Fee", "0.1234567890123456789", Category::Other))
            .await
            .unwrap();
        assert_eq!(fine.amount().to_string(), "0.12");
        store
            .add(new_expense("House", "999999999999.99", Category::Other))
            .await
            .unwrap();
        let before = store.expenses().to_vec();

        let (reloaded, _) = ExpenseStore::hydrate(Box::new(storage)).await.unwrap();
        assert_eq!(reloaded.expenses(), before.as_slice());
    }

    #[tokio::test]
    async fn test_add_rejects_amount_over_limit() {
        let (mut store, storage) = empty_store().await;
        store
            .add(new_expense("Big", "999999999999.99", Category::Other))
            .await
            .unwrap();
        let stored = storage.value(STORAGE_KEY);
        let err = store
            .add(new_expense("Huge", "50000000000000000000000000000", Category::Other))
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::Validation));
        assert_eq!(store.len(), 1);
        assert_eq!(storage.value(STORAGE_KEY), stored);
        assert_eq!(store.total().unwrap().to_string(), "999999999999.99");
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let (mut store, _storage) = empty_store().await;
        let a = store.add(new_expense("A", "1", Category::Food)).await.unwrap();
        let b = store.add(new_expense("B", "2", Category::Food)).await.unwrap();
        let c = store.add(new_expense("C", "3", Category::Food)).await.unwrap();

        let edited = Expense::new(
            b.id().clone(),
            "B2",
            Amount::from_str("20").unwrap(),
            Category::Utilities,
            b.date(),
        );
        store.update(edited.clone()).await.unwrap();
        let ids: Vec<_> = store.expenses().iter().map(|e| e.id().clone()).collect();
        assert_eq!(ids, vec![a.id().clone(), b.id().clone(), c.id().clone()]);
        assert_eq!(store.get(b.id()).unwrap(), &edited);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let (mut store, _storage) = empty_store().await;
        let a = store.add(new_expense("A", "1", Category::Food)).await.unwrap();
        let ghost = Expense::new(
            ExpenseId::from("ghost"),
            "Ghost",
            Amount::from_str("1").unwrap(),
            Category::Other,
            a.date(),
        );
        let err = store.update(ghost).await.unwrap_err();
        assert!(err.is(ErrorType::NotFound));
        assert_eq!(store.expenses(), &[a]);
    }

    #[tokio::test]
    async fn test_delete() {
        let (mut store, storage) = empty_store().await;
        let a = store.add(new_expense("A", "1", Category::Food)).await.unwrap();
        let b = store.add(new_expense("B", "2", Category::Food)).await.unwrap();
        let removed = store.delete(a.id()).await.unwrap();
        assert_eq!(removed, a);
        assert_eq!(store.expenses(), &[b.clone()]);
        let persisted = parse_collection(&storage.value(STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(persisted, vec![b]);
    }

    #[tokio::test]
    async fn test_delete_unknown_leaves_collection_unchanged() {
        let (mut store, storage) = empty_store().await;
        store.add(new_expense("A", "1", Category::Food)).await.unwrap();
        store.add(new_expense("B", "2", Category::Food)).await.unwrap();
        let before = store.expenses().to_vec();
        let persisted_before = storage.value(STORAGE_KEY);

        let err = store.delete(&ExpenseId::from("nope")).await.unwrap_err();
        assert!(err.is(ErrorType::NotFound));
        assert_eq!(store.expenses(), before.as_slice());
        assert_eq!(storage.value(STORAGE_KEY), persisted_before);
    }

    #[tokio::test]
    async fn test_hydrate_corrupt_json() {
        let storage = MemoryStorage::with_value(STORAGE_KEY, "[{not json");
        let (store, hydration) = ExpenseStore::hydrate(Box::new(storage)).await.unwrap();
        assert!(store.is_empty());
        match hydration {
            Hydration::Corrupt { raw, reason } => {
                assert_eq!(raw, "[{not json");
                assert!(reason.contains("not a valid expense list"));
            }
            other => panic!("expected corrupt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hydrate_rejects_bad_records() {
        let negative = r#"[{"id":"a","description":"x","amount":-1,"category":"food","date":"2025-01-01"}]"#;
        let unknown_category = r#"[{"id":"a","description":"x","amount":1,"category":"rent","date":"2025-01-01"}]"#;
        let duplicate = r#"[
            {"id":"a","description":"x","amount":1,"category":"food","date":"2025-01-01"},
            {"id":"a","description":"y","amount":2,"category":"food","date":"2025-01-02"}
        ]"#;
        for raw in [negative, unknown_category, duplicate] {
            let storage = MemoryStorage::with_value(STORAGE_KEY, raw);
            let (store, hydration) = ExpenseStore::hydrate(Box::new(storage)).await.unwrap();
            assert!(store.is_empty());
            assert!(matches!(hydration, Hydration::Corrupt { .. }), "{raw}");
        }
    }

    #[tokio::test]
    async fn test_parse_collection_error_type() {
        let err = parse_collection("{}").unwrap_err();
        assert!(err.is(ErrorType::Parse));
    }

    #[tokio::test]
    async fn test_total() {
        let (mut store, _storage) = empty_store().await;
        store.add(new_expense("A", "1.25", Category::Food)).await.unwrap();
        store.add(new_expense("B", "2.50", Category::Other)).await.unwrap();
        assert_eq!(store.total().unwrap().to_string(), "3.75");
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicates() {
        let (mut store, _storage) = empty_store().await;
        let a = store.add(new_expense("A", "1", Category::Food)).await.unwrap();
        let err = store
            .replace_all(vec![a.clone(), a.clone()])
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::Validation));
        assert_eq!(store.len(), 1);
    }
}
