//! The tracker shell. It owns the expense store and the base currency and composes the list
//! editor, the converter, and the spending chart over them.

use crate::backup::{CORRUPT_EXPENSES, PRE_IMPORT};
use crate::chart::{self, Slice};
use crate::converter::{Applied, Converter, FetchTicket};
use crate::error::{Error, ErrorType};
use crate::list::{Draft, ListEditor, Row};
use crate::model::{Amount, CurrencyCode, Expense, ExpenseId, NewExpense};
use crate::rates::{RateMapping, RatesClient};
use crate::storage::Storage;
use crate::store::{ExpenseStore, Hydration};
use crate::{Config, Result};
use anyhow::Context;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct Tracker {
    config: Config,
    store: ExpenseStore,
    list: ListEditor,
    converter: Converter,
    quarantined: Option<PathBuf>,
}

impl Tracker {
    /// Loads the expense collection from `storage`. The base and target currencies come from
    /// `config`. Rates are not fetched until `start_rates` or `refresh_rates` is called.
    ///
    /// A stored collection that cannot be loaded is copied to a `corrupt-expenses` backup and the
    /// tracker starts with no expenses. If that backup cannot be written, opening fails so that
    /// the next save cannot overwrite the only copy.
    pub async fn open(config: Config, storage: Box<dyn Storage>) -> Result<Self> {
        let (store, hydration) = ExpenseStore::hydrate(storage).await?;
        let quarantined = match hydration {
            Hydration::Corrupt { reason, raw } => {
                warn!("The stored expenses could not be loaded, starting empty: {reason}");
                let path = config
                    .backup()
                    .save_raw(CORRUPT_EXPENSES, raw)
                    .await
                    .context("Unable to preserve the unreadable expenses")?;
                warn!("The unreadable expenses were saved to {}", path.display());
                Some(path)
            }
            Hydration::Empty | Hydration::Loaded(_) => None,
        };
        let converter = Converter::new(
            config.base_currency().clone(),
            config.target_currency().clone(),
        );
        Ok(Self {
            config,
            store,
            list: ListEditor::new(),
            converter,
            quarantined,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where an unreadable stored collection was preserved when the tracker was opened.
    pub fn quarantined(&self) -> Option<&PathBuf> {
        self.quarantined.as_ref()
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        self.converter.base()
    }

    pub fn expenses(&self) -> &[Expense] {
        self.store.expenses()
    }

    pub fn total(&self) -> Result<Amount> {
        self.store.total()
    }

    pub async fn add_expense(&mut self, expense: NewExpense) -> Result<Expense> {
        let added = self.store.add(expense).await?;
        info!("Added expense {} ({})", added.id(), added.description());
        Ok(added)
    }

    // List

    pub fn list(&self) -> &ListEditor {
        &self.list
    }

    pub fn rows(&self) -> Vec<Row> {
        self.list.rows(self.store.expenses())
    }

    /// Starts editing the expense with `id`.
    pub fn begin_edit(&mut self, id: &ExpenseId) -> Result<&mut Draft> {
        let expense = self
            .store
            .get(id)
            .ok_or_else(|| Error::new(ErrorType::NotFound, format!("Expense '{id}' not found")))?;
        self.list.edit(expense);
        self.draft_mut()
            .ok_or_else(|| Error::new(ErrorType::Internal, "The edit did not start"))
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.list.draft_mut()
    }

    pub async fn save_edit(&mut self) -> Result<Option<Expense>> {
        self.list.save(&mut self.store).await
    }

    pub fn cancel_edit(&mut self) {
        self.list.cancel()
    }

    pub async fn delete_expense(&mut self, id: &ExpenseId) -> Result<Expense> {
        let removed = self.list.delete(&mut self.store, id).await?;
        info!("Deleted expense {id} ({})", removed.description());
        Ok(removed)
    }

    /// Replaces every expense with `expenses`. The current collection is backed up first and the
    /// path of that backup is returned.
    pub async fn import(&mut self, expenses: Vec<Expense>) -> Result<PathBuf> {
        let backup = self
            .config
            .backup()
            .save_json(PRE_IMPORT, self.store.expenses())
            .await?;
        self.store.replace_all(expenses).await?;
        self.list.cancel();
        Ok(backup)
    }

    // Chart

    pub fn chart(&self) -> Result<Vec<Slice>> {
        chart::spending_breakdown(self.store.expenses())
    }

    // Converter

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut Converter {
        &mut self.converter
    }

    /// Starts the fetch for the current base, as happens when the tracker is first shown.
    pub fn start_rates(&mut self) -> FetchTicket {
        self.converter.begin_fetch()
    }

    /// Changes the base currency, saves it to the config, and then starts a fetch for it. If the
    /// config cannot be saved nothing changes.
    pub async fn set_base_currency(&mut self, base: CurrencyCode) -> Result<FetchTicket> {
        self.config.set_base_currency(base.clone()).await?;
        Ok(self.converter.select_base(base))
    }

    /// Applies the result of the fetch for `ticket`, unless a newer fetch has been started.
    pub fn apply_rates(&mut self, ticket: FetchTicket, result: Result<RateMapping>) -> Applied {
        self.converter.complete(ticket, result)
    }

    /// `set_base_currency` followed by the fetch itself.
    pub async fn change_base_currency(
        &mut self,
        base: CurrencyCode,
        client: &dyn RatesClient,
    ) -> Result<()> {
        let ticket = self.set_base_currency(base).await?;
        self.converter.fetch_and_complete(ticket, client).await
    }

    /// Fetches the rates for the current base again, e.g. after an error.
    pub async fn refresh_rates(&mut self, client: &dyn RatesClient) -> Result<()> {
        self.converter.refresh(client).await
    }
}
