use crate::args::ExportArgs;
use crate::commands::{open, plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Expense, DATE_FORMAT};
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;

/// One line of the exported CSV.
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Category")]
    category: &'static str,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "ID")]
    id: &'a str,
}

impl<'a> From<&'a Expense> for CsvRecord<'a> {
    fn from(e: &'a Expense) -> Self {
        Self {
            date: e.date().format(DATE_FORMAT).to_string(),
            description: e.description(),
            category: e.category().label(),
            amount: e.amount().to_string(),
            id: e.id().as_str(),
        }
    }
}

/// Writes every expense to a CSV file with the columns Date, Description, Category, Amount, ID.
pub async fn export(config: Config, args: ExportArgs) -> Result<Out<PathBuf>> {
    let tracker = open(config).await?;
    let data = to_csv(tracker.expenses())?;
    let path = args.output().to_path_buf();
    utils::write(&path, data).await?;
    let message = format!(
        "Exported {} to {}",
        plural(tracker.expenses().len(), "expense", "expenses"),
        path.display()
    );
    Ok(Out::new(message, path))
}

fn to_csv(expenses: &[Expense]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if expenses.is_empty() {
        writer
            .write_record(["Date", "Description", "Category", "Amount", "ID"])
            .context("Unable to write the CSV header")
            .pub_result(ErrorType::Internal)?;
    }
    for expense in expenses {
        writer
            .serialize(CsvRecord::from(expense))
            .with_context(|| format!("Unable to write expense {} as CSV", expense.id()))
            .pub_result(ErrorType::Internal)?;
    }
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Unable to finish the CSV")
        .pub_result(ErrorType::Internal)
}
