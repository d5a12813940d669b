use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::CurrencyCode;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its backups subdirectory and an initial `config.json`.
///
/// # Arguments
/// - `expenses_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/expenses`
/// - `base_currency` - The currency expense amounts are entered in.
/// - `target_currency` - The currency `convert` converts to by default.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(
    expenses_home: &Path,
    base_currency: &CurrencyCode,
    target_currency: &CurrencyCode,
) -> Result<Out<()>> {
    let config = Config::create(
        expenses_home,
        base_currency.clone(),
        target_currency.clone(),
    )
    .await
    .context("Unable to create the data directory and configs")
    .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the expenses directory and config at {}",
        config.root().display()
    )
    .into())
}
