//! These structs provide the CLI interface for the expenses CLI.

use crate::model::{Category, CurrencyCode};
use crate::rates::APP_ID_ENV;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expenses: A personal expense tracker.
///
/// Record what you spend, review and correct it, see where the money goes by category, and
/// convert amounts between currencies using live exchange rates from Open Exchange Rates
/// (https://openexchangerates.org).
///
/// Currency conversion needs an Open Exchange Rates app id in OPEN_EXCHANGE_RATES_APP_ID.
/// Everything else works offline.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the configuration file.
    ///
    /// This is the first command you should run. The data directory defaults to $HOME/expenses;
    /// pass --expenses-home (or set EXPENSES_HOME) to put it somewhere else.
    Init(InitArgs),
    /// Record a new expense.
    Add(AddArgs),
    /// Show all expenses.
    List,
    /// Change one or more fields of an expense.
    Edit(EditArgs),
    /// Delete an expense.
    Delete(DeleteArgs),
    /// Show spending by category.
    Chart,
    /// Convert an amount from the base currency using the latest exchange rates.
    Convert(ConvertArgs),
    /// Write all expenses to a CSV file.
    Export(ExportArgs),
    /// Replace all expenses with the contents of a JSON file. The current expenses are backed up
    /// first.
    Import(ImportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where expenses and configuration are held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_expenses_home())]
    expenses_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, expenses_home: PathBuf) -> Self {
        Self {
            log_level,
            expenses_home: expenses_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn expenses_home(&self) -> &DisplayPath {
        &self.expenses_home
    }
}

/// (Not shown): Args for the `expenses init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The currency that expense amounts are entered in.
    #[arg(long, default_value = "USD")]
    base_currency: CurrencyCode,

    /// The currency that `convert` converts to unless told otherwise.
    #[arg(long, default_value = "EUR")]
    target_currency: CurrencyCode,
}

impl InitArgs {
    pub fn new(base_currency: CurrencyCode, target_currency: CurrencyCode) -> Self {
        Self {
            base_currency,
            target_currency,
        }
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    pub fn target_currency(&self) -> &CurrencyCode {
        &self.target_currency
    }
}

/// (Not shown): Args for the `expenses add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// What the money was spent on.
    #[arg(long)]
    description: String,

    /// The amount in the base currency, e.g. 12.50
    #[arg(long)]
    amount: String,

    /// One of: food, transportation, entertainment, utilities, other
    #[arg(long, default_value = "other")]
    category: String,

    /// The date of the expense as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,
}

impl AddArgs {
    pub fn new(
        description: impl Into<String>,
        amount: impl Into<String>,
        category: impl Into<String>,
        date: Option<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount: amount.into(),
            category: category.into(),
            date,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

/// (Not shown): Args for the `expenses edit` command. Fields that are not given keep their value.
#[derive(Debug, Parser, Clone, Default)]
pub struct EditArgs {
    /// The ID of the expense, as shown by `expenses list`.
    id: String,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    amount: Option<String>,

    #[arg(long)]
    category: Option<Category>,

    /// YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,
}

impl EditArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

/// (Not shown): Args for the `expenses delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The ID of the expense, as shown by `expenses list`.
    id: String,
}

impl DeleteArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the `expenses convert` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ConvertArgs {
    /// The amount to convert, in the base currency.
    #[arg(long, default_value = "1")]
    amount: String,

    /// The currency to convert to. Defaults to the configured target currency.
    #[arg(long)]
    to: Option<CurrencyCode>,

    /// Change the base currency before converting. The new base currency is saved.
    #[arg(long)]
    base: Option<CurrencyCode>,

    /// The Open Exchange Rates app id.
    #[arg(long, env = APP_ID_ENV, hide_env_values = true)]
    app_id: Option<String>,
}

impl ConvertArgs {
    pub fn new(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            ..Self::default()
        }
    }

    pub fn with_to(mut self, to: CurrencyCode) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_base(mut self, base: CurrencyCode) -> Self {
        self.base = Some(base);
        self
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn to(&self) -> Option<&CurrencyCode> {
        self.to.as_ref()
    }

    pub fn base(&self) -> Option<&CurrencyCode> {
        self.base.as_ref()
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }
}

/// (Not shown): Args for the `expenses export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// Where to write the CSV. Defaults to expenses.csv in the current directory.
    #[arg(long, default_value = "expenses.csv")]
    output: PathBuf,
}

impl ExportArgs {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// (Not shown): Args for the `expenses import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// A JSON array of expenses in the same format as the stored expenses.json.
    path: PathBuf,
}

impl ImportArgs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn default_expenses_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --expenses-home or EXPENSES_HOME instead of relying on the \
                default expenses home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
