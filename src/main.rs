use clap::Parser;
use expense_tracker::args::{Args, Command};
use expense_tracker::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().expenses_home().path();

    // This allows for running the program without calling the rate provider. When
    // EXPENSES_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Live.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.base_currency(),
            init_args.target_currency(),
        )
        .await?
        .print(),

        Command::Add(add_args) => commands::add(Config::load(home).await?, add_args.clone())
            .await?
            .print(),

        Command::List => commands::list(Config::load(home).await?).await?.print(),

        Command::Edit(edit_args) => commands::edit(Config::load(home).await?, edit_args.clone())
            .await?
            .print(),

        Command::Delete(delete_args) => {
            commands::delete(Config::load(home).await?, delete_args.clone())
                .await?
                .print()
        }

        Command::Chart => commands::chart(Config::load(home).await?).await?.print(),

        Command::Convert(convert_args) => {
            commands::convert(Config::load(home).await?, mode, convert_args.clone())
                .await?
                .print()
        }

        Command::Export(export_args) => {
            commands::export(Config::load(home).await?, export_args.clone())
                .await?
                .print()
        }

        Command::Import(import_args) => {
            commands::import(Config::load(home).await?, import_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this binary and library only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
