use crate::args::ConvertArgs;
use crate::commands::{open, Out};
use crate::converter::Conversion;
use crate::error::{Error, ErrorType};
use crate::model::{parse_amount, COMMON_CURRENCIES};
use crate::rates::{rates_client, Mode};
use crate::{Config, Result};
use tracing::debug;

/// Fetches the latest rates for the base currency and converts `args.amount()` to the target
/// currency. When `args.base()` is given the base currency is changed, and saved, first.
///
/// In `Mode::Live` the app id is checked before anything else happens.
pub async fn convert(config: Config, mode: Mode, args: ConvertArgs) -> Result<Out<Conversion>> {
    let client = rates_client(&config, mode, args.app_id().map(str::to_string))?;
    parse_amount(args.amount())?;

    let mut tracker = open(config).await?;
    let converter = tracker.converter_mut();
    converter.set_amount(args.amount());
    if let Some(to) = args.to() {
        converter.set_target(to.clone());
    }

    match args.base() {
        Some(base) => {
            tracker
                .change_base_currency(base.clone(), client.as_ref())
                .await?
        }
        None => tracker.refresh_rates(client.as_ref()).await?,
    }

    let converter = tracker.converter();
    if let Some(rates) = converter.rates() {
        debug!("{} rates available for {}", rates.len(), rates.base());
    }
    let conversion = converter.conversion().ok_or_else(|| {
        Error::new(
            ErrorType::NotFound,
            format!(
                "No exchange rate from {} to {}, try one of {}",
                converter.base(),
                converter.target(),
                COMMON_CURRENCIES.join(", ")
            ),
        )
    })?;
    Ok(Out::new(conversion.to_string(), conversion))
}
