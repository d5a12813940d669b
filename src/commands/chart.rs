use crate::chart::{render, Slice};
use crate::commands::{open, Out};
use crate::{Config, Result};

/// Shows spending per category as text bars.
pub async fn chart(config: Config) -> Result<Out<Vec<Slice>>> {
    let tracker = open(config).await?;
    let slices = tracker.chart()?;
    if slices.is_empty() {
        return Ok(Out::new("No expenses recorded yet", slices));
    }
    let message = format!(
        "Spending by category ({})\n\n{}",
        tracker.base_currency(),
        render(&slices)
    );
    Ok(Out::new(message, slices))
}
