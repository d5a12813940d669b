use crate::commands::{open, plural, Out};
use crate::list::Row;
use crate::{Config, Result};
use std::fmt::Write;

/// Shows every expense in the order they were added, with the total at the bottom.
pub async fn list(config: Config) -> Result<Out<Vec<Row>>> {
    let tracker = open(config).await?;
    let rows = tracker.rows();
    if rows.is_empty() {
        return Ok(Out::new("No expenses recorded yet", rows));
    }

    let currency = tracker.base_currency();
    let mut table = format!(
        "{}\n\n{:<10}  {:<30}  {:<14}  {:>12}  {}\n",
        plural(rows.len(), "expense", "expenses"),
        "Date",
        "Description",
        "Category",
        format!("Amount ({currency})"),
        "ID"
    );
    for row in &rows {
        let _ = writeln!(
            table,
            "{:<10}  {:<30}  {:<14}  {:>12}  {}",
            row.date,
            truncate(&row.description, 30),
            row.category.label(),
            row.amount,
            row.id
        );
    }
    let _ = write!(
        table,
        "{:<10}  {:<30}  {:<14}  {:>12}",
        "",
        "Total",
        "",
        tracker.total()?.grouped()
    );
    Ok(Out::new(table, rows))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
