use crate::args::ImportArgs;
use crate::commands::{open, plural, Out};
use crate::store::parse_collection;
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;

/// The outcome of an import.
#[derive(Debug, Clone, Serialize)]
pub struct Imported {
    pub count: usize,
    /// Where the replaced expenses were saved.
    pub backup: PathBuf,
}

/// Replaces all expenses with the JSON array at `args.path()`. The file is checked in full before
/// anything is changed, and the current expenses are backed up before they are replaced.
pub async fn import(config: Config, args: ImportArgs) -> Result<Out<Imported>> {
    let raw = utils::read(args.path()).await?;
    let expenses = parse_collection(&raw)
        .with_context(|| format!("Unable to import {}", args.path().display()))?;
    let count = expenses.len();

    let mut tracker = open(config).await?;
    let backup = tracker.import(expenses).await?;
    let message = format!(
        "Imported {}, the previous expenses were saved to {}",
        plural(count, "expense", "expenses"),
        backup.display()
    );
    Ok(Out::new(message, Imported { count, backup }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::model::Category;
    use crate::test::{new_expense, TestEnv};

    #[tokio::test]
    async fn test_import_replaces_collection() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker().await;
        tracker
            .add_expense(new_expense("Old", "1", Category::Other))
            .await
            .unwrap();

        let file = env.config().root().join("in.json");
        utils::write(
            &file,
            r#"[
                {"id":"a1","description":"Rent","amount":900,"category":"utilities","date":"2025-01-01"},
                {"id":"b2","description":"Snacks","amount":"3.50","category":"food","date":"2025-01-02"}
            ]"#,
        )
        .await
        .unwrap();

        let out = import(env.config(), ImportArgs::new(&file)).await.unwrap();
        let imported = out.structure().unwrap();
        assert_eq!(imported.count, 2);
        assert!(imported.backup.exists());

        let reopened = env.tracker().await;
        let descriptions: Vec<_> = reopened.expenses().iter().map(|e| e.description()).collect();
        assert_eq!(descriptions, vec!["Rent", "Snacks"]);
        let backups = env.backups().await;
        assert!(backups[0].starts_with("pre-import."));
    }

    #[tokio::test]
    async fn test_import_rejects_duplicates_and_changes_nothing() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker().await;
        tracker
            .add_expense(new_expense("Keep", "1", Category::Other))
            .await
            .unwrap();
        let before = env.stored().await;

        let file = env.config().root().join("dupes.json");
        utils::write(
            &file,
            r#"[
                {"id":"a","description":"x","amount":1,"category":"food","date":"2025-01-01"},
                {"id":"a","description":"y","amount":2,"category":"food","date":"2025-01-01"}
            ]"#,
        )
        .await
        .unwrap();

        let err = import(env.config(), ImportArgs::new(&file)).await.unwrap_err();
        assert!(err.is(ErrorType::Parse));
        assert_eq!(env.stored().await, before);
        assert!(env.backups().await.is_empty());
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let env = TestEnv::new().await;
        let err = import(env.config(), ImportArgs::new(env.config().root().join("nope.json")))
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::Io));
    }
}
