//! Rotated backup files in `$EXPENSES_HOME/.backups`.

use crate::error::{ErrorType, IntoResult};
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for a stored expense collection that could not be loaded.
pub const CORRUPT_EXPENSES: &str = "corrupt-expenses";

/// Prefix for the collection as it was before an import replaced it.
pub const PRE_IMPORT: &str = "pre-import";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self::with_dir(config.backups(), config.backup_copies())
    }

    pub(crate) fn with_dir(backups_dir: impl Into<PathBuf>, backup_copies: u32) -> Self {
        Self {
            backups_dir: backups_dir.into(),
            backup_copies,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Saves `data` as a pretty-printed JSON backup file.
    ///
    /// The filename format is `{prefix}.YYYY-MM-DD-NNN.json` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_json<T: Serialize + ?Sized>(&self, prefix: &str, data: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(data)
            .with_context(|| format!("Failed to serialize the {prefix} backup"))
            .pub_result(ErrorType::Internal)?;
        self.save_raw(prefix, json).await
    }

    /// Saves `raw` unchanged, e.g. a stored payload that did not parse and so cannot be
    /// re-serialized. Naming and rotation are the same as `save_json`.
    pub async fn save_raw(&self, prefix: &str, raw: impl AsRef<[u8]>) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{EXTENSION}"));

        utils::write(&path, raw).await?;
        debug!("Wrote backup {}", path.display());

        self.rotate(prefix).await?;

        Ok(path)
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max_seq = self
            .backup_names(prefix)
            .await?
            .iter()
            .filter_map(|name| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut names = self.backup_names(prefix).await?;

        // Names sort by date and then sequence number
        names.sort();

        let to_delete = names.len().saturating_sub(self.backup_copies as usize);
        for name in names.into_iter().take(to_delete) {
            let path = self.backups_dir.join(&name);
            debug!("Removing old backup {}", path.display());
            utils::remove(&path).await?;
        }

        Ok(())
    }

    async fn backup_names(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")
            .pub_result(ErrorType::Io)?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the sequence number from a backup filename.
/// Returns None if the filename doesn't match the expected pattern.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    // Pattern: {prefix}.{date}-{NNN}.json
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

/// Checks if a filename is a backup file with the given prefix.
fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename
        .strip_prefix(&format!("{prefix}."))
        .and_then(|rest| rest.strip_suffix(&format!(".{EXTENSION}")))
        // {date}-{NNN}, so another prefix that happens to start with this one does not match
        .is_some_and(|stamp| stamp.len() == 14 && !stamp.contains('.'))
}
