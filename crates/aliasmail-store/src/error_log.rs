//! Daily error log files.

use std::path::{Path, PathBuf};

use aliasmail_core::ErrorRecord;
use chrono::{DateTime, Local, NaiveDate};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::Result;

/// Appends error records to `error_YYYY-MM-DD.log` files in one directory.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    dir: PathBuf,
}

impl ErrorLog {
    /// Log into `dir`, created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The log directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the log file for `date`.
    #[must_use]
    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("error_{}.log", date.format("%Y-%m-%d")))
    }

    /// Append `record` to today's file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn append(&self, record: &ErrorRecord) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.file_for(Local::now().date_naive());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format_entry(record).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Render one record: `[time] [kind] [context] message`, followed by a
/// `Stack trace:` block when the record carries one.
#[must_use]
pub fn format_entry(record: &ErrorRecord) -> String {
    let time = DateTime::from_timestamp_millis(record.timestamp).map_or_else(
        || "Unknown".to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    let mut entry = format!(
        "[{time}] [{}] [{}] {}\n",
        record.kind, record.context, record.message
    );
    if let Some(stack) = &record.stack {
        entry.push_str("Stack trace:\n");
        entry.push_str(stack);
        entry.push_str("\n\n");
    }
    entry
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entry_layout() {
        let record = ErrorRecord::new(1_700_000_000_000, "fetchEmails", "Connection reset");
        assert_eq!(
            format_entry(&record),
            "[2023-11-14 22:13:20] [network] [fetchEmails] Connection reset\n"
        );
    }

    #[test]
    fn stack_trace_follows_entry() {
        let record = ErrorRecord::new(0, "saveSubEmails", "disk full")
            .with_stack(Some("at persist\nat save".into()));
        assert_eq!(
            format_entry(&record),
            "[1970-01-01 00:00:00] [storage] [saveSubEmails] disk full\n\
             Stack trace:\nat persist\nat save\n\n"
        );
    }

    #[test]
    fn out_of_range_timestamp_is_unknown() {
        let record = ErrorRecord::new(i64::MAX, "x", "boom");
        assert!(format_entry(&record).starts_with("[Unknown]"));
    }

    #[tokio::test]
    async fn appends_to_dated_file() {
        let tmp = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(tmp.path().join("logs"));

        log.append(&ErrorRecord::new(0, "a", "first")).await.unwrap();
        log.append(&ErrorRecord::new(0, "b", "second")).await.unwrap();

        let mut files = std::fs::read_dir(log.dir()).unwrap();
        let file = files.next().unwrap().unwrap();
        assert!(files.next().is_none());
        let name = file.file_name().into_string().unwrap();
        assert!(name.starts_with("error_") && name.ends_with(".log"));

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("[unknown] [b] second\n"));
    }
}
