use chrono::DateTime;
use serde::Serialize;
use std::fmt;

/// One persisted usage record: a read-only view over the fixed
/// `(path, creation, last_usage, usage_count)` column tuple.
///
/// Entries are only ever written by [`crate::UsageLedger`]; holders of an
/// `UsageEntry` see a snapshot of the row at query time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsageEntry {
    path: String,
    creation_time: i64,
    last_usage_time: i64,
    usage_count: i64,
}

impl UsageEntry {
    /// Builds an entry from a raw record in ledger column order.
    pub fn from_record(path: impl Into<String>, creation_time: i64, last_usage_time: i64, usage_count: i64) -> Self {
        Self {
            path: path.into(),
            creation_time,
            last_usage_time,
            usage_count,
        }
    }

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            creation_time: row.get(1)?,
            last_usage_time: row.get(2)?,
            usage_count: row.get(3)?,
        })
    }

    /// The cache-root-relative bundle path acting as the record key.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Unix timestamp of the record's first insertion.
    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    /// Unix timestamp of the most recent recorded access.
    pub fn last_usage_time(&self) -> i64 {
        self.last_usage_time
    }

    /// Number of recorded accesses since creation. Pre-populated entries
    /// start at zero until a real access is recorded.
    pub fn usage_count(&self) -> i64 {
        self.usage_count
    }

    /// Human-readable creation date, e.g. `Tuesday, 21. November 2017 14:30:22`.
    pub fn creation_date_formatted(&self) -> String {
        format_date_from_timestamp(self.creation_time)
    }

    /// Human-readable last-usage date, e.g. `Tuesday, 21. November 2017 14:30:22`.
    pub fn last_usage_date_formatted(&self) -> String {
        format_date_from_timestamp(self.last_usage_time)
    }
}

impl fmt::Display for UsageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} ({})",
            self.path,
            self.last_usage_time,
            self.last_usage_date_formatted()
        )
    }
}

/// Formats a Unix timestamp as a locale-agnostic UTC date string.
fn format_date_from_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(datetime) => datetime.format("%A, %d. %B %Y %H:%M:%S").to_string(),
        None => format!("<out-of-range timestamp {timestamp}>"),
    }
}
