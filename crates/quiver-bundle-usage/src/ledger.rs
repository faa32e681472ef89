use crate::clock::UsageClock;
use crate::entry::UsageEntry;
use crate::error::{Result, UsageError};
use crate::path::cache_relative_key;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Ledger filename inside the bundle cache root.
pub const USAGE_DB_FILENAME: &str = "bundle_usage.sqlite3";

/// Configuration for locating the bundle cache root.
#[derive(Clone, Debug, Default)]
pub struct UsageConfig {
    /// Override the bundle cache root directory.
    pub cache_root_override: Option<PathBuf>,
}

impl UsageConfig {
    pub fn from_env() -> Self {
        Self {
            cache_root_override: std::env::var_os("QUIVER_BUNDLE_CACHE_DIR").map(PathBuf::from),
        }
    }
}

/// Usage ledger for the on-disk bundle cache.
///
/// One row per tracked bundle path, keyed by the cache-root-relative path:
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS bundles (
///     path text NOT NULL UNIQUE PRIMARY KEY,
///     creation integer,
///     last_usage integer,
///     usage_count integer
/// );
/// ```
///
/// Every operation opens its own connection and drops it on return, so no
/// explicit close step exists. Paths outside the cache root are silently
/// ignored rather than stored; the ledger stays portable if the root moves.
#[derive(Clone, Debug)]
pub struct UsageLedger {
    cache_root: PathBuf,
    db_path: PathBuf,
    clock: UsageClock,
}

impl UsageLedger {
    /// Opens the ledger inside `cache_root`, creating the backing table if
    /// absent. Fails when the root does not exist or is not a directory.
    pub fn open(cache_root: impl AsRef<Path>) -> Result<Self> {
        Self::with_clock(cache_root, UsageClock::default())
    }

    /// [`UsageLedger::open`] with an injected timestamp source.
    pub fn with_clock(cache_root: impl AsRef<Path>, clock: UsageClock) -> Result<Self> {
        let cache_root = cache_root.as_ref().to_path_buf();

        let meta = match std::fs::metadata(&cache_root) {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(UsageError::CacheRootMissing { path: cache_root });
            }
            Err(err) => return Err(err.into()),
        };
        if !meta.is_dir() {
            return Err(UsageError::CacheRootNotADirectory { path: cache_root });
        }

        let db_path = cache_root.join(USAGE_DB_FILENAME);
        let ledger = Self {
            cache_root,
            db_path,
            clock,
        };
        ledger.create_main_table()?;
        Ok(ledger)
    }

    /// Opens the ledger at the configured cache root.
    pub fn from_config(config: &UsageConfig) -> Result<Self> {
        let root = config
            .cache_root_override
            .clone()
            .ok_or(UsageError::CacheRootUnset)?;
        Self::open(root)
    }

    /// The directory all tracked paths are relative to.
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Full path to the backing database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Records an access to the bundle at `bundle_path`.
    ///
    /// Creates the entry with a usage count of 1 on first access; afterwards
    /// bumps `last_usage` and increments the count by 1. Paths outside the
    /// cache root are a silent no-op. Two concurrent callers recording the
    /// same path serialize inside the upsert statement: the losing insert is
    /// converted to an update, never a duplicate row.
    pub fn record_access(&self, bundle_path: impl AsRef<Path>) -> Result<()> {
        self.log_usage(bundle_path.as_ref(), 1)
    }

    /// Records the bundle as known but not yet used (usage count 0).
    ///
    /// Used to pre-seed the ledger during an initial population pass. If the
    /// entry already exists this behaves exactly like
    /// [`UsageLedger::record_access`]; pre-seeding never resets a counter.
    pub fn record_known_unused(&self, bundle_path: impl AsRef<Path>) -> Result<()> {
        self.log_usage(bundle_path.as_ref(), 0)
    }

    /// Returns the tracked entry for `bundle_path`, or `None` when the path
    /// is not under the cache root or has no record.
    pub fn entry(&self, bundle_path: impl AsRef<Path>) -> Result<Option<UsageEntry>> {
        let Some(key) = cache_relative_key(&self.cache_root, bundle_path.as_ref()) else {
            return Ok(None);
        };
        self.find_entry(&key)
    }

    /// Number of bundles being tracked.
    pub fn entry_count(&self) -> Result<u64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM bundles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Returns every entry whose last usage is at or before `threshold`.
    ///
    /// The eviction policy deletes the returned bundles' files and then
    /// removes each record with [`UsageLedger::delete_entry`].
    pub fn stale_entries(&self, threshold: i64) -> Result<Vec<UsageEntry>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT path, creation, last_usage, usage_count FROM bundles WHERE last_usage <= ?1",
        )?;
        let entries = stmt
            .query_map(params![threshold], UsageEntry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Deletes the record identified by `entry.path()`. Deleting a path that
    /// is no longer present is a no-op, so the call is safe to retry and
    /// tolerant of races with a concurrent deletion.
    pub fn delete_entry(&self, entry: &UsageEntry) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM bundles WHERE path = ?1", params![entry.path()])?;
        Ok(())
    }

    fn log_usage(&self, bundle_path: &Path, initial_usage_count: i64) -> Result<()> {
        let Some(key) = cache_relative_key(&self.cache_root, bundle_path) else {
            tracing::debug!(
                target = "quiver.usage",
                path = %bundle_path.display(),
                "skipping usage record for path outside the bundle cache root"
            );
            return Ok(());
        };

        let now = self.clock.now()?;
        tracing::debug!(
            target = "quiver.usage",
            path = %key,
            timestamp = now,
            "recording bundle usage"
        );

        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO bundles(path, creation, last_usage, usage_count) \
             VALUES (?1, ?2, ?2, ?3) \
             ON CONFLICT(path) DO UPDATE SET \
                 last_usage = excluded.last_usage, \
                 usage_count = usage_count + 1",
            params![key, now, initial_usage_count],
        )?;
        Ok(())
    }

    fn find_entry(&self, key: &str) -> Result<Option<UsageEntry>> {
        let conn = self.connection()?;
        let entry = conn
            .query_row(
                "SELECT path, creation, last_usage, usage_count FROM bundles WHERE path = ?1",
                params![key],
                UsageEntry::from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        // Short cross-process write contention waits instead of failing.
        conn.busy_timeout(Duration::from_secs(10))?;
        Ok(conn)
    }

    fn create_main_table(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS bundles ( \
                 path text NOT NULL UNIQUE PRIMARY KEY, \
                 creation integer, \
                 last_usage integer, \
                 usage_count integer \
             );",
        )?;
        Ok(())
    }
}
