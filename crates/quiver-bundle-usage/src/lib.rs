//! Persisted usage metadata for the on-disk bundle cache.
//!
//! This crate implements the ledger the bundle cache eviction policy reads
//! to decide which cached bundles are stale:
//! - one row per cached bundle path (first-seen time, last-usage time, usage count)
//! - cache-root-relative keys, so the ledger stays portable if the root moves
//! - insert-or-update access recording that is safe to call unboundedly
//! - stale-entry enumeration by a caller-supplied last-usage threshold
//!
//! ## On-disk layout (inventory)
//!
//! The ledger lives inside the bundle cache root:
//! - `<cache_root>/bundle_usage.sqlite3`:
//!   - a single `bundles` table, schema in [`UsageLedger`]
//!   - `path TEXT NOT NULL UNIQUE PRIMARY KEY` (cache-root-relative key)
//!   - `creation` / `last_usage` INTEGER Unix timestamps, `usage_count` INTEGER
//!
//! Every operation opens its own connection and drops it on return; there is
//! no explicit close step. Cross-process readers and writers coordinate
//! through SQLite's own locking.

mod clock;
mod entry;
mod error;
mod ledger;
mod path;

pub use clock::{UsageClock, TIMESTAMP_OVERRIDE_ENV};
pub use entry::UsageEntry;
pub use error::{Result, UsageError};
pub use ledger::{UsageConfig, UsageLedger, USAGE_DB_FILENAME};
pub use path::cache_relative_key;
