use crate::error::{Result, UsageError};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment value that replaces live clock readings when set to a
/// non-empty string. A set-but-non-numeric value fails the operation that
/// needed the timestamp instead of silently falling back.
pub const TIMESTAMP_OVERRIDE_ENV: &str = "QUIVER_USAGE_TIMESTAMP_OVERRIDE";

/// Timestamp source for all "now" values recorded in the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UsageClock {
    /// Live wall clock, honoring [`TIMESTAMP_OVERRIDE_ENV`] on every reading.
    #[default]
    Wall,
    /// Fixed Unix timestamp, for deterministic tests and replay.
    Fixed(i64),
}

impl UsageClock {
    /// Returns the current Unix timestamp in seconds.
    pub fn now(&self) -> Result<i64> {
        match self {
            UsageClock::Fixed(timestamp) => Ok(*timestamp),
            UsageClock::Wall => wall_now(),
        }
    }
}

fn wall_now() -> Result<i64> {
    if let Some(raw) = std::env::var_os(TIMESTAMP_OVERRIDE_ENV) {
        let raw = raw.to_string_lossy();
        if !raw.is_empty() {
            return raw
                .trim()
                .parse::<i64>()
                .map_err(|source| UsageError::TimestampOverride {
                    value: raw.into_owned(),
                    source,
                });
        }
    }

    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => Ok(d.as_secs() as i64),
        Err(err) => {
            // This should be extremely rare (system clock set before 1970). Avoid spamming logs
            // in any hot call sites by logging at most once.
            static REPORTED: OnceLock<()> = OnceLock::new();
            if REPORTED.set(()).is_ok() {
                tracing::debug!(
                    target = "quiver.usage",
                    error = %err,
                    "system time is before unix epoch; using 0 for wall_now"
                );
            }
            Ok(0)
        }
    }
}
