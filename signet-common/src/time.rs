//! Timestamp formatting for proof-of-play records
//!
//! Stat rows carry their interval boundaries as text in a fixed,
//! lexically sortable format with microsecond resolution.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Fixed textual timestamp format used in the stat table.
///
/// Microsecond precision, zero-padded, so rows sort correctly as text.
pub const STAT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Format a timestamp for storage in a stat row
pub fn format_stat_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(STAT_TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored stat timestamp back into a `DateTime<Utc>`
pub fn parse_stat_timestamp(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, STAT_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::InvalidState(format!("Unparseable stat timestamp '{}': {}", s, e)))
}
