//! Timestamp formatting for snapshot records
//!
//! File times are persisted as `YYYY-MM-DD HH:MM:SS.ffffff+ZZZZ` in the local
//! offset of the machine that took the scan. The format carries microseconds
//! and an explicit offset, so parsing a formatted value yields the same
//! instant (to the microsecond) regardless of the timezone of the reader.
//!
//! Values captured from the filesystem are truncated to microseconds on the
//! way in, which keeps an in-memory [`crate::types::FileRecord`] identical to
//! the one read back from disk.

use chrono::{DateTime, FixedOffset, Local, SubsecRound};
use filetime::FileTime;
use std::time::{SystemTime, UNIX_EPOCH};

/// Format used when writing timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%z";

/// Format used when reading timestamps (accepts any fraction length)
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%z";

/// Format a timestamp the way it is stored in a snapshot
pub fn format_time(time: &DateTime<FixedOffset>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp back into an offset-aware instant
pub fn parse_time(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(value, TIMESTAMP_PARSE_FORMAT)
}

/// Convert a filesystem time into a local, microsecond-precision timestamp
pub fn from_system_time(time: SystemTime) -> DateTime<FixedOffset> {
    DateTime::<Local>::from(time).fixed_offset().trunc_subsecs(6)
}

/// Like [`from_system_time`] but clamps pre-epoch values to the epoch
///
/// Some filesystems report bogus negative access times.
pub fn from_system_time_clamped(time: SystemTime) -> DateTime<FixedOffset> {
    from_system_time(time.max(UNIX_EPOCH))
}

/// Convert a stored timestamp into a value accepted by `filetime`
pub fn to_file_time(time: &DateTime<FixedOffset>) -> FileTime {
    FileTime::from_unix_time(time.timestamp(), time.timestamp_subsec_nanos())
}

/// Re-express `time` in the offset of `reference` and format it
///
/// Two instants compare equal under this formatting exactly when they are the
/// same instant at microsecond precision, even if they were captured under
/// different local offsets.
pub fn format_in_offset_of(time: &DateTime<FixedOffset>, reference: &DateTime<FixedOffset>) -> String {
    format_time(&time.with_timezone(reference.offset()))
}

/// Current local time in ISO-8601 form (used for the scan date)
pub fn now_iso() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Serde adapter storing `DateTime<FixedOffset>` in [`TIMESTAMP_FORMAT`]
pub mod serde_format {
    use super::{format_time, parse_time};
    use chrono::{DateTime, FixedOffset};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_time(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_time(&raw).map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}
