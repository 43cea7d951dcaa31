use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

/// One decoded MRU value: a sequence of bracketed tokens, one of them
/// `[T<hex file-time>]`, then `*` and the target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry {
    pub target: String,
    pub last_access: DateTime<Utc>,
    pub timestamp_hex: String,
    /// False when the hex token did not parse; `last_access` then carries
    /// the 1601-01-01 sentinel and the caller reports a warning.
    pub timestamp_valid: bool,
}

static MRU_PATTERN: OnceLock<Regex> = OnceLock::new();

fn pattern() -> &'static Regex {
    MRU_PATTERN.get_or_init(|| {
        Regex::new(r"\[[a-zA-Z0-9]+?\]\[T([a-zA-Z0-9]+?)\](\[[a-zA-Z0-9]+?\])?\*(.+)")
            .expect("static pattern compiles")
    })
}

/// Returns `None` on a pattern miss so callers can skip housekeeping values
/// that share the MRU key but are not entries.
pub fn decode(raw: &str) -> Option<DecodedEntry> {
    let caps = pattern().captures(raw)?;
    let timestamp_hex = caps.get(1)?.as_str().to_string();
    let target = caps.get(3)?.as_str().to_string();

    let (last_access, timestamp_valid) = match u64::from_str_radix(&timestamp_hex, 16) {
        Ok(ticks) => (filetime_to_utc(ticks), true),
        Err(_) => (filetime_epoch(), false),
    };

    Some(DecodedEntry {
        target,
        last_access,
        timestamp_hex,
        timestamp_valid,
    })
}

/// 100-nanosecond ticks since 1601-01-01 UTC.
pub fn filetime_to_utc(ticks: u64) -> DateTime<Utc> {
    filetime_epoch() + chrono::Duration::microseconds((ticks / 10) as i64)
}

fn filetime_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(-11_644_473_600, 0).unwrap_or_default()
}
