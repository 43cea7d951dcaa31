use chrono::{DateTime, Utc};

use crate::domain::models::RecentFileRecord;

/// Exclusive boundary: an entry exactly `window_days` old is dropped.
pub fn within_window(last_access: DateTime<Utc>, now: DateTime<Utc>, window_days: u32) -> bool {
    last_access > now - chrono::Duration::days(i64::from(window_days))
}

/// Newest first; ties keep encounter order.
pub fn order_newest_first(records: &mut [RecentFileRecord]) {
    records.sort_by(|a, b| b.last_access.cmp(&a.last_access));
}
