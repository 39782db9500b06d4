use chrono::{Local, SecondsFormat, Utc};

pub const APP_NAME: &str = "etaforum_backend";

/// Sortable creation timestamp. Microsecond precision keeps rapid inserts
/// ordered when compared as text.
pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Human readable local time shown next to posts, e.g. `10/19/2026, 3:04:05 PM`.
pub fn display_time_now() -> String {
    Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
