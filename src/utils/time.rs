use chrono::{DateTime, Local, TimeZone, Utc};

pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

pub fn current_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Record identifier: fractional UNIX seconds, e.g. `1718000000.123456`
pub fn record_id<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

/// Local wall-clock time with microseconds and no offset
pub fn iso_timestamp(now: &DateTime<Local>) -> String {
    now.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
