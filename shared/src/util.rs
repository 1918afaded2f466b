//! Small helpers shared across crates.

/// Current time as Unix millis.
///
/// All timestamps in the system are `i64` Unix millis; this is the single
/// source for "now".
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
