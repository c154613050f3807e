use chrono::{TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond wall-clock source used for boot validation and audit stamps.
pub trait DeviceClock {
    /// Returns milliseconds since the Unix epoch.
    fn now_ms(&mut self) -> u64;
}

/// System clock implementation backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDeviceClock;

impl SystemDeviceClock {
    /// Creates the system clock wrapper.
    pub fn new() -> Self {
        Self
    }
}

impl DeviceClock for SystemDeviceClock {
    fn now_ms(&mut self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Renders an epoch-millisecond stamp as an RFC 3339 UTC string.
///
/// Falls back to the raw millisecond value when the stamp is outside the
/// representable range, so a bad clock never blocks an audit write.
pub fn rfc3339_utc(ms: u64) -> String {
    match Utc.timestamp_millis_opt(ms as i64).single() {
        Some(ts) => ts.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        None => ms.to_string(),
    }
}
