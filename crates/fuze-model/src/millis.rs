use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch for `ts`.
///
/// Pre-epoch times clamp to zero; the wire format only carries non-negative
/// values.
pub fn unix_ms(ts: SystemTime) -> u64 {
    ts.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The `SystemTime` that `unix_ms` would map back to `ms`.
pub fn system_time_from_unix_ms(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

/// Millisecond count as a `Duration`.
pub fn duration_from_ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Whole milliseconds in `d`, truncating sub-millisecond remainder.
pub fn duration_to_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn unix_ms_roundtrip() {
        let ms: u64 = 1_645_540_727_000;
        assert_eq!(unix_ms(system_time_from_unix_ms(ms)), ms);
    }

    #[test]
    fn epoch_is_zero() {
        assert_eq!(unix_ms(UNIX_EPOCH), 0);
        assert_eq!(system_time_from_unix_ms(0), UNIX_EPOCH);
    }

    #[test]
    fn pre_epoch_clamps_to_zero() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(unix_ms(before), 0);
    }

    #[test]
    fn duration_conversions_truncate_to_millis() {
        assert_eq!(duration_to_ms(Duration::from_micros(1500)), 1);
        assert_eq!(duration_from_ms(250), Duration::from_millis(250));
    }
}
