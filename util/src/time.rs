//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Number of microseconds in a second
pub const MICROS_PER_SECOND: f64 = 1e6;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a period in microseconds into a `std::time::Duration`.
///
/// Negative and non-finite periods map to a zero duration.
pub fn micros_to_duration(period_us: f64) -> std::time::Duration {
    if period_us.is_finite() && period_us > 0.0 {
        std::time::Duration::from_secs_f64(period_us / MICROS_PER_SECOND)
    }
    else {
        std::time::Duration::from_secs(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        let d = chrono::Duration::milliseconds(1500);
        assert_eq!(duration_to_seconds(d), Some(1.5));
    }

    #[test]
    fn test_micros_to_duration() {
        assert_eq!(micros_to_duration(2500.0), std::time::Duration::from_micros(2500));
        assert_eq!(micros_to_duration(-1.0), std::time::Duration::from_secs(0));
        assert_eq!(micros_to_duration(f64::INFINITY), std::time::Duration::from_secs(0));
    }
}
