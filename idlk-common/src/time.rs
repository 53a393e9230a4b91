//! Timestamp utilities
//!
//! Contact timestamps are persisted as UTC microseconds since the Unix epoch,
//! which keeps `ORDER BY created_at` a plain integer comparison.

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a timestamp to its stored representation
pub fn to_micros(timestamp: &DateTime<Utc>) -> i64 {
    timestamp.timestamp_micros()
}

/// Convert a stored value back into a timestamp
pub fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| Error::Internal(format!("Timestamp out of range: {} us", micros)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_micros_preserve_ordering() {
        let earlier = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap();
        assert!(to_micros(&earlier) < to_micros(&later));
        assert_eq!(from_micros(to_micros(&earlier)).unwrap(), earlier);
    }

    #[test]
    fn test_from_micros_out_of_range() {
        assert!(from_micros(i64::MAX).is_err());
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(to_micros(&time2) > to_micros(&time1));
    }
}
