//! Cache expiry units
//!
//! Readings carry their own cache lifetime as `(time_out, time_unit)`.
//! The wire form of the unit is upper-case (`SECONDS`, `MINUTES`, ...).

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Convert an amount of this unit into a `Duration`
    ///
    /// Non-positive amounts mean "no explicit expiry" and yield `None`.
    pub fn to_duration(self, amount: i64) -> Option<Duration> {
        if amount <= 0 {
            return None;
        }
        let amount = amount as u64;
        let duration = match self {
            Self::Nanoseconds => Duration::from_nanos(amount),
            Self::Microseconds => Duration::from_micros(amount),
            Self::Milliseconds => Duration::from_millis(amount),
            Self::Seconds => Duration::from_secs(amount),
            Self::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            Self::Hours => Duration::from_secs(amount.saturating_mul(3_600)),
            Self::Days => Duration::from_secs(amount.saturating_mul(86_400)),
        };
        Some(duration)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_to_duration() {
        assert_eq!(
            TimeUnit::Seconds.to_duration(30),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            TimeUnit::Minutes.to_duration(2),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            TimeUnit::Days.to_duration(1),
            Some(Duration::from_secs(86_400))
        );
        assert_eq!(
            TimeUnit::Milliseconds.to_duration(1500),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_non_positive_amount_has_no_duration() {
        assert_eq!(TimeUnit::Seconds.to_duration(0), None);
        assert_eq!(TimeUnit::Hours.to_duration(-5), None);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&TimeUnit::Seconds).unwrap();
        assert_eq!(json, "\"SECONDS\"");
        let unit: TimeUnit = serde_json::from_str("\"MILLISECONDS\"").unwrap();
        assert_eq!(unit, TimeUnit::Milliseconds);
    }
}
