use std::time::Duration;

use chrono::{DateTime, Utc};

/// One timed measurement of a single target.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub rtt_ms: Option<f64>,
}

impl Sample {
    pub fn success(target: impl Into<String>, timestamp: DateTime<Utc>, rtt: Duration) -> Self {
        Self {
            target: target.into(),
            timestamp,
            rtt_ms: Some(duration_to_ms(rtt)),
        }
    }

    pub fn failure(target: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            target: target.into(),
            timestamp,
            rtt_ms: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.rtt_ms.is_some()
    }
}

/// Milliseconds with microsecond resolution; anything finer is dropped.
pub fn duration_to_ms(rtt: Duration) -> f64 {
    rtt.as_micros() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_to_ms_truncates_below_microseconds() {
        assert_eq!(duration_to_ms(Duration::from_nanos(12_345_678)), 12.345);
        assert_eq!(duration_to_ms(Duration::from_millis(20)), 20.0);
        assert_eq!(duration_to_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_failure_has_no_rtt() {
        let sample = Sample::failure("10.0.0.1", Utc::now());
        assert!(!sample.is_success());
        assert_eq!(sample.rtt_ms, None);
    }

    #[test]
    fn test_success_keeps_target_and_rtt() {
        let sample = Sample::success("1.1.1.1", Utc::now(), Duration::from_micros(1500));
        assert!(sample.is_success());
        assert_eq!(sample.target, "1.1.1.1");
        assert_eq!(sample.rtt_ms, Some(1.5));
    }
}
