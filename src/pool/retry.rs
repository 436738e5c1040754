//! Reconnect retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponential backoff between reconnect attempts.
///
/// The delay before retry `n` (0-based) is `initial * multiplier^n`, capped
/// at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backoff {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
}

impl Backoff {
    pub fn new(initial_ms: u64, max_ms: u64) -> Self {
        Self {
            initial_ms,
            max_ms: max_ms.max(initial_ms),
            multiplier: 2.0,
        }
    }

    /// No delay at all between attempts.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Set the growth factor. Values below 1 are treated as 1.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Delay before retry number `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay_ms = (self.initial_ms as f64) * self.multiplier.max(1.0).powi(exponent);
        Duration::from_millis(delay_ms.min(self.max_ms as f64) as u64)
    }
}

impl Default for Backoff {
    /// 50ms doubling up to 2s.
    fn default() -> Self {
        Self::new(50, 2_000)
    }
}

/// How hard `acquire` tries to bring an unhealthy handle back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Connect attempts per acquire; `None` keeps trying until it works
    /// or the acquire deadline passes.
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Give up after `max_attempts` connects (at least one is always made).
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            ..Default::default()
        }
    }

    /// Never give up on attempts alone.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            ..Default::default()
        }
    }

    /// Set the backoff.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether another attempt is allowed after `attempts` have failed.
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(3),
            backoff: Backoff::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_growth() {
        let backoff = Backoff::new(100, 1_000);
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_millis(1_000));
        assert_eq!(backoff.delay(60), Duration::from_millis(1_000));
    }

    #[test]
    fn test_backoff_multiplier_floor() {
        let backoff = Backoff::new(10, 100).with_multiplier(0.5);
        assert_eq!(backoff.delay(5), Duration::from_millis(10));
        assert_eq!(Backoff::none().delay(9), Duration::ZERO);
    }

    #[test]
    fn test_policy_limits() {
        let policy = RetryPolicy::bounded(2);
        assert!(policy.allows(0));
        assert!(policy.allows(1));
        assert!(!policy.allows(2));

        assert_eq!(RetryPolicy::bounded(0).max_attempts, Some(1));
        assert!(RetryPolicy::unbounded().allows(u32::MAX));
    }

    #[test]
    fn test_policy_from_json() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"max_attempts": 7, "backoff": {"initial_ms": 5}}"#).unwrap();
        assert_eq!(policy.max_attempts, Some(7));
        assert_eq!(policy.backoff.initial_ms, 5);
        assert_eq!(policy.backoff.max_ms, 2_000);
    }
}
