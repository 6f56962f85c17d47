//! Reconnection policy.
//!
//! Pure decision logic, kept apart from the connection manager so that the
//! interval can be shortened in tests and a cap added without touching it.

use std::time::Duration;

/// Default delay between a close and the next connection attempt
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);

/// Fixed-interval reconnection policy with an optional attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before each attempt. It does not grow between attempts.
    pub interval: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RECONNECT_INTERVAL,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Create a policy with the given interval and cap
    pub fn new(interval: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Check if another attempt should be scheduled.
    ///
    /// # Arguments
    ///
    /// * `failed_attempts` - Consecutive attempts that closed without ever opening
    ///
    /// # Returns
    ///
    /// `true` if reconnection should be attempted, `false` otherwise
    pub fn should_attempt(&self, failed_attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => failed_attempts < max,
            None => true,
        }
    }
}
