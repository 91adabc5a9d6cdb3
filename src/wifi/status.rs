//! Platform-independent connection status types.

use std::fmt;
use std::time::Duration;

/// Result of one connection attempt, observed only by the connection worker.
/// The HTTP caller already got its acknowledgment by the time this exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Associated and got an address via DHCP.
    Connected { ip: String },
    /// The driver reported a hard failure before the attempt cap.
    Failed,
    /// The attempt cap elapsed without association.
    TimedOut,
}

impl fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { ip } => write!(f, "connected ({})", ip),
            Self::Failed => write!(f, "failed"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Errors from a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Association did not complete within the retry budget.
    Timeout,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "connection attempt timed out"),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Bounded polling schedule for one connection attempt: poll the driver at a
/// fixed interval, give up after a fixed number of polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of status polls.
    pub max_attempts: u32,
    /// Delay between polls.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Worst-case time before the attempt is declared timed out.
    pub fn total_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// 20 polls at 500 ms spacing, ~10 s before timeout.
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 20);
        assert_eq!(policy.interval, Duration::from_millis(500));
        assert_eq!(policy.total_wait(), Duration::from_secs(10));
    }

    #[test]
    fn test_outcome_display() {
        let outcome = ConnectionOutcome::Connected {
            ip: "192.168.1.50".into(),
        };
        assert_eq!(outcome.to_string(), "connected (192.168.1.50)");
        assert_eq!(ConnectionOutcome::Failed.to_string(), "failed");
        assert_eq!(ConnectionOutcome::TimedOut.to_string(), "timed out");
    }
}
