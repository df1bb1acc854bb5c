//! Bounded waits for external processes
//!
//! The validator runs as a blocking subprocess. Instead of waiting forever,
//! the caller polls a [`Deadline`] and kills the process once it expires.

use std::time::{Duration, Instant};

/// Default validator bound (5 minutes)
pub const DEFAULT_VALIDATOR_TIMEOUT_SECONDS: u64 = 300;

/// Largest accepted bound (24 hours)
pub const MAX_TIMEOUT_SECONDS: u64 = 86400;

/// Poll interval while waiting on a child process
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Maximum wall-clock time per validator run
    pub validator_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            validator_seconds: DEFAULT_VALIDATOR_TIMEOUT_SECONDS,
        }
    }
}

impl TimeoutConfig {
    /// validator_seconds must be in (0, 86400]
    pub fn validate(&self) -> Result<(), TimeoutValidationError> {
        if self.validator_seconds == 0 || self.validator_seconds > MAX_TIMEOUT_SECONDS {
            return Err(TimeoutValidationError::ValidatorOutOfBounds {
                value: self.validator_seconds,
            });
        }
        Ok(())
    }

    pub fn from_config(validator: Option<u64>) -> Self {
        Self {
            validator_seconds: validator.unwrap_or(DEFAULT_VALIDATOR_TIMEOUT_SECONDS),
        }
    }

    pub fn validator_duration(&self) -> Duration {
        Duration::from_secs(self.validator_seconds)
    }
}

/// Timeout validation errors
#[derive(Debug, thiserror::Error)]
pub enum TimeoutValidationError {
    #[error("validator.timeout_seconds must be in (0, 86400], got {value}")]
    ValidatorOutOfBounds { value: u64 },
}

/// Timeout check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStatus {
    Ok,
    Expired,
}

impl TimeoutStatus {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutStatus::Expired)
    }
}

/// Wall-clock limit for a single external run
///
/// The deadline only reports expiry; killing the process is the caller's job.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    limit: Duration,
    start: Instant,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            start: Instant::now(),
        }
    }

    pub fn check(&self) -> TimeoutStatus {
        if self.start.elapsed() > self.limit {
            TimeoutStatus::Expired
        } else {
            TimeoutStatus::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timeout_config_default() {
        let config = TimeoutConfig::default();
        assert_eq!(config.validator_seconds, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_config_zero_rejected() {
        let config = TimeoutConfig {
            validator_seconds: 0,
        };
        assert!(matches!(
            config.validate(),
            Err(TimeoutValidationError::ValidatorOutOfBounds { value: 0 })
        ));
    }

    #[test]
    fn test_timeout_config_too_large_rejected() {
        let config = TimeoutConfig {
            validator_seconds: MAX_TIMEOUT_SECONDS + 1,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_config() {
        assert_eq!(TimeoutConfig::from_config(Some(60)).validator_seconds, 60);
        assert_eq!(TimeoutConfig::from_config(None).validator_seconds, 300);
        assert_eq!(
            TimeoutConfig::from_config(Some(2)).validator_duration(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_deadline_not_expired_immediately() {
        let deadline = Deadline::new(Duration::from_secs(10));
        assert_eq!(deadline.check(), TimeoutStatus::Ok);
    }

    #[test]
    fn test_deadline_expires() {
        let deadline = Deadline::new(Duration::from_millis(20));
        sleep(Duration::from_millis(60));
        assert!(deadline.check().is_timeout());
    }
}
