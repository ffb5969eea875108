//! Time budget for service operations.
//!
//! Every blocking or retrying service path takes a [`Deadline`] so a caller
//! bounds how long it is willing to wait. An expired deadline surfaces as
//! [`SchedulingError::Timeout`] with the operation name.

use std::time::{Duration, Instant};

use crate::error::{SchedulingError, SchedulingResult};

/// A point in time after which an operation must give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn within(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Deadline at an absolute instant.
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Time left before expiry; zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Fail with a timeout naming `operation` if the deadline has passed.
    pub fn check(&self, operation: &'static str) -> SchedulingResult<()> {
        if self.expired() {
            Err(SchedulingError::Timeout { operation })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_deadline_passes() {
        let deadline = Deadline::within(Duration::from_secs(60));
        assert!(!deadline.expired());
        assert!(deadline.check("op").is_ok());
    }

    #[test]
    fn test_expired_deadline_names_operation() {
        let deadline = Deadline::at(Instant::now() - Duration::from_millis(1));
        assert!(deadline.expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
        match deadline.check("reserve_seat") {
            Err(SchedulingError::Timeout { operation }) => {
                assert_eq!(operation, "reserve_seat");
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
