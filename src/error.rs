//! Domain error taxonomy for the scheduling and enrollment services.
//!
//! Deterministic business rejections (conflicts, capacity, idempotency
//! guards) are distinct variants carrying the ids a caller needs to render
//! a precise message; transient store failures keep their retryable
//! classification from the repository layer.

use serde::{Deserialize, Serialize};

use crate::api::{OccurrenceId, OfferingId, StudentId};
use crate::conflict::ConflictAxis;
use crate::db::error::RepositoryError;

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// One colliding occurrence and the axis it collided on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub occurrence_id: OccurrenceId,
    pub axis: ConflictAxis,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// Malformed input, rejected before any repository call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The candidate occurrence collides with existing occurrences.
    /// Deterministic business rejection; never retried automatically.
    #[error("schedule conflict with {} existing occurrence(s)", collisions.len())]
    Conflict { collisions: Vec<Collision> },

    /// The student's own timetable overlaps the candidate occurrence in
    /// time. Personal clashes ignore rooms and instructors.
    #[error("clashes with already-enrolled occurrence {occurrence}")]
    ScheduleClash { occurrence: OccurrenceId },

    /// The offering has no free seat (or is closed / outside its window).
    /// A legitimate full-offering state, surfaced as-is.
    #[error("offering {offering} has no seat available")]
    CapacityExceeded { offering: OfferingId },

    /// Idempotency guard: an active record already exists.
    #[error("student {student} is already enrolled in offering {offering}")]
    AlreadyEnrolled {
        student: StudentId,
        offering: OfferingId,
    },

    /// Idempotency guard: no active record to withdraw.
    #[error("student {student} has no active enrollment in offering {offering}")]
    NotEnrolled {
        student: StudentId,
        offering: OfferingId,
    },

    /// Active enrollments still reference the occurrence being retired.
    #[error("occurrence {occurrence} still has {active} active enrollment(s)")]
    HasDependents {
        occurrence: OccurrenceId,
        active: usize,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Caller-supplied deadline expired. No partial mutation survives.
    #[error("operation {operation} exceeded its deadline")]
    Timeout { operation: &'static str },

    /// Underlying store failure; retryable iff the repository says so.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl SchedulingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Safe to retry with backoff. Conflicts, capacity and idempotency
    /// rejections are deterministic and never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::error::RepositoryError;

    #[test]
    fn test_business_rejections_not_retryable() {
        let err = SchedulingError::CapacityExceeded {
            offering: OfferingId::new(1),
        };
        assert!(!err.is_retryable());

        let err = SchedulingError::Conflict { collisions: vec![] };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transient_store_retryable() {
        let err = SchedulingError::Store(RepositoryError::timeout("lock wait"));
        assert!(err.is_retryable());

        let err = SchedulingError::Store(RepositoryError::not_found("missing"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_clash_message_names_occurrence() {
        let err = SchedulingError::ScheduleClash {
            occurrence: OccurrenceId::new(7),
        };
        assert_eq!(
            err.to_string(),
            "clashes with already-enrolled occurrence 7"
        );
    }
}
