//! Enrollment record: a student's membership in one course offering via
//! one scheduled occurrence.
//!
//! Records are never hard-deleted. Withdrawal flips the status and stamps
//! the time; re-enrollment after withdrawal creates a fresh row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{EnrollmentId, OccurrenceId, OfferingId, StudentId, TermId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Withdrawn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// Repository-assigned id; `None` until first persisted.
    #[serde(default)]
    pub id: Option<EnrollmentId>,
    pub student_id: StudentId,
    pub offering_id: OfferingId,
    pub occurrence_id: OccurrenceId,
    pub term: TermId,
    pub enrolled_at: DateTime<Utc>,
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub withdrawn_at: Option<DateTime<Utc>>,
}

impl EnrollmentRecord {
    /// Fresh active record, not yet persisted.
    pub fn new_active(
        student_id: StudentId,
        offering_id: OfferingId,
        occurrence_id: OccurrenceId,
        term: TermId,
        enrolled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            student_id,
            offering_id,
            occurrence_id,
            term,
            enrolled_at,
            status: EnrollmentStatus::Active,
            withdrawn_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }

    /// Flip to withdrawn. Returns an error if the record is not active;
    /// a withdrawn row is never resurrected in place.
    pub fn withdraw(&mut self, at: DateTime<Utc>) -> Result<(), String> {
        if !self.is_active() {
            return Err("enrollment record is not active".to_string());
        }
        self.status = EnrollmentStatus::Withdrawn;
        self.withdrawn_at = Some(at);
        Ok(())
    }
}
