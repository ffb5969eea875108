//! Repository port traits.
//!
//! The scheduling core owns these contracts; the surrounding system owns
//! the implementations. The crate ships an in-memory implementation
//! (`LocalRepository`) for tests, local development, and embedding.
//!
//! The ports encode the two consistency obligations the core relies on:
//!
//! - `save_occurrence` enforces the (room, slot, term) and
//!   (instructor, slot, term) uniqueness constraints authoritatively, so a
//!   narrow race between two conflict-checked writers is resolved by the
//!   store rejecting one of them.
//! - `compare_and_swap_committed_seats` is a single atomic read-modify-write
//!   on the seat counter, never a read-then-write across two round trips.

use async_trait::async_trait;

use crate::api::{EnrollmentId, OccurrenceId, OfferingId, StudentId, TermId};
use crate::db::error::RepositoryResult;
use crate::models::enrollment::EnrollmentRecord;
use crate::models::occurrence::ScheduledOccurrence;
use crate::models::offering::CourseOffering;

/// Persisted schedule occurrences for a term.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// All active (non-retired) occurrences in a term.
    async fn find_active_by_term(
        &self,
        term: &TermId,
    ) -> RepositoryResult<Vec<ScheduledOccurrence>>;

    async fn find_occurrence(
        &self,
        id: OccurrenceId,
    ) -> RepositoryResult<Option<ScheduledOccurrence>>;

    /// Insert or update an occurrence, assigning an id on first save.
    ///
    /// Implementations must reject, with a constraint violation, an active
    /// occurrence whose (term, weekday, slot, room) or (term, weekday,
    /// slot, instructor) key is already taken by a different active
    /// occurrence. The violation's context names the colliding occurrence
    /// id and the axis.
    async fn save_occurrence(
        &self,
        occurrence: &ScheduledOccurrence,
    ) -> RepositoryResult<ScheduledOccurrence>;
}

/// Course offerings and their seat counters.
#[async_trait]
pub trait OfferingRepository: Send + Sync {
    async fn find_offering(&self, id: OfferingId) -> RepositoryResult<Option<CourseOffering>>;

    /// Insert or update an offering (administrative path; does not touch
    /// the committed-seats counter of an existing row).
    async fn save_offering(&self, offering: &CourseOffering) -> RepositoryResult<CourseOffering>;

    /// Atomically set `committed_seats` to `new` iff it currently equals
    /// `expected`. Returns whether the swap happened. This is the only
    /// write path for the counter.
    async fn compare_and_swap_committed_seats(
        &self,
        id: OfferingId,
        expected: u32,
        new: u32,
    ) -> RepositoryResult<bool>;
}

/// Enrollment records, joined with occurrence data where the clash check
/// needs it.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// The single active record for (student, offering), if any.
    async fn find_active(
        &self,
        student: StudentId,
        offering: OfferingId,
    ) -> RepositoryResult<Option<EnrollmentRecord>>;

    /// All active records for a student in a term, each joined with its
    /// occurrence.
    async fn find_active_by_student_and_term(
        &self,
        student: StudentId,
        term: &TermId,
    ) -> RepositoryResult<Vec<(EnrollmentRecord, ScheduledOccurrence)>>;

    async fn find_enrollment(
        &self,
        id: EnrollmentId,
    ) -> RepositoryResult<Option<EnrollmentRecord>>;

    /// Insert or update a record, assigning an id on first save.
    async fn save_enrollment(
        &self,
        record: &EnrollmentRecord,
    ) -> RepositoryResult<EnrollmentRecord>;

    /// Number of active records referencing an occurrence (dependent check
    /// for retirement).
    async fn count_active_by_occurrence(&self, occurrence: OccurrenceId)
        -> RepositoryResult<usize>;
}

/// Full repository contract: all three ports plus a liveness probe.
#[async_trait]
pub trait CampusRepository:
    ScheduleRepository + OfferingRepository + EnrollmentRepository
{
    async fn health_check(&self) -> RepositoryResult<bool>;
}
