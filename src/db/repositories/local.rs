//! In-memory repository for unit testing, local development, and embedding.
//!
//! A single `parking_lot::RwLock` over the whole store gives every
//! operation the atomicity the ports require: the seat-counter CAS and the
//! slot-uniqueness check in `save_occurrence` each run under one write
//! lock, so no interleaving can split their read from their write.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use crate::api::{EnrollmentId, OccurrenceId, OfferingId, StudentId, TermId};
use crate::db::error::{ErrorContext, RepositoryError, RepositoryResult};
use crate::db::repository::{
    CampusRepository, EnrollmentRepository, OfferingRepository, ScheduleRepository,
};
use crate::models::enrollment::EnrollmentRecord;
use crate::models::occurrence::ScheduledOccurrence;
use crate::models::offering::CourseOffering;

#[derive(Default)]
struct Store {
    occurrences: HashMap<i64, ScheduledOccurrence>,
    offerings: HashMap<i64, CourseOffering>,
    enrollments: HashMap<i64, EnrollmentRecord>,
}

/// In-memory implementation of all repository ports.
pub struct LocalRepository {
    store: RwLock<Store>,
    next_id: AtomicI64,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// The uniqueness constraint behind `save_occurrence`: no two active
    /// occurrences may hold the same (term, weekday, slot) key on the same
    /// room or the same instructor. The in-memory analogue of a composite
    /// unique index.
    fn check_slot_constraints(
        store: &Store,
        candidate: &ScheduledOccurrence,
    ) -> RepositoryResult<()> {
        if !candidate.is_active() {
            return Ok(());
        }
        for other in store.occurrences.values() {
            if !other.is_active()
                || other.id == candidate.id
                || other.term != candidate.term
                || other.weekday != candidate.weekday
                || other.time != candidate.time
                || candidate.is_combined_with(other)
            {
                continue;
            }
            let axis = if candidate.room_id.is_some() && candidate.room_id == other.room_id {
                Some("room")
            } else if candidate.instructor_id.is_some()
                && candidate.instructor_id == other.instructor_id
            {
                Some("instructor")
            } else {
                None
            };
            if let (Some(axis), Some(other_id)) = (axis, other.id) {
                let context = ErrorContext::new("save_occurrence")
                    .with_entity("occurrence")
                    .with_entity_id(other_id)
                    .with_details(axis);
                return Err(RepositoryError::constraint_with_context(
                    format!("slot already taken on the {} axis", axis),
                    context,
                ));
            }
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn find_active_by_term(
        &self,
        term: &TermId,
    ) -> RepositoryResult<Vec<ScheduledOccurrence>> {
        let store = self.store.read();
        Ok(store
            .occurrences
            .values()
            .filter(|occ| occ.is_active() && &occ.term == term)
            .cloned()
            .collect())
    }

    async fn find_occurrence(
        &self,
        id: OccurrenceId,
    ) -> RepositoryResult<Option<ScheduledOccurrence>> {
        Ok(self.store.read().occurrences.get(&id.value()).cloned())
    }

    async fn save_occurrence(
        &self,
        occurrence: &ScheduledOccurrence,
    ) -> RepositoryResult<ScheduledOccurrence> {
        let mut store = self.store.write();
        let mut stored = occurrence.clone();
        if stored.id.is_none() {
            stored.id = Some(OccurrenceId::new(self.allocate_id()));
        }
        Self::check_slot_constraints(&store, &stored)?;
        // Checked above: id is always Some here.
        let key = stored
            .id
            .map(|id| id.value())
            .ok_or_else(|| RepositoryError::internal("occurrence id missing after assignment"))?;
        store.occurrences.insert(key, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl OfferingRepository for LocalRepository {
    async fn find_offering(&self, id: OfferingId) -> RepositoryResult<Option<CourseOffering>> {
        Ok(self.store.read().offerings.get(&id.value()).cloned())
    }

    async fn save_offering(&self, offering: &CourseOffering) -> RepositoryResult<CourseOffering> {
        let mut store = self.store.write();
        store
            .offerings
            .insert(offering.id.value(), offering.clone());
        Ok(offering.clone())
    }

    async fn compare_and_swap_committed_seats(
        &self,
        id: OfferingId,
        expected: u32,
        new: u32,
    ) -> RepositoryResult<bool> {
        let mut store = self.store.write();
        let offering = store.offerings.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("offering {} not found", id),
                ErrorContext::new("compare_and_swap_committed_seats")
                    .with_entity("offering")
                    .with_entity_id(id),
            )
        })?;
        if offering.committed_seats != expected {
            return Ok(false);
        }
        offering.committed_seats = new;
        Ok(true)
    }
}

#[async_trait]
impl EnrollmentRepository for LocalRepository {
    async fn find_active(
        &self,
        student: StudentId,
        offering: OfferingId,
    ) -> RepositoryResult<Option<EnrollmentRecord>> {
        let store = self.store.read();
        Ok(store
            .enrollments
            .values()
            .find(|rec| {
                rec.is_active() && rec.student_id == student && rec.offering_id == offering
            })
            .cloned())
    }

    async fn find_active_by_student_and_term(
        &self,
        student: StudentId,
        term: &TermId,
    ) -> RepositoryResult<Vec<(EnrollmentRecord, ScheduledOccurrence)>> {
        let store = self.store.read();
        let mut joined = Vec::new();
        for record in store.enrollments.values() {
            if !record.is_active() || record.student_id != student || &record.term != term {
                continue;
            }
            let occurrence = store
                .occurrences
                .get(&record.occurrence_id.value())
                .ok_or_else(|| {
                    RepositoryError::internal(format!(
                        "enrollment {} references missing occurrence {}",
                        record.id.map(|id| id.value()).unwrap_or_default(),
                        record.occurrence_id
                    ))
                })?;
            joined.push((record.clone(), occurrence.clone()));
        }
        Ok(joined)
    }

    async fn find_enrollment(
        &self,
        id: EnrollmentId,
    ) -> RepositoryResult<Option<EnrollmentRecord>> {
        Ok(self.store.read().enrollments.get(&id.value()).cloned())
    }

    async fn save_enrollment(
        &self,
        record: &EnrollmentRecord,
    ) -> RepositoryResult<EnrollmentRecord> {
        let mut store = self.store.write();
        let mut stored = record.clone();
        if stored.id.is_none() {
            // Uniqueness: one active record per (student, offering, term).
            if stored.is_active()
                && store.enrollments.values().any(|existing| {
                    existing.is_active()
                        && existing.student_id == stored.student_id
                        && existing.offering_id == stored.offering_id
                        && existing.term == stored.term
                })
            {
                return Err(RepositoryError::constraint_with_context(
                    "active enrollment already exists for student and offering",
                    ErrorContext::new("save_enrollment")
                        .with_entity("enrollment")
                        .with_details(format!(
                            "student={} offering={}",
                            stored.student_id, stored.offering_id
                        )),
                ));
            }
            stored.id = Some(EnrollmentId::new(self.allocate_id()));
        }
        let key = stored
            .id
            .map(|id| id.value())
            .ok_or_else(|| RepositoryError::internal("enrollment id missing after assignment"))?;
        store.enrollments.insert(key, stored.clone());
        Ok(stored)
    }

    async fn count_active_by_occurrence(
        &self,
        occurrence: OccurrenceId,
    ) -> RepositoryResult<usize> {
        let store = self.store.read();
        Ok(store
            .enrollments
            .values()
            .filter(|rec| rec.is_active() && rec.occurrence_id == occurrence)
            .count())
    }
}

#[async_trait]
impl CampusRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::occurrence::{OccurrenceKind, OccurrenceStatus};
    use crate::models::offering::OfferingStatus;
    use crate::models::slot::{PeriodNumber, SlotTime, WeekParity, WeekRange, Weekday};
    use chrono::Utc;

    fn occurrence(offering: i64) -> ScheduledOccurrence {
        ScheduledOccurrence {
            id: None,
            offering_id: OfferingId::new(offering),
            room_id: Some(crate::api::RoomId::new(1)),
            instructor_id: Some(crate::api::InstructorId::new(offering)),
            term: TermId::new("fall", 2025),
            weekday: Weekday::new(2).unwrap(),
            time: SlotTime::Period(PeriodNumber::new(3).unwrap()),
            weeks: Some(WeekRange::new(1, 16).unwrap()),
            parity: WeekParity::All,
            roster: vec![],
            kind: OccurrenceKind::Normal,
            status: OccurrenceStatus::Active,
            combined_with: vec![],
        }
    }

    fn offering(id: i64, capacity: u32) -> CourseOffering {
        CourseOffering {
            id: OfferingId::new(id),
            term: TermId::new("fall", 2025),
            capacity,
            committed_seats: 0,
            enrollment_window: None,
            status: OfferingStatus::Open,
        }
    }

    #[tokio::test]
    async fn test_save_assigns_ids() {
        let repo = LocalRepository::new();
        let a = repo.save_occurrence(&occurrence(1)).await.unwrap();
        let mut second = occurrence(2);
        second.room_id = Some(crate::api::RoomId::new(2));
        let b = repo.save_occurrence(&second).await.unwrap();
        assert!(a.id.is_some());
        assert!(b.id.is_some());
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_room_uniqueness_enforced() {
        let repo = LocalRepository::new();
        repo.save_occurrence(&occurrence(1)).await.unwrap();

        // Same room, same slot, different instructor.
        let mut dup = occurrence(2);
        dup.instructor_id = Some(crate::api::InstructorId::new(99));
        let err = repo.save_occurrence(&dup).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation { .. }));
        assert_eq!(err.context().details.as_deref(), Some("room"));
    }

    #[tokio::test]
    async fn test_instructor_uniqueness_enforced() {
        let repo = LocalRepository::new();
        repo.save_occurrence(&occurrence(1)).await.unwrap();

        let mut dup = occurrence(2);
        dup.room_id = Some(crate::api::RoomId::new(2));
        dup.instructor_id = Some(crate::api::InstructorId::new(1));
        let err = repo.save_occurrence(&dup).await.unwrap_err();
        assert_eq!(err.context().details.as_deref(), Some("instructor"));
    }

    #[tokio::test]
    async fn test_retired_occurrence_frees_slot() {
        let repo = LocalRepository::new();
        let mut stored = repo.save_occurrence(&occurrence(1)).await.unwrap();
        stored.status = OccurrenceStatus::Retired;
        repo.save_occurrence(&stored).await.unwrap();

        let mut replacement = occurrence(2);
        replacement.instructor_id = Some(crate::api::InstructorId::new(99));
        assert!(repo.save_occurrence(&replacement).await.is_ok());
    }

    #[tokio::test]
    async fn test_cas_succeeds_only_on_expected() {
        let repo = LocalRepository::new();
        repo.save_offering(&offering(1, 5)).await.unwrap();

        assert!(repo
            .compare_and_swap_committed_seats(OfferingId::new(1), 0, 1)
            .await
            .unwrap());
        // Stale expectation loses.
        assert!(!repo
            .compare_and_swap_committed_seats(OfferingId::new(1), 0, 1)
            .await
            .unwrap());
        let stored = repo.find_offering(OfferingId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.committed_seats, 1);
    }

    #[tokio::test]
    async fn test_duplicate_active_enrollment_rejected() {
        let repo = LocalRepository::new();
        let occ = repo.save_occurrence(&occurrence(1)).await.unwrap();
        let record = EnrollmentRecord::new_active(
            StudentId::new(7),
            OfferingId::new(1),
            occ.id.unwrap(),
            TermId::new("fall", 2025),
            Utc::now(),
        );
        repo.save_enrollment(&record).await.unwrap();
        let err = repo.save_enrollment(&record).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_join_with_occurrence() {
        let repo = LocalRepository::new();
        let occ = repo.save_occurrence(&occurrence(1)).await.unwrap();
        let record = EnrollmentRecord::new_active(
            StudentId::new(7),
            OfferingId::new(1),
            occ.id.unwrap(),
            TermId::new("fall", 2025),
            Utc::now(),
        );
        repo.save_enrollment(&record).await.unwrap();

        let joined = repo
            .find_active_by_student_and_term(StudentId::new(7), &TermId::new("fall", 2025))
            .await
            .unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].1.id, occ.id);
    }
}
