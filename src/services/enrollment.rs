//! Enrollment service: enroll, withdraw, and batch operations over course
//! offerings.
//!
//! Enrollment is guard, clash check, seat reservation, record write, in
//! that order. The seat reservation through the [`CapacityLedger`] is the
//! commit point for capacity; if the record write fails afterwards the
//! reserved seat is released before the error returns, so the counter
//! never drifts from the set of active records.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::api::{OccurrenceId, OfferingId, StudentId, TermId};
use crate::config::PeriodTable;
use crate::conflict::overlaps_in_time;
use crate::db::{CampusRepository, EnrollmentRepository, ScheduleRepository};
use crate::error::{SchedulingError, SchedulingResult};
use crate::models::enrollment::EnrollmentRecord;
use crate::models::occurrence::ScheduledOccurrence;
use crate::services::capacity::CapacityLedger;
use crate::services::deadline::Deadline;

/// Budget for the compensating release when the caller's deadline has
/// already expired. Compensation must still run.
const COMPENSATION_GRACE: Duration = Duration::from_secs(2);

/// One entry in a batch enrollment request.
#[derive(Debug, Clone, Copy)]
pub struct EnrollRequest {
    pub offering_id: OfferingId,
    pub occurrence_id: OccurrenceId,
}

pub struct EnrollmentService {
    repo: Arc<dyn CampusRepository>,
    ledger: CapacityLedger,
    periods: PeriodTable,
}

impl EnrollmentService {
    pub fn new(repo: Arc<dyn CampusRepository>, periods: PeriodTable) -> Self {
        let ledger = CapacityLedger::new(repo.clone());
        Self {
            repo,
            ledger,
            periods,
        }
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    /// Enroll a student in an offering via one of its occurrences.
    ///
    /// Order of checks:
    /// 1. duplicate guard: an active record for (student, offering) rejects
    ///    with `AlreadyEnrolled` before any seat movement;
    /// 2. the occurrence must exist, be active, and belong to the offering;
    /// 3. personal timetable clash scan against the student's other active
    ///    enrollments in the term;
    /// 4. seat reservation through the ledger;
    /// 5. record write, with a compensating release on failure.
    #[instrument(skip(self), fields(student = %student, offering = %offering))]
    pub async fn enroll(
        &self,
        student: StudentId,
        offering: OfferingId,
        occurrence: OccurrenceId,
        deadline: Deadline,
    ) -> SchedulingResult<EnrollmentRecord> {
        deadline.check("enroll")?;

        if self.repo.find_active(student, offering).await?.is_some() {
            return Err(SchedulingError::AlreadyEnrolled { student, offering });
        }

        let occ = self.load_occurrence(occurrence).await?;
        if !occ.is_active() {
            return Err(SchedulingError::Validation(format!(
                "occurrence {} is retired",
                occurrence
            )));
        }
        if occ.offering_id != offering {
            return Err(SchedulingError::Validation(format!(
                "occurrence {} does not belong to offering {}",
                occurrence, offering
            )));
        }

        self.check_personal_clash(student, &occ).await?;

        if !self.ledger.try_reserve_seat(offering, deadline).await? {
            info!("enrollment refused, no seat available");
            return Err(SchedulingError::CapacityExceeded { offering });
        }

        let record =
            EnrollmentRecord::new_active(student, offering, occurrence, occ.term, Utc::now());
        match self.repo.save_enrollment(&record).await {
            Ok(stored) => {
                info!(
                    enrollment = %stored.id.map(|id| id.to_string()).unwrap_or_default(),
                    "student enrolled"
                );
                Ok(stored)
            }
            Err(save_err) => {
                self.compensate_reservation(offering, deadline).await;
                Err(save_err.into())
            }
        }
    }

    /// Withdraw a student's active enrollment, releasing the seat.
    ///
    /// The record is kept with withdrawn status; a later enrollment in the
    /// same offering creates a fresh row. Withdrawing without an active
    /// record rejects with `NotEnrolled`.
    ///
    /// The record flip and the seat release must land together. If the
    /// release fails after the flip, the record is restored to active
    /// before the error returns, so the counter never drifts from the set
    /// of active records.
    #[instrument(skip(self), fields(student = %student, offering = %offering))]
    pub async fn withdraw(
        &self,
        student: StudentId,
        offering: OfferingId,
        deadline: Deadline,
    ) -> SchedulingResult<EnrollmentRecord> {
        deadline.check("withdraw")?;

        let record = self
            .repo
            .find_active(student, offering)
            .await?
            .ok_or(SchedulingError::NotEnrolled { student, offering })?;

        let mut withdrawn = record.clone();
        withdrawn
            .withdraw(Utc::now())
            .map_err(SchedulingError::Validation)?;
        let stored = self.repo.save_enrollment(&withdrawn).await?;

        if let Err(release_err) = self
            .ledger
            .release_seat(offering, grace_budget(deadline))
            .await
        {
            warn!(error = %release_err, "seat release failed, restoring enrollment");
            if let Err(revert_err) = self.repo.save_enrollment(&record).await {
                error!(
                    offering = %offering,
                    error = %revert_err,
                    "failed to restore enrollment after release failure"
                );
            }
            return Err(release_err);
        }
        info!("student withdrawn");
        Ok(stored)
    }

    /// Enroll a student in several offerings, independently per entry.
    ///
    /// Each entry succeeds or fails on its own; one rejection never rolls
    /// back earlier entries. The result vector is positionally aligned with
    /// the request.
    #[instrument(skip(self, requests), fields(student = %student, entries = requests.len()))]
    pub async fn batch_enroll(
        &self,
        student: StudentId,
        requests: &[EnrollRequest],
        deadline: Deadline,
    ) -> Vec<SchedulingResult<EnrollmentRecord>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(
                self.enroll(
                    student,
                    request.offering_id,
                    request.occurrence_id,
                    deadline,
                )
                .await,
            );
        }
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            "batch enrollment finished"
        );
        results
    }

    /// A student's active enrollments in a term, each joined with its
    /// occurrence.
    pub async fn student_schedule(
        &self,
        student: StudentId,
        term: &TermId,
    ) -> SchedulingResult<Vec<(EnrollmentRecord, ScheduledOccurrence)>> {
        Ok(self
            .repo
            .find_active_by_student_and_term(student, term)
            .await?)
    }

    /// Clash scan: the candidate occurrence against every occurrence the
    /// student is already actively enrolled in for the same term. Any
    /// temporal overlap is a clash; rooms and instructors are irrelevant
    /// for a single student's timetable.
    async fn check_personal_clash(
        &self,
        student: StudentId,
        candidate: &ScheduledOccurrence,
    ) -> SchedulingResult<()> {
        let enrolled = self
            .repo
            .find_active_by_student_and_term(student, &candidate.term)
            .await?;
        for (_, other) in &enrolled {
            if overlaps_in_time(candidate, other, &self.periods) {
                let clashing = other.id.ok_or_else(|| {
                    SchedulingError::Validation("persisted occurrence without id".to_string())
                })?;
                warn!(clashing = %clashing, "personal timetable clash");
                return Err(SchedulingError::ScheduleClash {
                    occurrence: clashing,
                });
            }
        }
        Ok(())
    }

    /// Release a seat reserved by an enrollment whose record write failed.
    /// A failed release is logged, never silently swallowed into the
    /// primary error.
    async fn compensate_reservation(&self, offering: OfferingId, deadline: Deadline) {
        if let Err(release_err) = self
            .ledger
            .release_seat(offering, grace_budget(deadline))
            .await
        {
            error!(
                offering = %offering,
                error = %release_err,
                "compensating seat release failed"
            );
        }
    }

    async fn load_occurrence(&self, id: OccurrenceId) -> SchedulingResult<ScheduledOccurrence> {
        self.repo
            .find_occurrence(id)
            .await?
            .ok_or_else(|| SchedulingError::not_found("occurrence", id))
    }
}

/// Compensating actions still run when the caller's budget is spent, under
/// the grace allowance instead.
fn grace_budget(deadline: Deadline) -> Deadline {
    if deadline.expired() {
        Deadline::within(COMPENSATION_GRACE)
    } else {
        deadline
    }
}
