//! Scheduler service: admission, modification, and retirement of
//! scheduled occurrences.
//!
//! Admission is check-then-write: a full conflict scan over the term's
//! active occurrences, then the repository save. The storage layer's
//! uniqueness constraints backstop the narrow race between two writers
//! that both passed the scan; a constraint rejection is mapped back into
//! the same conflict error the scan would have produced.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::{OccurrenceId, TermId};
use crate::config::PeriodTable;
use crate::conflict::{conflict_axes, ConflictAxis};
use crate::db::error::RepositoryError;
use crate::db::{CampusRepository, EnrollmentRepository, ScheduleRepository};
use crate::error::{Collision, SchedulingError, SchedulingResult};
use crate::models::occurrence::{OccurrenceStatus, ScheduledOccurrence};
use crate::models::slot::{SlotTime, WeekParity, WeekRange, Weekday};
use crate::services::deadline::Deadline;

/// Partial update applied by [`SchedulerService::reschedule_occurrence`].
///
/// Outer `None` leaves a field untouched; for the nullable fields the
/// inner option is the new value, so `Some(None)` clears an assignment.
/// Term and offering are immutable once scheduled.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceChanges {
    pub room_id: Option<Option<crate::api::RoomId>>,
    pub instructor_id: Option<Option<crate::api::InstructorId>>,
    pub weekday: Option<Weekday>,
    pub time: Option<SlotTime>,
    pub weeks: Option<Option<WeekRange>>,
    pub parity: Option<WeekParity>,
    pub roster: Option<Vec<crate::api::RosterTag>>,
}

impl OccurrenceChanges {
    fn apply(&self, occurrence: &mut ScheduledOccurrence) {
        if let Some(room) = self.room_id {
            occurrence.room_id = room;
        }
        if let Some(instructor) = self.instructor_id {
            occurrence.instructor_id = instructor;
        }
        if let Some(weekday) = self.weekday {
            occurrence.weekday = weekday;
        }
        if let Some(time) = self.time {
            occurrence.time = time;
        }
        if let Some(weeks) = self.weeks {
            occurrence.weeks = weeks;
        }
        if let Some(parity) = self.parity {
            occurrence.parity = parity;
        }
        if let Some(ref roster) = self.roster {
            occurrence.roster = roster.clone();
        }
    }
}

pub struct SchedulerService {
    repo: Arc<dyn CampusRepository>,
    periods: PeriodTable,
}

impl SchedulerService {
    pub fn new(repo: Arc<dyn CampusRepository>, periods: PeriodTable) -> Self {
        Self { repo, periods }
    }

    /// Admit a new occurrence into the timetable.
    ///
    /// Rejects malformed candidates before any repository round trip, then
    /// scans the term for collisions and saves. Returns the stored
    /// occurrence with its assigned id.
    #[instrument(skip(self, candidate), fields(offering = %candidate.offering_id))]
    pub async fn schedule_occurrence(
        &self,
        candidate: ScheduledOccurrence,
        deadline: Deadline,
    ) -> SchedulingResult<ScheduledOccurrence> {
        self.validate(&candidate)?;
        self.check_conflicts(&candidate, deadline).await?;

        deadline.check("schedule_occurrence")?;
        let stored = self
            .repo
            .save_occurrence(&candidate)
            .await
            .map_err(map_save_error)?;
        info!(
            occurrence = %stored.id.map(|id| id.to_string()).unwrap_or_default(),
            term = %stored.term,
            weekday = stored.weekday.value(),
            "occurrence scheduled"
        );
        Ok(stored)
    }

    /// Apply a partial update to an existing active occurrence, re-running
    /// the full conflict scan against the changed placement.
    #[instrument(skip(self, changes))]
    pub async fn reschedule_occurrence(
        &self,
        id: OccurrenceId,
        changes: OccurrenceChanges,
        deadline: Deadline,
    ) -> SchedulingResult<ScheduledOccurrence> {
        let mut occurrence = self.load(id).await?;
        if !occurrence.is_active() {
            return Err(SchedulingError::Validation(format!(
                "occurrence {} is retired and cannot be rescheduled",
                id
            )));
        }

        changes.apply(&mut occurrence);
        self.validate(&occurrence)?;
        self.check_conflicts(&occurrence, deadline).await?;

        deadline.check("reschedule_occurrence")?;
        let stored = self
            .repo
            .save_occurrence(&occurrence)
            .await
            .map_err(map_save_error)?;
        info!(occurrence = %id, "occurrence rescheduled");
        Ok(stored)
    }

    /// Mark an occurrence retired, freeing its slot for future admissions.
    ///
    /// Refused while active enrollments still reference it; withdraw or
    /// move those students first. Retiring an already-retired occurrence
    /// is a no-op.
    #[instrument(skip(self))]
    pub async fn retire_occurrence(
        &self,
        id: OccurrenceId,
        deadline: Deadline,
    ) -> SchedulingResult<()> {
        deadline.check("retire_occurrence")?;
        let mut occurrence = self.load(id).await?;
        if !occurrence.is_active() {
            return Ok(());
        }

        let active = self.repo.count_active_by_occurrence(id).await?;
        if active > 0 {
            warn!(occurrence = %id, active, "retirement refused, enrollments attached");
            return Err(SchedulingError::HasDependents {
                occurrence: id,
                active,
            });
        }

        occurrence.status = OccurrenceStatus::Retired;
        self.repo.save_occurrence(&occurrence).await?;
        info!(occurrence = %id, "occurrence retired");
        Ok(())
    }

    /// All collisions a candidate would cause against a term's active
    /// occurrences. Empty means the placement is admissible.
    pub async fn probe_conflicts(
        &self,
        candidate: &ScheduledOccurrence,
    ) -> SchedulingResult<Vec<Collision>> {
        let existing = self.repo.find_active_by_term(&candidate.term).await?;
        Ok(self.collisions_against(candidate, &existing))
    }

    /// The full active schedule for a term.
    pub async fn term_schedule(&self, term: &TermId) -> SchedulingResult<Vec<ScheduledOccurrence>> {
        Ok(self.repo.find_active_by_term(term).await?)
    }

    fn validate(&self, candidate: &ScheduledOccurrence) -> SchedulingResult<()> {
        candidate.validate().map_err(SchedulingError::Validation)?;
        if candidate.time.resolve(&self.periods).is_none() {
            return Err(SchedulingError::Validation(format!(
                "slot {:?} does not resolve against the period table",
                candidate.time
            )));
        }
        Ok(())
    }

    async fn check_conflicts(
        &self,
        candidate: &ScheduledOccurrence,
        deadline: Deadline,
    ) -> SchedulingResult<()> {
        deadline.check("conflict_scan")?;
        let existing = self.repo.find_active_by_term(&candidate.term).await?;
        let collisions = self.collisions_against(candidate, &existing);
        if collisions.is_empty() {
            Ok(())
        } else {
            warn!(
                offering = %candidate.offering_id,
                collisions = collisions.len(),
                "candidate rejected by conflict scan"
            );
            Err(SchedulingError::Conflict { collisions })
        }
    }

    fn collisions_against(
        &self,
        candidate: &ScheduledOccurrence,
        existing: &[ScheduledOccurrence],
    ) -> Vec<Collision> {
        let mut collisions = Vec::new();
        for other in existing {
            let Some(other_id) = other.id else { continue };
            // Updates skip the row being replaced.
            if candidate.id == Some(other_id) {
                continue;
            }
            for axis in conflict_axes(candidate, other, &self.periods) {
                collisions.push(Collision {
                    occurrence_id: other_id,
                    axis,
                });
            }
        }
        collisions
    }

    async fn load(&self, id: OccurrenceId) -> SchedulingResult<ScheduledOccurrence> {
        self.repo
            .find_occurrence(id)
            .await?
            .ok_or_else(|| SchedulingError::not_found("occurrence", id))
    }
}

/// Map a storage-layer uniqueness rejection back into the conflict error
/// the scan would have produced, using the colliding id and axis the
/// constraint context carries. Anything else passes through as a store
/// failure.
fn map_save_error(err: RepositoryError) -> SchedulingError {
    match &err {
        RepositoryError::ConstraintViolation { context, .. } => {
            let collisions = context
                .entity_id
                .as_deref()
                .and_then(|id| id.parse::<i64>().ok())
                .map(|id| {
                    let axis = match context.details.as_deref() {
                        Some("instructor") => ConflictAxis::Instructor,
                        Some("roster") => ConflictAxis::Roster,
                        _ => ConflictAxis::Room,
                    };
                    vec![Collision {
                        occurrence_id: OccurrenceId::new(id),
                        axis,
                    }]
                })
                .unwrap_or_default();
            SchedulingError::Conflict { collisions }
        }
        _ => SchedulingError::Store(err),
    }
}
