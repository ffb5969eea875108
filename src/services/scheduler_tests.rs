use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::api::{InstructorId, OccurrenceId, OfferingId, RoomId, StudentId, TermId};
use crate::config::PeriodTable;
use crate::conflict::ConflictAxis;
use crate::db::{CampusRepository, EnrollmentRepository, LocalRepository, ScheduleRepository};
use crate::error::SchedulingError;
use crate::models::enrollment::EnrollmentRecord;
use crate::models::occurrence::{OccurrenceKind, OccurrenceStatus, ScheduledOccurrence};
use crate::models::slot::{ClockWindow, PeriodNumber, SlotTime, WeekParity, WeekRange, Weekday};
use crate::services::deadline::Deadline;
use crate::services::scheduler::{OccurrenceChanges, SchedulerService};

fn term() -> TermId {
    TermId::new("fall", 2025)
}

fn occurrence(offering: i64, period: u8) -> ScheduledOccurrence {
    ScheduledOccurrence {
        id: None,
        offering_id: OfferingId::new(offering),
        room_id: Some(RoomId::new(offering)),
        instructor_id: Some(InstructorId::new(100 + offering)),
        term: term(),
        weekday: Weekday::new(2).unwrap(),
        time: SlotTime::Period(PeriodNumber::new(period).unwrap()),
        weeks: Some(WeekRange::new(1, 16).unwrap()),
        parity: WeekParity::All,
        roster: vec![],
        kind: OccurrenceKind::Normal,
        status: OccurrenceStatus::Active,
        combined_with: vec![],
    }
}

fn service() -> (Arc<dyn CampusRepository>, SchedulerService) {
    let repo: Arc<dyn CampusRepository> = Arc::new(LocalRepository::new());
    let service = SchedulerService::new(repo.clone(), PeriodTable::standard());
    (repo, service)
}

fn budget() -> Deadline {
    Deadline::within(Duration::from_secs(5))
}

#[tokio::test]
async fn test_schedule_assigns_id() {
    let (_, service) = service();
    let stored = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();
    assert!(stored.id.is_some());
    assert_eq!(service.term_schedule(&term()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_room_collision_rejected_with_axis() {
    let (_, service) = service();
    let first = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();

    let mut contender = occurrence(2, 3);
    contender.room_id = first.room_id;
    let err = service
        .schedule_occurrence(contender, budget())
        .await
        .unwrap_err();
    match err {
        SchedulingError::Conflict { collisions } => {
            assert_eq!(collisions.len(), 1);
            assert_eq!(collisions[0].occurrence_id, first.id.unwrap());
            assert_eq!(collisions[0].axis, ConflictAxis::Room);
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejection_leaves_term_unchanged() {
    let (_, service) = service();
    service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();

    let mut contender = occurrence(2, 3);
    contender.room_id = Some(RoomId::new(1));
    assert!(service
        .schedule_occurrence(contender, budget())
        .await
        .is_err());
    assert_eq!(service.term_schedule(&term()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_candidate_rejected_before_store() {
    let (repo, service) = service();
    let mut bad = occurrence(1, 3);
    bad.time = SlotTime::Clock(ClockWindow {
        start: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    });
    let err = service.schedule_occurrence(bad, budget()).await.unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));
    assert!(repo.find_active_by_term(&term()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reschedule_to_free_slot() {
    let (_, service) = service();
    let stored = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();

    let changes = OccurrenceChanges {
        time: Some(SlotTime::Period(PeriodNumber::new(5).unwrap())),
        ..Default::default()
    };
    let moved = service
        .reschedule_occurrence(stored.id.unwrap(), changes, budget())
        .await
        .unwrap();
    assert_eq!(moved.time, SlotTime::Period(PeriodNumber::new(5).unwrap()));
}

#[tokio::test]
async fn test_reschedule_excludes_own_row_from_scan() {
    let (_, service) = service();
    let stored = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();

    // Changing only the roster keeps the slot; the scan must not see the
    // row being replaced as a collision.
    let changes = OccurrenceChanges {
        roster: Some(vec![crate::api::RosterTag::new("CS-1")]),
        ..Default::default()
    };
    assert!(service
        .reschedule_occurrence(stored.id.unwrap(), changes, budget())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_reschedule_into_occupied_slot_rejected() {
    let (_, service) = service();
    service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();
    let mut second = occurrence(2, 5);
    second.room_id = Some(RoomId::new(1));
    let second = service
        .schedule_occurrence(second, budget())
        .await
        .unwrap();

    // Moving the second occurrence onto period 3 collides on the room.
    let changes = OccurrenceChanges {
        time: Some(SlotTime::Period(PeriodNumber::new(3).unwrap())),
        ..Default::default()
    };
    let err = service
        .reschedule_occurrence(second.id.unwrap(), changes, budget())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Conflict { .. }));
}

#[tokio::test]
async fn test_clearing_room_assignment() {
    let (_, service) = service();
    let stored = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();

    let changes = OccurrenceChanges {
        room_id: Some(None),
        ..Default::default()
    };
    let moved = service
        .reschedule_occurrence(stored.id.unwrap(), changes, budget())
        .await
        .unwrap();
    assert!(moved.room_id.is_none());
}

#[tokio::test]
async fn test_retire_frees_slot() {
    let (_, service) = service();
    let stored = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();
    service
        .retire_occurrence(stored.id.unwrap(), budget())
        .await
        .unwrap();

    // The vacated slot admits a new occurrence with the same room.
    let mut replacement = occurrence(2, 3);
    replacement.room_id = Some(RoomId::new(1));
    assert!(service
        .schedule_occurrence(replacement, budget())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_retire_is_idempotent() {
    let (_, service) = service();
    let stored = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();
    let id = stored.id.unwrap();
    service.retire_occurrence(id, budget()).await.unwrap();
    assert!(service.retire_occurrence(id, budget()).await.is_ok());
}

#[tokio::test]
async fn test_retire_refused_with_active_enrollments() {
    let (repo, service) = service();
    let stored = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();
    let record = EnrollmentRecord::new_active(
        StudentId::new(7),
        OfferingId::new(1),
        stored.id.unwrap(),
        term(),
        Utc::now(),
    );
    repo.save_enrollment(&record).await.unwrap();

    let err = service
        .retire_occurrence(stored.id.unwrap(), budget())
        .await
        .unwrap_err();
    match err {
        SchedulingError::HasDependents { active, .. } => assert_eq!(active, 1),
        other => panic!("expected dependents rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retire_missing_occurrence() {
    let (_, service) = service();
    let err = service
        .retire_occurrence(OccurrenceId::new(404), budget())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::NotFound { .. }));
}

#[tokio::test]
async fn test_probe_reports_without_mutating() {
    let (_, service) = service();
    let first = service
        .schedule_occurrence(occurrence(1, 3), budget())
        .await
        .unwrap();

    let mut contender = occurrence(2, 3);
    contender.room_id = first.room_id;
    let collisions = service.probe_conflicts(&contender).await.unwrap();
    assert_eq!(collisions.len(), 1);
    assert_eq!(service.term_schedule(&term()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_expired_deadline_times_out() {
    let (_, service) = service();
    let spent = Deadline::at(Instant::now() - Duration::from_millis(1));
    let err = service
        .schedule_occurrence(occurrence(1, 3), spent)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Timeout { .. }));
}
