//! Scheduled occurrence: one placement of a course offering into a
//! recurring weekly slot.

use serde::{Deserialize, Serialize};

use crate::api::{InstructorId, OccurrenceId, OfferingId, RoomId, RosterTag, TermId};
use crate::models::slot::{SlotTime, WeekParity, WeekRange, Weekday};

/// Kind of placement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceKind {
    #[default]
    Normal,
    Makeup,
    Exam,
    Activity,
}

/// Lifecycle status. Retired occurrences are kept for history and never
/// considered in conflict scans.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    #[default]
    Active,
    Retired,
}

/// One placement of a course offering into a (weekday, slot, week-range,
/// parity) position, optionally bound to a room, an instructor, and a set
/// of cohort roster tags.
///
/// Owned by the Scheduler Service; the Enrollment Service only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledOccurrence {
    /// Repository-assigned id; `None` until first persisted.
    #[serde(default)]
    pub id: Option<OccurrenceId>,
    pub offering_id: OfferingId,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub instructor_id: Option<InstructorId>,
    pub term: TermId,
    pub weekday: Weekday,
    pub time: SlotTime,
    /// `None` means unbounded: treated as overlapping every week range.
    #[serde(default)]
    pub weeks: Option<WeekRange>,
    #[serde(default)]
    pub parity: WeekParity,
    #[serde(default)]
    pub roster: Vec<RosterTag>,
    #[serde(default)]
    pub kind: OccurrenceKind,
    #[serde(default)]
    pub status: OccurrenceStatus,
    /// Occurrences this one is explicitly combined with (joint teaching).
    /// Pairs listed here are exempt from conflict detection.
    #[serde(default)]
    pub combined_with: Vec<OccurrenceId>,
}

impl ScheduledOccurrence {
    /// Check field invariants. Called by the Scheduler Service before any
    /// repository round trip.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(weeks) = &self.weeks {
            weeks.validate()?;
        }
        if let SlotTime::Clock(window) = &self.time {
            if window.start >= window.end {
                return Err(format!(
                    "clock window start {} must be before end {}",
                    window.start, window.end
                ));
            }
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == OccurrenceStatus::Active
    }

    /// Whether `other` is an explicitly allowed combined-class partner.
    pub fn is_combined_with(&self, other: &ScheduledOccurrence) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => {
                self.combined_with.contains(&b) || other.combined_with.contains(&a)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slot::PeriodNumber;
    use chrono::NaiveTime;

    fn occurrence() -> ScheduledOccurrence {
        ScheduledOccurrence {
            id: None,
            offering_id: OfferingId::new(1),
            room_id: Some(RoomId::new(10)),
            instructor_id: Some(InstructorId::new(20)),
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

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(occurrence().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_clock_window() {
        let mut occ = occurrence();
        occ.time = SlotTime::Clock(crate::models::slot::ClockWindow {
            start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        });
        assert!(occ.validate().is_err());
    }

    #[test]
    fn test_combined_with_is_symmetric() {
        let mut a = occurrence();
        a.id = Some(OccurrenceId::new(1));
        let mut b = occurrence();
        b.id = Some(OccurrenceId::new(2));

        assert!(!a.is_combined_with(&b));
        a.combined_with.push(OccurrenceId::new(2));
        assert!(a.is_combined_with(&b));
        assert!(b.is_combined_with(&a));
    }

    #[test]
    fn test_unsaved_occurrence_never_combined() {
        let a = occurrence();
        let mut b = occurrence();
        b.id = Some(OccurrenceId::new(2));
        assert!(!a.is_combined_with(&b));
    }
}
