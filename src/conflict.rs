//! Pure conflict detection between scheduled occurrences.
//!
//! Two occurrences collide when they genuinely share calendar time (same
//! term, same weekday, overlapping clock windows, overlapping week ranges
//! with compatible parity) and contend on at least one resource axis:
//! room, instructor, or roster cohort.
//!
//! The functions here are pure and side-effect free; the period table that
//! resolves numbered periods to clock times is passed in as read-only
//! configuration.

use serde::{Deserialize, Serialize};

use crate::config::PeriodTable;
use crate::models::occurrence::ScheduledOccurrence;

/// Resource axis on which two occurrences collide.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAxis {
    Room,
    Instructor,
    Roster,
}

impl std::fmt::Display for ConflictAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictAxis::Room => write!(f, "room"),
            ConflictAxis::Instructor => write!(f, "instructor"),
            ConflictAxis::Roster => write!(f, "roster"),
        }
    }
}

/// Whether two occurrences collide on any axis.
pub fn conflicts(a: &ScheduledOccurrence, b: &ScheduledOccurrence, periods: &PeriodTable) -> bool {
    !conflict_axes(a, b, periods).is_empty()
}

/// Whether two occurrences genuinely share calendar time: same term, same
/// weekday, overlapping clock windows, overlapping week ranges with
/// compatible parity. Identity and explicit joint-teaching pairs are
/// excluded.
///
/// This is the student-side clash test: a student cannot attend two
/// occurrences that overlap in time, whatever rooms or instructors they
/// use.
pub fn overlaps_in_time(
    a: &ScheduledOccurrence,
    b: &ScheduledOccurrence,
    periods: &PeriodTable,
) -> bool {
    // Identity exclusion: an occurrence never conflicts with itself.
    if let (Some(id_a), Some(id_b)) = (a.id, b.id) {
        if id_a == id_b {
            return false;
        }
    }

    if a.term != b.term || a.weekday != b.weekday {
        return false;
    }

    // A period the table does not define cannot be placed on the clock;
    // validation upstream rejects it before it gets this far.
    let (Some(window_a), Some(window_b)) = (a.time.resolve(periods), b.time.resolve(periods))
    else {
        return false;
    };
    if !window_a.overlaps(&window_b) {
        return false;
    }

    if !weeks_overlap(a, b) {
        return false;
    }

    // Joint-teaching exception: explicitly combined occurrences share the
    // slot on purpose.
    !a.is_combined_with(b)
}

/// All axes on which two occurrences collide. Empty when there is no
/// temporal overlap or no contended resource.
pub fn conflict_axes(
    a: &ScheduledOccurrence,
    b: &ScheduledOccurrence,
    periods: &PeriodTable,
) -> Vec<ConflictAxis> {
    if !overlaps_in_time(a, b, periods) {
        return Vec::new();
    }

    let mut axes = Vec::new();
    if let (Some(room_a), Some(room_b)) = (a.room_id, b.room_id) {
        if room_a == room_b {
            axes.push(ConflictAxis::Room);
        }
    }
    if let (Some(instr_a), Some(instr_b)) = (a.instructor_id, b.instructor_id) {
        if instr_a == instr_b {
            axes.push(ConflictAxis::Instructor);
        }
    }
    if !a.roster.is_empty()
        && !b.roster.is_empty()
        && a.roster.iter().any(|tag| b.roster.contains(tag))
    {
        axes.push(ConflictAxis::Roster);
    }
    axes
}

/// Week-range and parity overlap.
///
/// A missing week range is treated as unbounded: it overlaps every range.
/// This is the conservative admission policy inherited from the system of
/// record.
fn weeks_overlap(a: &ScheduledOccurrence, b: &ScheduledOccurrence) -> bool {
    if let (Some(weeks_a), Some(weeks_b)) = (&a.weeks, &b.weeks) {
        if !weeks_a.overlaps(weeks_b) {
            return false;
        }
    }
    // Odd-only and even-only occurrences occupy disjoint calendar weeks.
    !a.parity.disjoint_from(&b.parity)
}
