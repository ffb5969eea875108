//! Course offering: the enrollable unit for a term, with a seat capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{OfferingId, TermId};

/// Administrative status of an offering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OfferingStatus {
    #[default]
    Open,
    Closed,
    Cancelled,
}

/// Enrollment window, inclusive start, exclusive end.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EnrollmentWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// The enrollable instance of a course for a given term.
///
/// `committed_seats` is mutated only through the Capacity Ledger's atomic
/// compare-and-swap; no other component writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: OfferingId,
    pub term: TermId,
    pub capacity: u32,
    #[serde(default)]
    pub committed_seats: u32,
    #[serde(default)]
    pub enrollment_window: Option<EnrollmentWindow>,
    #[serde(default)]
    pub status: OfferingStatus,
}

impl CourseOffering {
    pub fn has_free_seat(&self) -> bool {
        self.committed_seats < self.capacity
    }

    /// Whether a new seat may be reserved at `at`.
    ///
    /// Closure-on-full and closure-on-window-end are derived here rather
    /// than written back as a status change, so closure can never race the
    /// seat counter. The stored status only changes administratively.
    pub fn is_enrollable_at(&self, at: DateTime<Utc>) -> bool {
        self.status == OfferingStatus::Open
            && self.enrollment_window.map_or(true, |w| w.contains(at))
            && self.has_free_seat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn offering() -> CourseOffering {
        CourseOffering {
            id: OfferingId::new(1),
            term: TermId::new("fall", 2025),
            capacity: 2,
            committed_seats: 0,
            enrollment_window: None,
            status: OfferingStatus::Open,
        }
    }

    #[test]
    fn test_enrollable_when_open_with_seats() {
        assert!(offering().is_enrollable_at(Utc::now()));
    }

    #[test]
    fn test_not_enrollable_when_full() {
        let mut off = offering();
        off.committed_seats = 2;
        assert!(!off.is_enrollable_at(Utc::now()));
    }

    #[test]
    fn test_not_enrollable_when_cancelled() {
        let mut off = offering();
        off.status = OfferingStatus::Cancelled;
        assert!(!off.is_enrollable_at(Utc::now()));
    }

    #[test]
    fn test_window_bounds() {
        let now = Utc::now();
        let mut off = offering();
        off.enrollment_window = Some(EnrollmentWindow {
            start: now - Duration::hours(1),
            end: now + Duration::hours(1),
        });
        assert!(off.is_enrollable_at(now));
        assert!(!off.is_enrollable_at(now + Duration::hours(2)));
        assert!(!off.is_enrollable_at(now - Duration::hours(2)));
    }
}
