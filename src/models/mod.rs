//! Value model for the scheduling core.

pub mod enrollment;
pub mod occurrence;
pub mod offering;
pub mod slot;

pub use enrollment::{EnrollmentRecord, EnrollmentStatus};
pub use occurrence::{OccurrenceKind, OccurrenceStatus, ScheduledOccurrence};
pub use offering::{CourseOffering, EnrollmentWindow, OfferingStatus};
pub use slot::{ClockWindow, PeriodNumber, SlotTime, WeekParity, WeekRange, Weekday};
