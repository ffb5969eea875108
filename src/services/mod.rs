//! Service layer: scheduling, capacity, and enrollment orchestration over
//! the repository ports.

pub mod capacity;
pub mod deadline;
pub mod enrollment;
pub mod scheduler;

pub use capacity::CapacityLedger;
pub use deadline::Deadline;
pub use enrollment::{EnrollRequest, EnrollmentService};
pub use scheduler::{OccurrenceChanges, SchedulerService};

#[cfg(test)]
mod scheduler_tests;
