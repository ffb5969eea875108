//! Course-scheduling core for an institutional administration system.
//!
//! The crate owns the timetable and enrollment invariants:
//!
//! - value types for slots, occurrences, offerings and enrollment records
//!   ([`models`], [`api`]);
//! - pure conflict detection over rooms, instructors and cohort rosters
//!   ([`conflict`]);
//! - admission, modification and retirement of scheduled occurrences
//!   ([`services::SchedulerService`]);
//! - atomic seat accounting ([`services::CapacityLedger`]) and enrollment
//!   orchestration with compensating release
//!   ([`services::EnrollmentService`]);
//! - repository ports and an in-memory implementation ([`db`]).
//!
//! The surrounding system supplies transport, identity and the production
//! store; this crate supplies the rules.

pub mod api;
pub mod config;
pub mod conflict;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::PeriodTable;
pub use error::{Collision, SchedulingError, SchedulingResult};
pub use services::{
    CapacityLedger, Deadline, EnrollRequest, EnrollmentService, OccurrenceChanges,
    SchedulerService,
};
