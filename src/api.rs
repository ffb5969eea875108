//! Public identifier types for the scheduling core.
//!
//! All entity identifiers are opaque `i64` newtypes assigned by the backing
//! repository. `TermId` is the composite value that scopes every conflict and
//! capacity check.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type!(
    /// Scheduled occurrence identifier (repository primary key).
    OccurrenceId
);
id_type!(
    /// Course offering identifier.
    OfferingId
);
id_type!(
    /// Student identifier, supplied by the identity collaborator.
    StudentId
);
id_type!(
    /// Room identifier.
    RoomId
);
id_type!(
    /// Instructor identifier.
    InstructorId
);
id_type!(
    /// Enrollment record identifier.
    EnrollmentId
);

/// Cohort identifier (e.g. a class section) used for roster conflict checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterTag(pub String);

impl RosterTag {
    pub fn new(value: impl Into<String>) -> Self {
        RosterTag(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RosterTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Term identifier: semester name plus academic year.
///
/// Occurrences in different terms never conflict, and enrollment uniqueness
/// is scoped per term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermId {
    pub semester: String,
    pub academic_year: i32,
}

impl TermId {
    pub fn new(semester: impl Into<String>, academic_year: i32) -> Self {
        Self {
            semester: semester.into(),
            academic_year,
        }
    }
}

impl std::fmt::Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.academic_year, self.semester)
    }
}
