//! Enrolled student records, matriculation numbering, and status rules.

pub mod domain;
pub mod registry;
pub mod repository;

pub use domain::{
    EnrollmentDefaults, MatriculationNumber, NewStudent, PaymentStanding, SponsorSnapshot, Student,
    StudentId, StudentPatch, StudentStatus,
};
pub use registry::{StudentError, StudentRegistry};
pub use repository::StudentStore;
