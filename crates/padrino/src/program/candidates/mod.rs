//! Candidate intake and administration.

pub mod domain;
pub mod registry;
pub mod repository;

pub use domain::{
    derive_full_name, Candidate, CandidateId, CandidatePatch, CandidateStatus, Guardian, Household,
    NewCandidate, PublicCandidateView, SponsorshipPriority,
};
pub use registry::{CandidateError, CandidateRegistry};
pub use repository::CandidateStore;
