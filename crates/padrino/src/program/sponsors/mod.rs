//! Sponsor records and fuzzy name search.

pub mod domain;
pub mod registry;
pub mod repository;

pub use domain::{valid_email, NewSponsor, Sponsor, SponsorId, SponsorPatch};
pub use registry::{SponsorError, SponsorRegistry};
pub use repository::SponsorStore;
