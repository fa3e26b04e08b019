use super::domain::{Sponsor, SponsorId};
use crate::program::candidates::domain::CandidateId;
use crate::store::StoreError;

/// Storage abstraction over the `sponsors` collection.
pub trait SponsorStore: Send + Sync {
    fn insert(&self, record: Sponsor) -> Result<Sponsor, StoreError>;
    fn update(&self, record: Sponsor) -> Result<(), StoreError>;
    fn fetch(&self, id: &SponsorId) -> Result<Option<Sponsor>, StoreError>;
    fn list(&self) -> Result<Vec<Sponsor>, StoreError>;
    fn delete(&self, id: &SponsorId) -> Result<(), StoreError>;
    /// Array-contains query against the legacy `candidate_ids` field.
    fn list_by_candidate_id(&self, candidate_id: &CandidateId)
        -> Result<Vec<Sponsor>, StoreError>;
}
