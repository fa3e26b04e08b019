use super::domain::{Candidate, CandidateId};
use crate::store::StoreError;

/// Storage abstraction over the `candidates` collection.
///
/// `insert` receives a record with a caller-side placeholder id and returns it
/// with the store-assigned one, mirroring a server-generated document id.
/// `update` is a whole-record, last-write-wins overwrite; read-modify-write is
/// the caller's job and nothing checks for concurrent edits in between.
pub trait CandidateStore: Send + Sync {
    fn insert(&self, record: Candidate) -> Result<Candidate, StoreError>;
    fn update(&self, record: Candidate) -> Result<(), StoreError>;
    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, StoreError>;
    fn list(&self) -> Result<Vec<Candidate>, StoreError>;
    fn delete(&self, id: &CandidateId) -> Result<(), StoreError>;
}
