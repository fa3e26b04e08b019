use super::domain::{MatriculationNumber, Student, StudentId};
use crate::store::StoreError;

/// Storage abstraction over the `students` collection.
///
/// Same conventions as the other collections: `insert` assigns the id,
/// `update` overwrites the whole document last-write-wins. The one dedicated
/// query is `latest_matriculation`, backed by an order-by-descending,
/// limit-one read so matriculation numbering can distinguish "collection is
/// empty" from "the query failed".
pub trait StudentStore: Send + Sync {
    fn insert(&self, record: Student) -> Result<Student, StoreError>;
    fn update(&self, record: Student) -> Result<(), StoreError>;
    fn fetch(&self, id: &StudentId) -> Result<Option<Student>, StoreError>;
    fn list(&self) -> Result<Vec<Student>, StoreError>;
    fn delete(&self, id: &StudentId) -> Result<(), StoreError>;
    /// Lexicographically largest matriculation number on record, if any.
    fn latest_matriculation(&self) -> Result<Option<MatriculationNumber>, StoreError>;
}
