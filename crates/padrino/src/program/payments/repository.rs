use super::domain::{Payment, PaymentId};
use crate::program::students::domain::StudentId;
use crate::store::StoreError;

/// Storage abstraction over the per-student `payments` subcollection.
pub trait PaymentStore: Send + Sync {
    fn insert(&self, student_id: &StudentId, record: Payment) -> Result<Payment, StoreError>;
    fn update(&self, student_id: &StudentId, record: Payment) -> Result<(), StoreError>;
    fn fetch(
        &self,
        student_id: &StudentId,
        payment_id: &PaymentId,
    ) -> Result<Option<Payment>, StoreError>;
    fn list_for_student(&self, student_id: &StudentId) -> Result<Vec<Payment>, StoreError>;
    fn delete(&self, student_id: &StudentId, payment_id: &PaymentId) -> Result<(), StoreError>;
    /// Remove the whole subcollection; returns how many records went away.
    fn delete_all_for_student(&self, student_id: &StudentId) -> Result<usize, StoreError>;
}
