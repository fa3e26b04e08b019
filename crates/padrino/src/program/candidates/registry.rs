use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{
    derive_full_name, Candidate, CandidateId, CandidatePatch, CandidateStatus, NewCandidate,
    PublicCandidateView,
};
use super::repository::CandidateStore;
use crate::store::StoreError;

/// Validation errors raised before any candidate write.
#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    #[error("document id is required")]
    MissingDocumentId,
    #[error("first and last name are required")]
    MissingName,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD surface over the candidates collection.
///
/// This registry is a pure field-setter: `update` applies whatever the patch
/// carries, including a status, without enforcing transition rules. It will
/// happily persist `active` with no sponsor. The cross-entity rules live in
/// `program::lifecycle`, which callers must go through for status changes.
pub struct CandidateRegistry<C> {
    store: Arc<C>,
}

impl<C> Clone for CandidateRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<C> CandidateRegistry<C>
where
    C: CandidateStore,
{
    pub fn new(store: Arc<C>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        intake: NewCandidate,
        now: DateTime<Utc>,
    ) -> Result<Candidate, CandidateError> {
        if intake.document_id.trim().is_empty() {
            return Err(CandidateError::MissingDocumentId);
        }
        let full_name = derive_full_name(&intake.first_name, &intake.last_name);
        if full_name.is_empty() {
            return Err(CandidateError::MissingName);
        }

        let record = Candidate {
            id: CandidateId(String::new()),
            document_id: intake.document_id,
            first_name: intake.first_name,
            last_name: intake.last_name,
            full_name,
            gender: intake.gender,
            birth_date: intake.birth_date,
            status: CandidateStatus::Pending,
            level: intake.level,
            period: intake.period,
            priority: intake.priority,
            reason: intake.reason,
            notes: intake.notes,
            city: intake.city,
            province: intake.province,
            country: intake.country,
            guardian: intake.guardian,
            household: intake.household,
            sponsor_id: None,
            sponsor_assigned_date: None,
            photo_url: intake.photo_url,
            photo_path: intake.photo_path,
            created_at: now,
            updated_at: now,
        };

        Ok(self.store.insert(record)?)
    }

    /// Apply the patch verbatim and rewrite the document. The stored full name
    /// is recomputed from first/last whenever those are present, so a stale
    /// client-sent `full_name` never survives.
    pub fn update(
        &self,
        id: &CandidateId,
        patch: CandidatePatch,
        now: DateTime<Utc>,
    ) -> Result<Candidate, CandidateError> {
        let mut record = self.get(id)?;

        if let Some(document_id) = patch.document_id {
            record.document_id = document_id;
        }
        if let Some(first_name) = patch.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            record.last_name = last_name;
        }
        if let Some(full_name) = patch.full_name {
            record.full_name = full_name;
        }
        if let Some(gender) = patch.gender {
            record.gender = Some(gender);
        }
        if let Some(birth_date) = patch.birth_date {
            record.birth_date = Some(birth_date);
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(level) = patch.level {
            record.level = Some(level);
        }
        if let Some(period) = patch.period {
            record.period = Some(period);
        }
        if let Some(priority) = patch.priority {
            record.priority = priority;
        }
        if let Some(reason) = patch.reason {
            record.reason = Some(reason);
        }
        if let Some(notes) = patch.notes {
            record.notes = Some(notes);
        }
        if let Some(city) = patch.city {
            record.city = Some(city);
        }
        if let Some(province) = patch.province {
            record.province = Some(province);
        }
        if let Some(country) = patch.country {
            record.country = Some(country);
        }
        if let Some(guardian) = patch.guardian {
            record.guardian = Some(guardian);
        }
        if let Some(household) = patch.household {
            record.household = Some(household);
        }
        if let Some(photo_url) = patch.photo_url {
            record.photo_url = Some(photo_url);
        }
        if let Some(photo_path) = patch.photo_path {
            record.photo_path = Some(photo_path);
        }

        let derived = derive_full_name(&record.first_name, &record.last_name);
        if !derived.is_empty() {
            record.full_name = derived;
        }

        self.persist(record, now).map_err(CandidateError::from)
    }

    /// Rewrite a record the caller already mutated, stamping `updated_at`.
    /// Used by the lifecycle module, which owns the sponsor linkage fields.
    pub(crate) fn persist(
        &self,
        mut record: Candidate,
        now: DateTime<Utc>,
    ) -> Result<Candidate, StoreError> {
        record.updated_at = now;
        self.store.update(record.clone())?;
        Ok(record)
    }

    pub fn get(&self, id: &CandidateId) -> Result<Candidate, CandidateError> {
        Ok(self.store.fetch(id)?.ok_or(StoreError::NotFound)?)
    }

    pub fn list(&self) -> Result<Vec<Candidate>, StoreError> {
        self.store.list()
    }

    pub fn list_by_status(&self, status: CandidateStatus) -> Result<Vec<Candidate>, StoreError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|candidate| candidate.status == status)
            .collect())
    }

    pub fn list_by_period(&self, period: &str) -> Result<Vec<Candidate>, StoreError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|candidate| candidate.period.as_deref() == Some(period))
            .collect())
    }

    /// Pending applications reduced to the fields the marketing site may show.
    pub fn list_public(&self) -> Result<Vec<PublicCandidateView>, StoreError> {
        Ok(self
            .store
            .list()?
            .iter()
            .filter(|candidate| candidate.status == CandidateStatus::Pending)
            .map(Candidate::public_view)
            .collect())
    }

    pub fn delete(&self, id: &CandidateId) -> Result<(), StoreError> {
        self.store.delete(id)
    }
}
