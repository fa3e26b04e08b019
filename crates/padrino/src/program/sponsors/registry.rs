use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{valid_email, NewSponsor, Sponsor, SponsorId, SponsorPatch};
use super::repository::SponsorStore;
use crate::program::candidates::domain::CandidateId;
use crate::store::StoreError;

/// Validation errors raised before any sponsor write.
#[derive(Debug, thiserror::Error)]
pub enum SponsorError {
    #[error("sponsor email '{found}' is not a valid address")]
    InvalidEmail { found: String },
    #[error("first and last name are required")]
    MissingName,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD and search surface over the sponsors collection.
pub struct SponsorRegistry<Z> {
    store: Arc<Z>,
}

impl<Z> Clone for SponsorRegistry<Z> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<Z> SponsorRegistry<Z>
where
    Z: SponsorStore,
{
    pub fn new(store: Arc<Z>) -> Self {
        Self { store }
    }

    pub fn create(&self, intake: NewSponsor, now: DateTime<Utc>) -> Result<Sponsor, SponsorError> {
        if intake.first_name.trim().is_empty() || intake.last_name.trim().is_empty() {
            return Err(SponsorError::MissingName);
        }
        if !valid_email(&intake.email) {
            return Err(SponsorError::InvalidEmail {
                found: intake.email,
            });
        }

        let record = Sponsor {
            id: SponsorId(String::new()),
            first_name: intake.first_name,
            last_name: intake.last_name,
            email: intake.email,
            phone: intake.phone,
            address: intake.address,
            city: intake.city,
            country: intake.country,
            notes: intake.notes,
            candidate_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        Ok(self.store.insert(record)?)
    }

    pub fn update(
        &self,
        id: &SponsorId,
        patch: SponsorPatch,
        now: DateTime<Utc>,
    ) -> Result<Sponsor, SponsorError> {
        let mut record = self.get(id)?;

        if let Some(first_name) = patch.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            record.last_name = last_name;
        }
        if let Some(email) = patch.email {
            if !valid_email(&email) {
                return Err(SponsorError::InvalidEmail { found: email });
            }
            record.email = email;
        }
        if let Some(phone) = patch.phone {
            record.phone = Some(phone);
        }
        if let Some(address) = patch.address {
            record.address = Some(address);
        }
        if let Some(city) = patch.city {
            record.city = Some(city);
        }
        if let Some(country) = patch.country {
            record.country = Some(country);
        }
        if let Some(notes) = patch.notes {
            record.notes = Some(notes);
        }

        record.updated_at = now;
        self.store.update(record.clone())?;
        Ok(record)
    }

    pub fn get(&self, id: &SponsorId) -> Result<Sponsor, SponsorError> {
        Ok(self.store.fetch(id)?.ok_or(StoreError::NotFound)?)
    }

    /// All sponsors ordered by last name, then first name.
    pub fn list(&self) -> Result<Vec<Sponsor>, StoreError> {
        let mut sponsors = self.store.list()?;
        sponsors.sort_by(|a, b| {
            (a.last_name.to_lowercase(), a.first_name.to_lowercase())
                .cmp(&(b.last_name.to_lowercase(), b.first_name.to_lowercase()))
        });
        Ok(sponsors)
    }

    /// Case-insensitive substring match against first name, last name, or the
    /// two joined. The store has no case-insensitive query, so this loads the
    /// collection and filters in memory.
    pub fn search(&self, term: &str) -> Result<Vec<Sponsor>, StoreError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.list();
        }

        Ok(self
            .list()?
            .into_iter()
            .filter(|sponsor| {
                let first = sponsor.first_name.to_lowercase();
                let last = sponsor.last_name.to_lowercase();
                first.contains(&needle)
                    || last.contains(&needle)
                    || format!("{first} {last}").contains(&needle)
            })
            .collect())
    }

    pub fn list_by_candidate_id(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<Sponsor>, StoreError> {
        self.store.list_by_candidate_id(candidate_id)
    }

    pub fn delete(&self, id: &SponsorId) -> Result<(), StoreError> {
        self.store.delete(id)
    }
}
