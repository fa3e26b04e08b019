use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::program::sponsors::domain::SponsorId;

/// Identifier wrapper for scholarship candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Application states a candidate moves through. New intakes start `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Pending,
    Active,
    Rejected,
    Archived,
}

impl CandidateStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Active => "active",
            CandidateStatus::Rejected => "rejected",
            CandidateStatus::Archived => "archived",
        }
    }
}

/// Intake priority as recorded by the admissions team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SponsorshipPriority {
    Alta,
    Media,
    Baja,
}

impl SponsorshipPriority {
    pub const fn label(self) -> &'static str {
        match self {
            SponsorshipPriority::Alta => "alta",
            SponsorshipPriority::Media => "media",
            SponsorshipPriority::Baja => "baja",
        }
    }
}

impl Default for SponsorshipPriority {
    fn default() -> Self {
        SponsorshipPriority::Media
    }
}

/// Guardian contact captured during intake. Only the relationship is ever
/// exposed on the public listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guardian {
    pub full_name: String,
    pub relationship: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Household composition recorded for means assessment. Never exposed publicly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub adults: u8,
    pub children: u8,
    pub monthly_income: Option<f64>,
}

/// A scholarship application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    /// External identity-document number. Required on intake; uniqueness is a
    /// convention, not a store constraint.
    pub document_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Derived from first and last name; legacy documents may carry only this.
    pub full_name: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub status: CandidateStatus,
    pub level: Option<String>,
    pub period: Option<String>,
    pub priority: SponsorshipPriority,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub guardian: Option<Guardian>,
    pub household: Option<Household>,
    /// Non-null only while `status == active`; written exclusively by the
    /// lifecycle module.
    pub sponsor_id: Option<SponsorId>,
    pub sponsor_assigned_date: Option<DateTime<Utc>>,
    pub photo_url: Option<String>,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted by candidate intake (public admissions form or admin add).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCandidate {
    pub document_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub level: Option<String>,
    pub period: Option<String>,
    #[serde(default)]
    pub priority: SponsorshipPriority,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub guardian: Option<Guardian>,
    pub household: Option<Household>,
    pub photo_url: Option<String>,
    pub photo_path: Option<String>,
}

/// Partial update applied verbatim by the registry. Sponsor linkage is absent
/// on purpose: those fields belong to the lifecycle module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidatePatch {
    pub document_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Ignored whenever first/last name are present on the merged record; the
    /// derived value always wins over a client-sent one.
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub status: Option<CandidateStatus>,
    pub level: Option<String>,
    pub period: Option<String>,
    pub priority: Option<SponsorshipPriority>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub guardian: Option<Guardian>,
    pub household: Option<Household>,
    pub photo_url: Option<String>,
    pub photo_path: Option<String>,
}

/// Candidate projection safe for the unauthenticated admissions listing:
/// pending applications only, guardian reduced to the relationship, no
/// household or audit data.
#[derive(Debug, Clone, Serialize)]
pub struct PublicCandidateView {
    pub id: CandidateId,
    pub full_name: String,
    pub level: Option<String>,
    pub period: Option<String>,
    pub priority: &'static str,
    pub photo_url: Option<String>,
    pub guardian_relationship: Option<String>,
}

/// Trimmed, single-spaced concatenation of first and last name.
pub fn derive_full_name(first_name: &str, last_name: &str) -> String {
    first_name
        .split_whitespace()
        .chain(last_name.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Candidate {
    pub fn public_view(&self) -> PublicCandidateView {
        PublicCandidateView {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            level: self.level.clone(),
            period: self.period.clone(),
            priority: self.priority.label(),
            photo_url: self.photo_url.clone(),
            guardian_relationship: self
                .guardian
                .as_ref()
                .map(|guardian| guardian.relationship.clone()),
        }
    }

    /// Drop the sponsor linkage; called whenever the candidate leaves `active`.
    pub fn clear_sponsor(&mut self) {
        self.sponsor_id = None;
        self.sponsor_assigned_date = None;
    }
}
