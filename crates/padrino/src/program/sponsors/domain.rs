use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::program::candidates::domain::CandidateId;

/// Identifier wrapper for sponsors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SponsorId(pub String);

/// A recurring donor funding one student's tuition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: SponsorId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    /// Legacy back-link field. Nothing in the lifecycle maintains it; it only
    /// feeds the array-contains query the store still supports.
    #[serde(default)]
    pub candidate_ids: Vec<CandidateId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when registering a sponsor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSponsor {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

/// Partial update to a sponsor record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SponsorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Minimal shape check shared by sponsor records and outbound reminder mail.
pub fn valid_email(value: &str) -> bool {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
        .is_match(value)
}
