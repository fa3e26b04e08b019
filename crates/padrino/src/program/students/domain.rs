use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::program::candidates::domain::CandidateId;
use crate::program::sponsors::domain::{Sponsor, SponsorId};

/// Identifier wrapper for enrolled students.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Durable enrollment identifier, `MAT-NNN`. Assigned monotonically and never
/// reused; the numeric suffix is zero-padded to three digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatriculationNumber(String);

impl MatriculationNumber {
    pub const PREFIX: &'static str = "MAT-";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_index(index: u32) -> Self {
        Self(format!("{}{index:03}", Self::PREFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric part of a well-formed number; `None` for free-form legacy data.
    pub fn numeric_suffix(&self) -> Option<u32> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }
}

impl fmt::Display for MatriculationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Enrollment states tracked per student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Inactive,
    Graduated,
    Suspended,
}

impl StudentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Graduated => "graduated",
            StudentStatus::Suspended => "suspended",
        }
    }
}

/// Derived tuition standing cached on the student document.
///
/// `Pending` is only ever written at creation time; the classification in the
/// payment ledger never produces it, so a student with no payment activity
/// keeps it until the first payment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStanding {
    Paid,
    Current,
    Overdue,
    Pending,
}

impl PaymentStanding {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStanding::Paid => "paid",
            PaymentStanding::Current => "current",
            PaymentStanding::Overdue => "overdue",
            PaymentStanding::Pending => "pending",
        }
    }
}

/// Denormalized sponsor contact data.
///
/// A point-in-time copy captured when the sponsor is assigned, kept so reads
/// never need a join. Editing the sponsor record later does NOT rewrite this
/// snapshot; it refreshes only on re-assignment or re-approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SponsorSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl From<&Sponsor> for SponsorSnapshot {
    fn from(sponsor: &Sponsor) -> Self {
        Self {
            first_name: sponsor.first_name.clone(),
            last_name: sponsor.last_name.clone(),
            email: sponsor.email.clone(),
            phone: sponsor.phone.clone(),
            address: sponsor.address.clone(),
            city: sponsor.city.clone(),
            country: sponsor.country.clone(),
        }
    }
}

/// An enrolled, billable pupil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    /// `None` only on legacy documents; every creation path assigns one.
    pub matriculation_number: Option<MatriculationNumber>,
    /// Back-reference to the candidate that produced this student. Set once at
    /// creation and never changed; `None` for direct admin adds.
    pub candidate_id: Option<CandidateId>,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub document_id: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub current_grade: String,
    pub academic_year: String,
    pub enrollment_date: DateTime<Utc>,
    pub city: String,
    pub province: String,
    pub country: String,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub photo_path: Option<String>,
    pub status: StudentStatus,
    /// Cached derived fields, rewritten by the payment ledger after every
    /// payment mutation.
    pub payment_status: PaymentStanding,
    pub total_paid: f64,
    pub total_due: f64,
    /// Per-student fee overrides; the tuition schedule defaults apply when
    /// unset.
    pub full_payment_amount: Option<f64>,
    pub enrollment_fee: Option<f64>,
    pub monthly_fee: Option<f64>,
    pub months_in_year: Option<u32>,
    pub sponsor_id: Option<SponsorId>,
    pub sponsor: Option<SponsorSnapshot>,
    pub sponsor_assigned_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Drop the sponsor linkage and snapshot; the inactive-transition rule.
    pub fn clear_sponsor(&mut self) {
        self.sponsor_id = None;
        self.sponsor = None;
        self.sponsor_assigned_date = None;
    }
}

/// Fallback values applied when enrollment data is missing from an intake or
/// an approved candidate. Built from configuration; nothing reads ambient
/// state to obtain these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentDefaults {
    pub grade: String,
    pub academic_year: String,
    pub city: String,
    pub province: String,
    pub country: String,
}

/// Fields accepted by the direct admin "add student" flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub document_id: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub current_grade: Option<String>,
    pub academic_year: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub photo_path: Option<String>,
    pub full_payment_amount: Option<f64>,
    pub enrollment_fee: Option<f64>,
    pub monthly_fee: Option<f64>,
    pub months_in_year: Option<u32>,
}

/// Partial update to a student's personal, academic, and fee fields. Payment
/// caches, matriculation, and sponsor linkage have their own owners and are
/// absent here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub document_id: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub current_grade: Option<String>,
    pub academic_year: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub photo_path: Option<String>,
    pub status: Option<StudentStatus>,
    pub full_payment_amount: Option<f64>,
    pub enrollment_fee: Option<f64>,
    pub monthly_fee: Option<f64>,
    pub months_in_year: Option<u32>,
}
