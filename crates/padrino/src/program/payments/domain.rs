use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::program::students::domain::Student;

/// Identifier wrapper for payment records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

/// What a disbursement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Enrollment,
    Monthly,
    Full,
    Balance,
    Other,
}

impl PaymentKind {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentKind::Enrollment => "enrollment",
            PaymentKind::Monthly => "monthly",
            PaymentKind::Full => "full",
            PaymentKind::Balance => "balance",
            PaymentKind::Other => "other",
        }
    }
}

/// Settlement state of a single payment record. Only `paid` records count
/// toward the student's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Paid,
    Pending,
    Cancelled,
}

impl PaymentState {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentState::Paid => "paid",
            PaymentState::Pending => "pending",
            PaymentState::Cancelled => "cancelled",
        }
    }
}

/// One disbursement against a student's tuition balance, stored in the
/// per-student `payments` subcollection. Amounts are plain USD decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub kind: PaymentKind,
    pub amount: f64,
    pub date: DateTime<Utc>,
    /// Calendar month covered, 1-12. Required exactly when `kind == monthly`.
    pub month: Option<u8>,
    pub receipt_number: Option<String>,
    pub receipt_url: Option<String>,
    pub receipt_path: Option<String>,
    pub notes: Option<String>,
    pub status: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_state() -> PaymentState {
    PaymentState::Paid
}

/// Fields accepted when recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub kind: PaymentKind,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub month: Option<u8>,
    pub receipt_number: Option<String>,
    pub receipt_url: Option<String>,
    pub receipt_path: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_state")]
    pub status: PaymentState,
}

/// Partial update to a payment record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentPatch {
    pub kind: Option<PaymentKind>,
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub month: Option<u8>,
    pub receipt_number: Option<String>,
    pub receipt_url: Option<String>,
    pub receipt_path: Option<String>,
    pub notes: Option<String>,
    pub status: Option<PaymentState>,
}

/// Program-wide tuition fee schedule. Per-student overrides on the record win
/// over these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuitionSchedule {
    pub enrollment_fee: f64,
    pub monthly_fee: f64,
    pub months_in_year: u32,
}

impl Default for TuitionSchedule {
    fn default() -> Self {
        Self {
            enrollment_fee: 20.0,
            monthly_fee: 40.0,
            months_in_year: 10,
        }
    }
}

impl TuitionSchedule {
    /// Total a student owes for the year. A `full_payment_amount` on the
    /// record short-circuits the fee arithmetic entirely; otherwise the
    /// enrollment fee plus the monthly fee over the billed months, with the
    /// student's own overrides winning over the schedule.
    pub fn total_due_for(&self, student: &Student) -> f64 {
        if let Some(amount) = student.full_payment_amount {
            return amount;
        }

        let enrollment = student.enrollment_fee.unwrap_or(self.enrollment_fee);
        let monthly = student.monthly_fee.unwrap_or(self.monthly_fee);
        let months = student.months_in_year.unwrap_or(self.months_in_year);
        enrollment + monthly * f64::from(months)
    }
}
