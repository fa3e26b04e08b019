//! Outbound transactional mail, consumed through a third-party relay.
//!
//! The relay is an external HTTP endpoint; this module owns the wire payload
//! (camelCase, matching the relay's contract), the validation that runs
//! before anything leaves the process, and the trait the service wires a
//! transport into. Only the payment reminder is composed here; the
//! contact-form path belongs to the marketing site, not the back office.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::program::sponsors::domain::valid_email;
use crate::program::students::domain::{PaymentStanding, Student, StudentId};
use crate::program::students::repository::StudentStore;
use crate::store::StoreError;

/// Payment reminder payload in the relay's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReminder {
    pub sponsor_email: String,
    pub sponsor_first_name: String,
    pub sponsor_last_name: String,
    pub student_name: String,
    pub student_matriculation_number: String,
    pub total_due: f64,
    pub total_paid: f64,
    pub payment_status: PaymentStanding,
    pub academic_year: String,
}

/// What the relay reports back: `{success, message?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("sponsor email '{found}' is not a valid address")]
    InvalidEmail { found: String },
    #[error("student has no sponsor contact on file")]
    MissingSponsor,
    #[error("relay transport unavailable: {0}")]
    Transport(String),
    #[error("relay rejected the message: {0}")]
    Rejected(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Transport boundary to the relay endpoint.
pub trait EmailRelay: Send + Sync {
    fn send_payment_reminder(&self, reminder: &PaymentReminder) -> Result<RelayResponse, RelayError>;
}

/// Build a reminder from a student record and its cached ledger fields.
/// Requires a sponsor snapshot with a well-formed email.
pub fn compose_payment_reminder(student: &Student) -> Result<PaymentReminder, RelayError> {
    let sponsor = student.sponsor.as_ref().ok_or(RelayError::MissingSponsor)?;
    if !valid_email(&sponsor.email) {
        return Err(RelayError::InvalidEmail {
            found: sponsor.email.clone(),
        });
    }

    Ok(PaymentReminder {
        sponsor_email: sponsor.email.clone(),
        sponsor_first_name: sponsor.first_name.clone(),
        sponsor_last_name: sponsor.last_name.clone(),
        student_name: student.full_name.clone(),
        student_matriculation_number: student
            .matriculation_number
            .as_ref()
            .map(|number| number.to_string())
            .unwrap_or_default(),
        total_due: student.total_due,
        total_paid: student.total_paid,
        payment_status: student.payment_status,
        academic_year: student.academic_year.clone(),
    })
}

/// Loads the student, composes the reminder, and hands it to the transport.
pub struct ReminderDispatcher<S, R> {
    students: Arc<S>,
    relay: Arc<R>,
}

impl<S, R> ReminderDispatcher<S, R>
where
    S: StudentStore,
    R: EmailRelay,
{
    pub fn new(students: Arc<S>, relay: Arc<R>) -> Self {
        Self { students, relay }
    }

    pub fn send_for_student(&self, id: &StudentId) -> Result<RelayResponse, RelayError> {
        let student = self.students.fetch(id)?.ok_or(StoreError::NotFound)?;
        let reminder = compose_payment_reminder(&student)?;
        let response = self.relay.send_payment_reminder(&reminder)?;
        if !response.success {
            return Err(RelayError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "relay reported failure".to_string()),
            ));
        }
        Ok(response)
    }
}
