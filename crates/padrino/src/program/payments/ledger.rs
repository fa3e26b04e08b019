use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::warn;

use super::domain::{NewPayment, Payment, PaymentId, PaymentKind, PaymentPatch, PaymentState};
use super::repository::PaymentStore;
use crate::program::students::domain::{PaymentStanding, Student, StudentId};
use crate::program::students::registry::{StudentError, StudentRegistry};
use crate::program::students::repository::StudentStore;
use crate::program::SyncStatus;
use crate::store::StoreError;

/// Validation errors raised before any payment write.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("monthly payments require a month")]
    MonthRequired,
    #[error("month {found} is outside 1-12")]
    MonthOutOfRange { found: u8 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A payment mutation plus the outcome of the derived-state refresh that
/// followed it. The refresh is best-effort: the payment write stands even
/// when the student document could not be updated.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentWrite {
    pub payment: Payment,
    pub refresh: SyncStatus,
}

/// Append-only tuition ledger per student, plus the derived payment standing
/// cached on the student document.
pub struct PaymentLedger<P, S> {
    payments: Arc<P>,
    students: StudentRegistry<S>,
}

impl<P, S> Clone for PaymentLedger<P, S> {
    fn clone(&self) -> Self {
        Self {
            payments: self.payments.clone(),
            students: self.students.clone(),
        }
    }
}

/// Classify a student's standing from the ledger state.
///
/// Never yields `pending`: that value exists only as the creation-time
/// default on students with no payment activity, because nothing invokes the
/// refresh until the first payment event. Preserved as observed behavior.
pub fn classify_standing(
    total_paid: f64,
    total_due: f64,
    payments: &[Payment],
    today: NaiveDate,
) -> PaymentStanding {
    if total_paid >= total_due {
        return PaymentStanding::Paid;
    }

    let paid_this_month = payments.iter().any(|payment| {
        payment.status == PaymentState::Paid && {
            let date = payment.date.date_naive();
            date.year() == today.year() && date.month() == today.month()
        }
    });

    if paid_this_month {
        PaymentStanding::Current
    } else {
        PaymentStanding::Overdue
    }
}

impl<P, S> PaymentLedger<P, S>
where
    P: PaymentStore,
    S: StudentStore,
{
    pub fn new(payments: Arc<P>, students: StudentRegistry<S>) -> Self {
        Self { payments, students }
    }

    /// Payments for one student, newest first.
    pub fn list_for_student(&self, student_id: &StudentId) -> Result<Vec<Payment>, StoreError> {
        let mut payments = self.payments.list_for_student(student_id)?;
        payments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(payments)
    }

    pub fn get(
        &self,
        student_id: &StudentId,
        payment_id: &PaymentId,
    ) -> Result<Payment, PaymentError> {
        Ok(self
            .payments
            .fetch(student_id, payment_id)?
            .ok_or(StoreError::NotFound)?)
    }

    pub fn add(
        &self,
        student_id: &StudentId,
        intake: NewPayment,
        now: DateTime<Utc>,
    ) -> Result<PaymentWrite, PaymentError> {
        validate_month(intake.kind, intake.month)?;

        let record = Payment {
            id: PaymentId(String::new()),
            kind: intake.kind,
            amount: intake.amount,
            date: intake.date,
            month: intake.month,
            receipt_number: intake.receipt_number,
            receipt_url: intake.receipt_url,
            receipt_path: intake.receipt_path,
            notes: intake.notes,
            status: intake.status,
            created_at: now,
            updated_at: now,
        };

        let payment = self.payments.insert(student_id, record)?;
        let refresh = self.best_effort_refresh(student_id, now);
        Ok(PaymentWrite { payment, refresh })
    }

    pub fn update(
        &self,
        student_id: &StudentId,
        payment_id: &PaymentId,
        patch: PaymentPatch,
        now: DateTime<Utc>,
    ) -> Result<PaymentWrite, PaymentError> {
        let mut record = self.get(student_id, payment_id)?;

        if let Some(kind) = patch.kind {
            record.kind = kind;
        }
        if let Some(amount) = patch.amount {
            record.amount = amount;
        }
        if let Some(date) = patch.date {
            record.date = date;
        }
        if let Some(month) = patch.month {
            record.month = Some(month);
        }
        if let Some(receipt_number) = patch.receipt_number {
            record.receipt_number = Some(receipt_number);
        }
        if let Some(receipt_url) = patch.receipt_url {
            record.receipt_url = Some(receipt_url);
        }
        if let Some(receipt_path) = patch.receipt_path {
            record.receipt_path = Some(receipt_path);
        }
        if let Some(notes) = patch.notes {
            record.notes = Some(notes);
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        record.updated_at = now;

        validate_month(record.kind, record.month)?;

        self.payments.update(student_id, record.clone())?;
        let refresh = self.best_effort_refresh(student_id, now);
        Ok(PaymentWrite {
            payment: record,
            refresh,
        })
    }

    pub fn remove(
        &self,
        student_id: &StudentId,
        payment_id: &PaymentId,
        now: DateTime<Utc>,
    ) -> Result<SyncStatus, PaymentError> {
        self.payments.delete(student_id, payment_id)?;
        Ok(self.best_effort_refresh(student_id, now))
    }

    /// Sum of `paid` payments only.
    pub fn total_paid(&self, student_id: &StudentId) -> Result<f64, StoreError> {
        Ok(self
            .payments
            .list_for_student(student_id)?
            .iter()
            .filter(|payment| payment.status == PaymentState::Paid)
            .map(|payment| payment.amount)
            .sum())
    }

    /// Total a student owes for the year. Pure; no I/O.
    pub fn total_due(&self, student: &Student) -> f64 {
        self.students.schedule().total_due_for(student)
    }

    /// Recompute and persist the student's cached `payment_status`,
    /// `total_paid`, and `total_due`. Must run after every payment mutation;
    /// the mutation paths call it through `best_effort_refresh`.
    pub fn refresh_standing(
        &self,
        student_id: &StudentId,
        now: DateTime<Utc>,
    ) -> Result<Student, PaymentError> {
        let mut student = match self.students.get(student_id) {
            Ok(student) => student,
            Err(StudentError::Store(err)) => return Err(PaymentError::Store(err)),
            Err(other) => {
                return Err(PaymentError::Store(StoreError::Unavailable(
                    other.to_string(),
                )))
            }
        };

        let payments = self.payments.list_for_student(student_id)?;
        let total_due = self.total_due(&student);
        let total_paid: f64 = payments
            .iter()
            .filter(|payment| payment.status == PaymentState::Paid)
            .map(|payment| payment.amount)
            .sum();

        student.payment_status =
            classify_standing(total_paid, total_due, &payments, now.date_naive());
        student.total_paid = total_paid;
        student.total_due = total_due;

        Ok(self.students.persist(student, now)?)
    }

    /// Drop every payment belonging to a student; the delete-cascade path.
    pub fn purge_student(&self, student_id: &StudentId) -> Result<usize, StoreError> {
        self.payments.delete_all_for_student(student_id)
    }

    /// The refresh must never block or roll back the payment write that
    /// triggered it; failures are logged and reported in the outcome only.
    fn best_effort_refresh(&self, student_id: &StudentId, now: DateTime<Utc>) -> SyncStatus {
        match self.refresh_standing(student_id, now) {
            Ok(_) => SyncStatus::Applied,
            Err(err) => {
                warn!(
                    student_id = %student_id.0,
                    error = %err,
                    "payment standing refresh failed after payment write"
                );
                SyncStatus::Failed {
                    detail: err.to_string(),
                }
            }
        }
    }
}

fn validate_month(kind: PaymentKind, month: Option<u8>) -> Result<(), PaymentError> {
    if let Some(found) = month {
        if !(1..=12).contains(&found) {
            return Err(PaymentError::MonthOutOfRange { found });
        }
    }
    if kind == PaymentKind::Monthly && month.is_none() {
        return Err(PaymentError::MonthRequired);
    }
    Ok(())
}
