//! Financial reporting views over the read APIs. Aggregation only; nothing
//! here writes back to any collection.

use std::io;

use serde::Serialize;

use crate::program::payments::domain::Payment;
use crate::program::students::domain::{PaymentStanding, Student};

/// One student's tuition position, flattened for tables and CSV export.
#[derive(Debug, Clone, Serialize)]
pub struct StudentBalance {
    pub matriculation_number: String,
    pub full_name: String,
    pub academic_year: String,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub total_due: f64,
    pub total_paid: f64,
    pub balance: f64,
}

impl From<&Student> for StudentBalance {
    fn from(student: &Student) -> Self {
        Self {
            matriculation_number: student
                .matriculation_number
                .as_ref()
                .map(|number| number.to_string())
                .unwrap_or_default(),
            full_name: student.full_name.clone(),
            academic_year: student.academic_year.clone(),
            status: student.status.label(),
            payment_status: student.payment_status.label(),
            total_due: student.total_due,
            total_paid: student.total_paid,
            balance: student.total_due - student.total_paid,
        }
    }
}

/// Program-wide totals for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub students: usize,
    pub paid: usize,
    pub current: usize,
    pub overdue: usize,
    pub pending: usize,
    pub total_due: f64,
    pub total_collected: f64,
    pub outstanding: f64,
}

impl FinancialSummary {
    /// Collected over billed, in [0, 1]. Zero when nothing is billed.
    pub fn collection_rate(&self) -> f64 {
        if self.total_due <= 0.0 {
            return 0.0;
        }
        self.total_collected / self.total_due
    }
}

pub fn financial_summary(students: &[Student]) -> FinancialSummary {
    let mut summary = FinancialSummary {
        students: students.len(),
        ..FinancialSummary::default()
    };

    for student in students {
        match student.payment_status {
            PaymentStanding::Paid => summary.paid += 1,
            PaymentStanding::Current => summary.current += 1,
            PaymentStanding::Overdue => summary.overdue += 1,
            PaymentStanding::Pending => summary.pending += 1,
        }
        summary.total_due += student.total_due;
        summary.total_collected += student.total_paid;
    }

    summary.outstanding = summary.total_due - summary.total_collected;
    summary
}

/// Balances ordered by matriculation number for stable exports.
pub fn balances(students: &[Student]) -> Vec<StudentBalance> {
    let mut rows: Vec<StudentBalance> = students.iter().map(StudentBalance::from).collect();
    rows.sort_by(|a, b| a.matriculation_number.cmp(&b.matriculation_number));
    rows
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub fn write_balances_csv<W: io::Write>(
    writer: W,
    students: &[Student],
) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in balances(students) {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// One student's payment history, newest first as the ledger returns it.
#[derive(Debug, Clone, Serialize)]
struct PaymentRow<'a> {
    matriculation_number: &'a str,
    date: String,
    kind: &'static str,
    amount: f64,
    month: Option<u8>,
    status: &'static str,
    receipt_number: Option<&'a str>,
}

pub fn write_payment_history_csv<W: io::Write>(
    writer: W,
    student: &Student,
    payments: &[Payment],
) -> Result<(), ReportError> {
    let matriculation = student
        .matriculation_number
        .as_ref()
        .map(|number| number.as_str())
        .unwrap_or_default();

    let mut csv_writer = csv::Writer::from_writer(writer);
    for payment in payments {
        csv_writer.serialize(PaymentRow {
            matriculation_number: matriculation,
            date: payment.date.to_rfc3339(),
            kind: payment.kind.label(),
            amount: payment.amount,
            month: payment.month,
            status: payment.status.label(),
            receipt_number: payment.receipt_number.as_deref(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
