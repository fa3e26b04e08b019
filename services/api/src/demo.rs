use crate::infra::{
    AppContext, InMemoryCandidateStore, InMemoryMediaStore, InMemoryPaymentStore,
    InMemorySponsorStore, InMemoryStudentStore,
};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use clap::Args;
use std::io;
use std::sync::Arc;

use padrino::config::ProgramConfig;
use padrino::error::AppError;
use padrino::media::{check_size, receipt_path, MediaKind, MediaStore};
use padrino::program::candidates::domain::{CandidateStatus, Guardian, NewCandidate};
use padrino::program::lifecycle::{LifecycleError, SponsorSelection};
use padrino::program::payments::domain::{NewPayment, PaymentKind, PaymentState};
use padrino::program::sponsors::domain::NewSponsor;
use padrino::program::students::domain::StudentId;
use padrino::relay::compose_payment_reminder;
use padrino::report::{balances, financial_summary, write_balances_csv};
use padrino::store::StoreError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Emit per-student balances as CSV instead of the summary
    #[arg(long)]
    pub(crate) csv: bool,
}

fn default_program_config() -> ProgramConfig {
    ProgramConfig {
        enrollment_fee: 20.0,
        monthly_fee: 40.0,
        months_in_year: 10,
        default_grade: "Jardín".to_string(),
        default_city: "Lichinga".to_string(),
        default_province: "Niassa".to_string(),
        default_country: "Mozambique".to_string(),
    }
}

fn at(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Walk the sample roster through intake, approval, and a couple of payment
/// events so the demo and the report commands have the same data to show.
fn seed_program(today: NaiveDate) -> Result<(AppContext, StudentId), AppError> {
    let config = default_program_config();
    let context = AppContext::new(
        Arc::new(InMemoryCandidateStore::default()),
        Arc::new(InMemoryStudentStore::default()),
        Arc::new(InMemorySponsorStore::default()),
        Arc::new(InMemoryPaymentStore::default()),
        config.tuition_schedule(),
        config.enrollment_defaults(today),
    );
    let now = at(today);

    let ana = context
        .candidates
        .create(
            NewCandidate {
                document_id: "MZ-1987-0042".to_string(),
                first_name: "Ana".to_string(),
                last_name: "Silva".to_string(),
                level: Some("3ª Clase".to_string()),
                period: Some(today.format("%Y").to_string()),
                reason: Some("Family cannot cover tuition".to_string()),
                guardian: Some(Guardian {
                    full_name: "Rosa Silva".to_string(),
                    relationship: "abuela".to_string(),
                    phone: Some("+258 84 000 0000".to_string()),
                    email: None,
                }),
                ..NewCandidate::default()
            },
            now,
        )
        .map_err(LifecycleError::from)?;

    context
        .candidates
        .create(
            NewCandidate {
                document_id: "MZ-1990-0107".to_string(),
                first_name: "Paulo".to_string(),
                last_name: "Macamo".to_string(),
                level: Some("1ª Clase".to_string()),
                ..NewCandidate::default()
            },
            now,
        )
        .map_err(LifecycleError::from)?;

    let outcome = context.lifecycle.approve_candidate(
        &ana.id,
        Some(SponsorSelection::New(NewSponsor {
            first_name: "Marta".to_string(),
            last_name: "Lopez".to_string(),
            email: "marta.lopez@example.org".to_string(),
            city: Some("Madrid".to_string()),
            country: Some("España".to_string()),
            ..NewSponsor::default()
        })),
        now,
    )?;
    let student_id = outcome.student_id.ok_or_else(|| {
        AppError::Lifecycle(LifecycleError::Store(StoreError::Unavailable(
            "demo enrollment did not complete".to_string(),
        )))
    })?;

    context.ledger.add(
        &student_id,
        NewPayment {
            kind: PaymentKind::Enrollment,
            amount: 20.0,
            date: now,
            month: None,
            receipt_number: Some("R-0001".to_string()),
            receipt_url: None,
            receipt_path: None,
            notes: None,
            status: PaymentState::Paid,
        },
        now,
    )?;
    context.ledger.add(
        &student_id,
        NewPayment {
            kind: PaymentKind::Monthly,
            amount: 40.0,
            date: now,
            month: Some(chrono::Datelike::month(&today) as u8),
            receipt_number: Some("R-0002".to_string()),
            receipt_url: None,
            receipt_path: None,
            notes: None,
            status: PaymentState::Paid,
        },
        now,
    )?;

    Ok((context, student_id))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (context, student_id) = seed_program(today)?;

    println!("Sponsorship program walkthrough ({today})");

    let pending = context
        .candidates
        .list_by_status(CandidateStatus::Pending)
        .map_err(LifecycleError::from)?;
    println!("\nPending applications: {}", pending.len());
    for candidate in &pending {
        println!(
            "  - {} ({}, priority {})",
            candidate.full_name,
            candidate.level.as_deref().unwrap_or("sin nivel"),
            candidate.priority.label()
        );
    }

    let student = context
        .students
        .get(&student_id)
        .map_err(LifecycleError::from)?;
    println!("\nEnrolled after approval:");
    println!(
        "  - {} | {} | grade {} | standing {}",
        student
            .matriculation_number
            .as_ref()
            .map(|number| number.to_string())
            .unwrap_or_default(),
        student.full_name,
        student.current_grade,
        student.payment_status.label()
    );
    println!(
        "  - paid {:.2} of {:.2} USD",
        student.total_paid, student.total_due
    );

    let payments = context
        .ledger
        .list_for_student(&student_id)
        .map_err(LifecycleError::from)?;
    println!("\nLedger ({} records, newest first):", payments.len());
    for payment in &payments {
        println!(
            "  - {} | {} | {:.2} USD | {}",
            payment.date.format("%Y-%m-%d"),
            payment.kind.label(),
            payment.amount,
            payment.status.label()
        );
    }

    // Receipt upload path, sized and typed the way the admin UI does it.
    let media = InMemoryMediaStore::default();
    let receipt = b"%PDF-1.4 demo receipt".to_vec();
    check_size(MediaKind::PaymentReceipt, receipt.len() as u64)?;
    let path = receipt_path(&student_id, at(today).timestamp_millis(), "pdf");
    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    let stored = media.upload(&path, receipt, &content_type)?;
    println!(
        "\nReceipt stored at {} ({} bytes, {})",
        stored.path, stored.size, stored.content_type
    );

    let reminder = compose_payment_reminder(&student)?;
    println!(
        "\nReminder for {} {} <{}>: {} owes {:.2} USD ({} standing)",
        reminder.sponsor_first_name,
        reminder.sponsor_last_name,
        reminder.sponsor_email,
        reminder.student_name,
        reminder.total_due - reminder.total_paid,
        reminder.payment_status.label()
    );

    print_summary(&context)?;
    Ok(())
}

pub(crate) fn run_financial_report(args: ReportArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (context, _) = seed_program(today)?;

    if args.csv {
        let students = context.students.list().map_err(LifecycleError::from)?;
        write_balances_csv(io::stdout(), &students)?;
        return Ok(());
    }

    print_summary(&context)?;
    Ok(())
}

fn print_summary(context: &AppContext) -> Result<(), AppError> {
    let students = context.students.list().map_err(LifecycleError::from)?;
    let summary = financial_summary(&students);

    println!("\nFinancial summary:");
    println!(
        "  - {} students | {} paid | {} current | {} overdue | {} pending",
        summary.students, summary.paid, summary.current, summary.overdue, summary.pending
    );
    println!(
        "  - billed {:.2} USD | collected {:.2} USD | outstanding {:.2} USD ({:.0}% collected)",
        summary.total_due,
        summary.total_collected,
        summary.outstanding,
        summary.collection_rate() * 100.0
    );

    for row in balances(&students) {
        println!(
            "  - {} {} | due {:.2} | paid {:.2} | balance {:.2}",
            row.matriculation_number, row.full_name, row.total_due, row.total_paid, row.balance
        );
    }
    Ok(())
}
