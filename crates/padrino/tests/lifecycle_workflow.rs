//! End-to-end scenarios through the public program facade: intake, approval,
//! tuition tracking, reminders, and the cross-entity rules in between.

mod common;

use std::sync::Arc;

use common::*;
use padrino::program::candidates::domain::CandidateStatus;
use padrino::program::lifecycle::SponsorSelection;
use padrino::program::payments::domain::{NewPayment, PaymentKind, PaymentPatch, PaymentState};
use padrino::program::sponsors::domain::SponsorPatch;
use padrino::program::students::domain::{
    MatriculationNumber, NewStudent, PaymentStanding, StudentStatus,
};
use padrino::program::students::registry::StudentRegistry;
use padrino::program::students::repository::StudentStore;
use padrino::program::payments::domain::TuitionSchedule;
use padrino::relay::{RelayError, ReminderDispatcher};
use padrino::store::StoreError;

fn new_student(first: &str, last: &str, document_id: &str) -> NewStudent {
    NewStudent {
        first_name: first.to_string(),
        last_name: last.to_string(),
        document_id: document_id.to_string(),
        ..NewStudent::default()
    }
}

fn monthly(amount: f64, when: chrono::DateTime<chrono::Utc>) -> NewPayment {
    NewPayment {
        kind: PaymentKind::Monthly,
        amount,
        date: when,
        month: Some(chrono::Datelike::month(&when) as u8),
        receipt_number: None,
        receipt_url: None,
        receipt_path: None,
        notes: None,
        status: PaymentState::Paid,
    }
}

#[test]
fn matriculation_numbers_grow_monotonically() {
    let ctx = context();
    let now = ts(2026, 2, 1);

    let mut numbers = Vec::new();
    for (first, document) in [("Ana", "MZ-01"), ("Berta", "MZ-02"), ("Carlos", "MZ-03")] {
        let student = ctx
            .students
            .create(new_student(first, "Silva", document), now)
            .expect("direct add succeeds");
        numbers.push(
            student
                .matriculation_number
                .expect("assigned at creation")
                .to_string(),
        );
    }

    assert_eq!(numbers, vec!["MAT-001", "MAT-002", "MAT-003"]);

    let berta = ctx
        .students
        .get_by_matriculation(&MatriculationNumber::from_index(2))
        .expect("lookup by matriculation");
    assert_eq!(berta.first_name, "Berta");

    // Enrollment through approval continues the same sequence.
    let candidate = ctx
        .candidates
        .create(intake("MZ-04", "Dina", "Macamo"), now)
        .expect("intake succeeds");
    let sponsor = ctx
        .sponsors
        .create(sponsor_intake("Marta", "Lopez", "marta@example.org"), now)
        .expect("sponsor registered");
    let outcome = ctx
        .lifecycle
        .approve_candidate(
            &candidate.id,
            Some(SponsorSelection::Existing(sponsor.id)),
            now,
        )
        .expect("approval proceeds");
    let student = ctx
        .students
        .get(&outcome.student_id.expect("student created"))
        .expect("student readable");
    assert_eq!(
        student.matriculation_number.expect("assigned").to_string(),
        "MAT-004"
    );
}

#[test]
fn matriculation_falls_back_to_a_timestamp_suffix_when_the_query_fails() {
    struct FlakyMatriculationStore(MemoryStudentStore);

    impl StudentStore for FlakyMatriculationStore {
        fn insert(
            &self,
            record: padrino::program::students::domain::Student,
        ) -> Result<padrino::program::students::domain::Student, StoreError> {
            self.0.insert(record)
        }
        fn update(
            &self,
            record: padrino::program::students::domain::Student,
        ) -> Result<(), StoreError> {
            self.0.update(record)
        }
        fn fetch(
            &self,
            id: &padrino::program::students::domain::StudentId,
        ) -> Result<Option<padrino::program::students::domain::Student>, StoreError> {
            self.0.fetch(id)
        }
        fn list(
            &self,
        ) -> Result<Vec<padrino::program::students::domain::Student>, StoreError> {
            self.0.list()
        }
        fn delete(
            &self,
            id: &padrino::program::students::domain::StudentId,
        ) -> Result<(), StoreError> {
            self.0.delete(id)
        }
        fn latest_matriculation(&self) -> Result<Option<MatriculationNumber>, StoreError> {
            Err(StoreError::Unavailable("index offline".to_string()))
        }
    }

    let registry = StudentRegistry::new(
        Arc::new(FlakyMatriculationStore(MemoryStudentStore::default())),
        TuitionSchedule::default(),
        enrollment_defaults(),
    );

    let now = ts(2026, 2, 1);
    let number = registry.next_matriculation(now);
    let suffix = number
        .as_str()
        .strip_prefix("MAT-")
        .expect("prefixed fallback");
    assert_eq!(suffix.len(), 6);
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn payments_drive_the_cached_standing() {
    let ctx = context();
    let now = ts(2026, 3, 10);

    let candidate = ctx
        .candidates
        .create(intake("MZ-10", "Ana", "Silva"), now)
        .expect("intake succeeds");
    let sponsor = ctx
        .sponsors
        .create(sponsor_intake("Marta", "Lopez", "marta@example.org"), now)
        .expect("sponsor registered");
    let outcome = ctx
        .lifecycle
        .approve_candidate(
            &candidate.id,
            Some(SponsorSelection::Existing(sponsor.id)),
            now,
        )
        .expect("approval proceeds");
    let student_id = outcome.student_id.expect("student created");

    // Freshly enrolled: the creation-time default stands until a payment.
    let student = ctx.students.get(&student_id).expect("student readable");
    assert_eq!(student.payment_status, PaymentStanding::Pending);
    assert_eq!(student.total_due, 420.0);
    assert_eq!(student.total_paid, 0.0);

    // Partial payment inside the running month.
    let write = ctx
        .ledger
        .add(&student_id, monthly(100.0, ts(2026, 3, 12)), ts(2026, 3, 12))
        .expect("payment recorded");
    assert!(!write.refresh.is_failed());
    let student = ctx.students.get(&student_id).expect("student readable");
    assert_eq!(student.payment_status, PaymentStanding::Current);
    assert_eq!(student.total_paid, 100.0);

    // Time passes; refresh against a later month with no new payments.
    ctx.ledger
        .refresh_standing(&student_id, ts(2026, 11, 5))
        .expect("refresh runs");
    let student = ctx.students.get(&student_id).expect("student readable");
    assert_eq!(student.payment_status, PaymentStanding::Overdue);

    // Settling the full balance flips it to paid regardless of the month.
    let settlement = NewPayment {
        kind: PaymentKind::Balance,
        amount: 320.0,
        date: ts(2026, 11, 6),
        month: None,
        receipt_number: Some("R-0042".to_string()),
        receipt_url: None,
        receipt_path: None,
        notes: None,
        status: PaymentState::Paid,
    };
    ctx.ledger
        .add(&student_id, settlement, ts(2026, 11, 6))
        .expect("payment recorded");
    let student = ctx.students.get(&student_id).expect("student readable");
    assert_eq!(student.payment_status, PaymentStanding::Paid);
    assert_eq!(student.total_paid, 420.0);
}

#[test]
fn cancelling_a_payment_recomputes_the_totals() {
    let ctx = context();
    let now = ts(2026, 3, 10);
    let student = ctx
        .students
        .create(new_student("Paulo", "Macamo", "MZ-20"), now)
        .expect("direct add succeeds");

    let write = ctx
        .ledger
        .add(&student.id, monthly(420.0, now), now)
        .expect("payment recorded");
    assert_eq!(
        ctx.students
            .get(&student.id)
            .expect("student readable")
            .payment_status,
        PaymentStanding::Paid
    );

    ctx.ledger
        .update(
            &student.id,
            &write.payment.id,
            PaymentPatch {
                status: Some(PaymentState::Cancelled),
                ..PaymentPatch::default()
            },
            ts(2026, 3, 11),
        )
        .expect("payment updated");

    let student = ctx.students.get(&student.id).expect("student readable");
    assert_eq!(student.total_paid, 0.0);
    assert_eq!(student.payment_status, PaymentStanding::Overdue);
}

#[test]
fn payments_list_newest_first() {
    let ctx = context();
    let now = ts(2026, 2, 1);
    let student = ctx
        .students
        .create(new_student("Paulo", "Macamo", "MZ-21"), now)
        .expect("direct add succeeds");

    for (amount, when) in [
        (40.0, ts(2026, 2, 5)),
        (40.0, ts(2026, 4, 5)),
        (40.0, ts(2026, 3, 5)),
    ] {
        ctx.ledger
            .add(&student.id, monthly(amount, when), when)
            .expect("payment recorded");
    }

    let payments = ctx
        .ledger
        .list_for_student(&student.id)
        .expect("list succeeds");
    let dates: Vec<_> = payments.iter().map(|payment| payment.date).collect();
    assert_eq!(dates, vec![ts(2026, 4, 5), ts(2026, 3, 5), ts(2026, 2, 5)]);
}

#[test]
fn deleting_a_student_cascades_its_payments() {
    let ctx = context();
    let now = ts(2026, 2, 1);
    let student = ctx
        .students
        .create(new_student("Paulo", "Macamo", "MZ-22"), now)
        .expect("direct add succeeds");
    ctx.ledger
        .add(&student.id, monthly(40.0, now), now)
        .expect("payment recorded");
    ctx.ledger
        .add(&student.id, monthly(40.0, ts(2026, 3, 1)), ts(2026, 3, 1))
        .expect("payment recorded");

    let removed = ctx.delete_student(&student.id).expect("delete succeeds");
    assert_eq!(removed, 2);
    assert!(matches!(
        ctx.students.get(&student.id),
        Err(padrino::program::students::registry::StudentError::Store(StoreError::NotFound))
    ));
    assert!(ctx
        .ledger
        .list_for_student(&student.id)
        .expect("list still answers")
        .is_empty());
}

#[test]
fn sponsor_search_matches_name_fragments_case_insensitively() {
    let ctx = context();
    let now = ts(2026, 2, 1);
    ctx.sponsors
        .create(sponsor_intake("Marta", "Lopez", "marta@example.org"), now)
        .expect("sponsor registered");
    ctx.sponsors
        .create(sponsor_intake("Miguel", "Ángel", "miguel@example.org"), now)
        .expect("sponsor registered");
    ctx.sponsors
        .create(sponsor_intake("Carmen", "Delgado", "carmen@example.org"), now)
        .expect("sponsor registered");

    let hits = ctx.sponsors.search("mar").expect("search succeeds");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].first_name, "Marta");

    let hits = ctx.sponsors.search("LOPEZ").expect("search succeeds");
    assert_eq!(hits.len(), 1);

    let hits = ctx.sponsors.search("marta lopez").expect("search succeeds");
    assert_eq!(hits.len(), 1);

    let hits = ctx.sponsors.search("nobody").expect("search succeeds");
    assert!(hits.is_empty());

    // Blank terms degrade to the ordered listing.
    let all = ctx.sponsors.search("  ").expect("search succeeds");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].last_name, "Delgado");
}

#[test]
fn sponsor_edits_leave_existing_snapshots_stale() {
    let ctx = context();
    let now = ts(2026, 2, 1);
    let candidate = ctx
        .candidates
        .create(intake("MZ-30", "Ana", "Silva"), now)
        .expect("intake succeeds");
    let sponsor = ctx
        .sponsors
        .create(sponsor_intake("Marta", "Lopez", "marta@example.org"), now)
        .expect("sponsor registered");
    let outcome = ctx
        .lifecycle
        .approve_candidate(
            &candidate.id,
            Some(SponsorSelection::Existing(sponsor.id.clone())),
            now,
        )
        .expect("approval proceeds");
    let student_id = outcome.student_id.expect("student created");

    ctx.sponsors
        .update(
            &sponsor.id,
            SponsorPatch {
                email: Some("marta.new@example.org".to_string()),
                ..SponsorPatch::default()
            },
            ts(2026, 6, 1),
        )
        .expect("sponsor edit persists");

    // The snapshot is point-in-time; only re-approval refreshes it.
    let student = ctx.students.get(&student_id).expect("student readable");
    assert_eq!(
        student.sponsor.as_ref().expect("snapshot").email,
        "marta@example.org"
    );

    ctx.lifecycle
        .approve_candidate(&candidate.id, None, ts(2026, 6, 2))
        .expect("re-approval");
    let student = ctx.students.get(&student_id).expect("student readable");
    assert_eq!(
        student.sponsor.as_ref().expect("snapshot").email,
        "marta.new@example.org"
    );
}

#[test]
fn deactivation_clears_both_records() {
    let ctx = context();
    let now = ts(2026, 2, 1);
    let candidate = ctx
        .candidates
        .create(intake("MZ-40", "Ana", "Silva"), now)
        .expect("intake succeeds");
    let sponsor = ctx
        .sponsors
        .create(sponsor_intake("Marta", "Lopez", "marta@example.org"), now)
        .expect("sponsor registered");
    ctx.lifecycle
        .approve_candidate(
            &candidate.id,
            Some(SponsorSelection::Existing(sponsor.id)),
            now,
        )
        .expect("approval proceeds");

    let outcome = ctx
        .lifecycle
        .change_candidate_status(&candidate.id, CandidateStatus::Rejected, true, ts(2026, 7, 1))
        .expect("deactivation proceeds");

    assert_eq!(outcome.candidate.status, CandidateStatus::Rejected);
    assert!(outcome.candidate.sponsor_id.is_none());

    let student = ctx
        .students
        .find_by_candidate_id(&candidate.id)
        .expect("scan succeeds")
        .expect("student exists");
    assert_eq!(student.status, StudentStatus::Inactive);
    assert!(student.sponsor_id.is_none());
    assert!(student.sponsor.is_none());
}

#[test]
fn reminders_carry_cached_totals_and_surface_relay_rejections() {
    let (ctx, students) = context_with_students();
    let now = ts(2026, 3, 10);
    let candidate = ctx
        .candidates
        .create(intake("MZ-50", "Ana", "Silva"), now)
        .expect("intake succeeds");
    let sponsor = ctx
        .sponsors
        .create(sponsor_intake("Marta", "Lopez", "marta@example.org"), now)
        .expect("sponsor registered");
    let outcome = ctx
        .lifecycle
        .approve_candidate(
            &candidate.id,
            Some(SponsorSelection::Existing(sponsor.id)),
            now,
        )
        .expect("approval proceeds");
    let student_id = outcome.student_id.expect("student created");
    ctx.ledger
        .add(&student_id, monthly(100.0, now), now)
        .expect("payment recorded");

    let relay = Arc::new(RecordingRelay::default());
    let dispatcher = ReminderDispatcher::new(students.clone(), relay.clone());
    let response = dispatcher
        .send_for_student(&student_id)
        .expect("reminder dispatched");
    assert!(response.success);

    let sent = relay.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].sponsor_email, "marta@example.org");
    assert_eq!(sent[0].total_paid, 100.0);
    assert_eq!(sent[0].total_due, 420.0);
    assert_eq!(sent[0].payment_status, PaymentStanding::Current);
    assert_eq!(sent[0].student_matriculation_number, "MAT-001");

    let rejecting = Arc::new(RecordingRelay::rejecting("mailbox unavailable"));
    let dispatcher = ReminderDispatcher::new(students, rejecting);
    match dispatcher.send_for_student(&student_id) {
        Err(RelayError::Rejected(message)) => assert_eq!(message, "mailbox unavailable"),
        other => panic!("expected relay rejection, got {other:?}"),
    }
}

#[test]
fn reminders_require_a_sponsor_on_file() {
    let (ctx, students) = context_with_students();
    let now = ts(2026, 3, 10);
    let student = ctx
        .students
        .create(new_student("Paulo", "Macamo", "MZ-60"), now)
        .expect("direct add succeeds");

    let relay = Arc::new(RecordingRelay::default());
    let dispatcher = ReminderDispatcher::new(students, relay.clone());
    assert!(matches!(
        dispatcher.send_for_student(&student.id),
        Err(RelayError::MissingSponsor)
    ));
    assert!(relay.sent().is_empty());
}
