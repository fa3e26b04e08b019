#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use padrino::program::candidates::domain::{Candidate, CandidateId, NewCandidate};
use padrino::program::candidates::repository::CandidateStore;
use padrino::program::payments::domain::{Payment, PaymentId, TuitionSchedule};
use padrino::program::payments::repository::PaymentStore;
use padrino::program::sponsors::domain::{NewSponsor, Sponsor, SponsorId};
use padrino::program::sponsors::repository::SponsorStore;
use padrino::program::students::domain::{
    EnrollmentDefaults, MatriculationNumber, Student, StudentId,
};
use padrino::program::students::repository::StudentStore;
use padrino::program::ProgramContext;
use padrino::relay::{EmailRelay, PaymentReminder, RelayError, RelayResponse};
use padrino::store::StoreError;

#[derive(Default)]
pub struct MemoryCandidateStore {
    records: Mutex<HashMap<String, Candidate>>,
    sequence: AtomicU64,
}

impl CandidateStore for MemoryCandidateStore {
    fn insert(&self, mut record: Candidate) -> Result<Candidate, StoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        record.id = CandidateId(format!("cand-{id:06}"));
        let mut guard = self.records.lock().expect("candidate mutex poisoned");
        guard.insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: Candidate) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("candidate mutex poisoned");
        if !guard.contains_key(&record.id.0) {
            return Err(StoreError::NotFound);
        }
        guard.insert(record.id.0.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, StoreError> {
        let guard = self.records.lock().expect("candidate mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn list(&self) -> Result<Vec<Candidate>, StoreError> {
        let guard = self.records.lock().expect("candidate mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn delete(&self, id: &CandidateId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("candidate mutex poisoned");
        guard.remove(&id.0).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryStudentStore {
    records: Mutex<HashMap<String, Student>>,
    sequence: AtomicU64,
}

impl StudentStore for MemoryStudentStore {
    fn insert(&self, mut record: Student) -> Result<Student, StoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        record.id = StudentId(format!("stu-{id:06}"));
        let mut guard = self.records.lock().expect("student mutex poisoned");
        guard.insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: Student) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("student mutex poisoned");
        if !guard.contains_key(&record.id.0) {
            return Err(StoreError::NotFound);
        }
        guard.insert(record.id.0.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &StudentId) -> Result<Option<Student>, StoreError> {
        let guard = self.records.lock().expect("student mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn list(&self) -> Result<Vec<Student>, StoreError> {
        let guard = self.records.lock().expect("student mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn delete(&self, id: &StudentId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("student mutex poisoned");
        guard.remove(&id.0).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn latest_matriculation(&self) -> Result<Option<MatriculationNumber>, StoreError> {
        let guard = self.records.lock().expect("student mutex poisoned");
        Ok(guard
            .values()
            .filter_map(|student| student.matriculation_number.clone())
            .max())
    }
}

#[derive(Default)]
pub struct MemorySponsorStore {
    records: Mutex<HashMap<String, Sponsor>>,
    sequence: AtomicU64,
}

impl SponsorStore for MemorySponsorStore {
    fn insert(&self, mut record: Sponsor) -> Result<Sponsor, StoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        record.id = SponsorId(format!("spon-{id:06}"));
        let mut guard = self.records.lock().expect("sponsor mutex poisoned");
        guard.insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: Sponsor) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("sponsor mutex poisoned");
        if !guard.contains_key(&record.id.0) {
            return Err(StoreError::NotFound);
        }
        guard.insert(record.id.0.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &SponsorId) -> Result<Option<Sponsor>, StoreError> {
        let guard = self.records.lock().expect("sponsor mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn list(&self) -> Result<Vec<Sponsor>, StoreError> {
        let guard = self.records.lock().expect("sponsor mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn delete(&self, id: &SponsorId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("sponsor mutex poisoned");
        guard.remove(&id.0).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn list_by_candidate_id(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<Sponsor>, StoreError> {
        let guard = self.records.lock().expect("sponsor mutex poisoned");
        Ok(guard
            .values()
            .filter(|sponsor| sponsor.candidate_ids.contains(candidate_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryPaymentStore {
    records: Mutex<HashMap<String, Vec<Payment>>>,
    sequence: AtomicU64,
}

impl PaymentStore for MemoryPaymentStore {
    fn insert(&self, student_id: &StudentId, mut record: Payment) -> Result<Payment, StoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        record.id = PaymentId(format!("pay-{id:06}"));
        let mut guard = self.records.lock().expect("payment mutex poisoned");
        guard
            .entry(student_id.0.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn update(&self, student_id: &StudentId, record: Payment) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("payment mutex poisoned");
        let payments = guard
            .get_mut(&student_id.0)
            .ok_or(StoreError::NotFound)?;
        let slot = payments
            .iter_mut()
            .find(|payment| payment.id == record.id)
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    fn fetch(
        &self,
        student_id: &StudentId,
        payment_id: &PaymentId,
    ) -> Result<Option<Payment>, StoreError> {
        let guard = self.records.lock().expect("payment mutex poisoned");
        Ok(guard
            .get(&student_id.0)
            .and_then(|payments| payments.iter().find(|payment| &payment.id == payment_id))
            .cloned())
    }

    fn list_for_student(&self, student_id: &StudentId) -> Result<Vec<Payment>, StoreError> {
        let guard = self.records.lock().expect("payment mutex poisoned");
        Ok(guard.get(&student_id.0).cloned().unwrap_or_default())
    }

    fn delete(&self, student_id: &StudentId, payment_id: &PaymentId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("payment mutex poisoned");
        let payments = guard
            .get_mut(&student_id.0)
            .ok_or(StoreError::NotFound)?;
        let before = payments.len();
        payments.retain(|payment| &payment.id != payment_id);
        if payments.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn delete_all_for_student(&self, student_id: &StudentId) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("payment mutex poisoned");
        Ok(guard
            .remove(&student_id.0)
            .map(|payments| payments.len())
            .unwrap_or(0))
    }
}

/// Relay double that records payloads and answers with a configurable result.
#[derive(Default)]
pub struct RecordingRelay {
    sent: Mutex<Vec<PaymentReminder>>,
    pub reject_with: Option<String>,
}

impl RecordingRelay {
    pub fn rejecting(message: &str) -> Self {
        Self {
            sent: Mutex::default(),
            reject_with: Some(message.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<PaymentReminder> {
        self.sent.lock().expect("relay mutex poisoned").clone()
    }
}

impl EmailRelay for RecordingRelay {
    fn send_payment_reminder(
        &self,
        reminder: &PaymentReminder,
    ) -> Result<RelayResponse, RelayError> {
        self.sent
            .lock()
            .expect("relay mutex poisoned")
            .push(reminder.clone());
        match &self.reject_with {
            Some(message) => Ok(RelayResponse {
                success: false,
                message: Some(message.clone()),
            }),
            None => Ok(RelayResponse {
                success: true,
                message: None,
            }),
        }
    }
}

pub type MemoryContext =
    ProgramContext<MemoryCandidateStore, MemoryStudentStore, MemorySponsorStore, MemoryPaymentStore>;

pub fn enrollment_defaults() -> EnrollmentDefaults {
    EnrollmentDefaults {
        grade: "Jardín".to_string(),
        academic_year: "2026".to_string(),
        city: "Lichinga".to_string(),
        province: "Niassa".to_string(),
        country: "Mozambique".to_string(),
    }
}

pub fn context() -> MemoryContext {
    context_with_students().0
}

/// Variant that also hands back the student store for wiring collaborators
/// (e.g. the reminder dispatcher) against the same data.
pub fn context_with_students() -> (MemoryContext, Arc<MemoryStudentStore>) {
    let students = Arc::new(MemoryStudentStore::default());
    let context = ProgramContext::new(
        Arc::new(MemoryCandidateStore::default()),
        students.clone(),
        Arc::new(MemorySponsorStore::default()),
        Arc::new(MemoryPaymentStore::default()),
        TuitionSchedule::default(),
        enrollment_defaults(),
    );
    (context, students)
}

pub fn intake(document_id: &str, first: &str, last: &str) -> NewCandidate {
    NewCandidate {
        document_id: document_id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        level: Some("3ª Clase".to_string()),
        period: Some("2026".to_string()),
        ..NewCandidate::default()
    }
}

pub fn sponsor_intake(first: &str, last: &str, email: &str) -> NewSponsor {
    NewSponsor {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        ..NewSponsor::default()
    }
}

pub fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 0, 0)
        .single()
        .expect("valid instant")
}
