use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use mime_guess::mime::Mime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

use padrino::media::{MediaError, MediaStore, StoredMedia};
use padrino::program::candidates::domain::{Candidate, CandidateId};
use padrino::program::candidates::repository::CandidateStore;
use padrino::program::payments::domain::{Payment, PaymentId};
use padrino::program::payments::repository::PaymentStore;
use padrino::program::sponsors::domain::{Sponsor, SponsorId};
use padrino::program::sponsors::repository::SponsorStore;
use padrino::program::students::domain::{MatriculationNumber, Student, StudentId};
use padrino::program::students::repository::StudentStore;
use padrino::program::ProgramContext;
use padrino::relay::{EmailRelay, PaymentReminder, RelayError, RelayResponse, ReminderDispatcher};
use padrino::store::StoreError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Program services shared with the report and reminder endpoints.
#[derive(Clone)]
pub(crate) struct ProgramState {
    pub(crate) context: Arc<AppContext>,
    pub(crate) reminders: Arc<AppReminders>,
}

pub(crate) type AppContext = ProgramContext<
    InMemoryCandidateStore,
    InMemoryStudentStore,
    InMemorySponsorStore,
    InMemoryPaymentStore,
>;

pub(crate) type AppReminders = ReminderDispatcher<InMemoryStudentStore, LogOnlyRelay>;

#[derive(Default)]
pub(crate) struct InMemoryCandidateStore {
    records: Mutex<HashMap<String, Candidate>>,
    sequence: AtomicU64,
}

impl CandidateStore for InMemoryCandidateStore {
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
pub(crate) struct InMemoryStudentStore {
    records: Mutex<HashMap<String, Student>>,
    sequence: AtomicU64,
}

impl StudentStore for InMemoryStudentStore {
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
pub(crate) struct InMemorySponsorStore {
    records: Mutex<HashMap<String, Sponsor>>,
    sequence: AtomicU64,
}

impl SponsorStore for InMemorySponsorStore {
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
pub(crate) struct InMemoryPaymentStore {
    records: Mutex<HashMap<String, Vec<Payment>>>,
    sequence: AtomicU64,
}

impl PaymentStore for InMemoryPaymentStore {
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
        let payments = guard.get_mut(&student_id.0).ok_or(StoreError::NotFound)?;
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
        let payments = guard.get_mut(&student_id.0).ok_or(StoreError::NotFound)?;
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

/// Relay stand-in for deployments without outbound mail configured: the
/// reminder is logged and acknowledged so operators can verify the payload.
#[derive(Default)]
pub(crate) struct LogOnlyRelay;

impl EmailRelay for LogOnlyRelay {
    fn send_payment_reminder(
        &self,
        reminder: &PaymentReminder,
    ) -> Result<RelayResponse, RelayError> {
        info!(
            sponsor = %reminder.sponsor_email,
            student = %reminder.student_name,
            total_due = reminder.total_due,
            total_paid = reminder.total_paid,
            "payment reminder dispatched"
        );
        Ok(RelayResponse {
            success: true,
            message: None,
        })
    }
}

/// Blob store double keeping uploads in memory; paths double as URLs.
#[derive(Default)]
pub(crate) struct InMemoryMediaStore {
    blobs: Mutex<HashMap<String, StoredMedia>>,
}

impl MediaStore for InMemoryMediaStore {
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &Mime,
    ) -> Result<StoredMedia, MediaError> {
        let stored = StoredMedia {
            path: path.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
        };
        let mut guard = self.blobs.lock().expect("media mutex poisoned");
        guard.insert(path.to_string(), stored.clone());
        Ok(stored)
    }

    fn download_url(&self, path: &str) -> Result<String, MediaError> {
        let guard = self.blobs.lock().expect("media mutex poisoned");
        guard
            .get(path)
            .map(|stored| format!("memory://{}", stored.path))
            .ok_or_else(|| MediaError::NotFound(path.to_string()))
    }

    fn delete(&self, path: &str) -> Result<(), MediaError> {
        let mut guard = self.blobs.lock().expect("media mutex poisoned");
        guard
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| MediaError::NotFound(path.to_string()))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
