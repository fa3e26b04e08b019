use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::program::candidates::domain::{Candidate, CandidateId, NewCandidate};
use crate::program::candidates::registry::CandidateRegistry;
use crate::program::candidates::repository::CandidateStore;
use crate::program::lifecycle::LifecycleSynchronizer;
use crate::program::payments::domain::TuitionSchedule;
use crate::program::sponsors::domain::{NewSponsor, Sponsor, SponsorId};
use crate::program::sponsors::registry::SponsorRegistry;
use crate::program::sponsors::repository::SponsorStore;
use crate::program::students::domain::{EnrollmentDefaults, MatriculationNumber, Student, StudentId};
use crate::program::students::registry::StudentRegistry;
use crate::program::students::repository::StudentStore;
use crate::store::StoreError;

#[derive(Default)]
pub(super) struct MemoryCandidateStore {
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
pub(super) struct MemoryStudentStore {
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

/// Student store whose reads fail, for exercising composite sync outcomes.
pub(super) struct UnavailableStudentStore;

impl StudentStore for UnavailableStudentStore {
    fn insert(&self, _record: Student) -> Result<Student, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: Student) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &StudentId) -> Result<Option<Student>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Student>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &StudentId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn latest_matriculation(&self) -> Result<Option<MatriculationNumber>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemorySponsorStore {
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

pub(super) fn enrollment_defaults() -> EnrollmentDefaults {
    EnrollmentDefaults {
        grade: "Jardín".to_string(),
        academic_year: "2026".to_string(),
        city: "Lichinga".to_string(),
        province: "Niassa".to_string(),
        country: "Mozambique".to_string(),
    }
}

pub(super) struct Harness {
    pub(super) candidates: CandidateRegistry<MemoryCandidateStore>,
    pub(super) students: StudentRegistry<MemoryStudentStore>,
    pub(super) sponsors: SponsorRegistry<MemorySponsorStore>,
    pub(super) sync: LifecycleSynchronizer<MemoryCandidateStore, MemoryStudentStore, MemorySponsorStore>,
}

pub(super) fn harness() -> Harness {
    let candidates = CandidateRegistry::new(Arc::new(MemoryCandidateStore::default()));
    let students = StudentRegistry::new(
        Arc::new(MemoryStudentStore::default()),
        TuitionSchedule::default(),
        enrollment_defaults(),
    );
    let sponsors = SponsorRegistry::new(Arc::new(MemorySponsorStore::default()));
    let sync =
        LifecycleSynchronizer::new(candidates.clone(), students.clone(), sponsors.clone());

    Harness {
        candidates,
        students,
        sponsors,
        sync,
    }
}

/// Same wiring but with a student store that refuses every call.
pub(super) fn harness_with_unavailable_students() -> (
    CandidateRegistry<MemoryCandidateStore>,
    LifecycleSynchronizer<MemoryCandidateStore, UnavailableStudentStore, MemorySponsorStore>,
) {
    let candidates = CandidateRegistry::new(Arc::new(MemoryCandidateStore::default()));
    let students = StudentRegistry::new(
        Arc::new(UnavailableStudentStore),
        TuitionSchedule::default(),
        enrollment_defaults(),
    );
    let sponsors = SponsorRegistry::new(Arc::new(MemorySponsorStore::default()));
    let sync =
        LifecycleSynchronizer::new(candidates.clone(), students, sponsors);
    (candidates, sync)
}

pub(super) fn intake() -> NewCandidate {
    NewCandidate {
        document_id: "MZ-1987-0042".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Silva".to_string(),
        level: Some("3ª Clase".to_string()),
        period: Some("2026".to_string()),
        reason: Some("Family cannot cover tuition".to_string()),
        ..NewCandidate::default()
    }
}

pub(super) fn sponsor_intake() -> NewSponsor {
    NewSponsor {
        first_name: "Marta".to_string(),
        last_name: "Lopez".to_string(),
        email: "marta.lopez@example.org".to_string(),
        phone: Some("+34 600 123 456".to_string()),
        address: Some("Calle Mayor 12".to_string()),
        city: Some("Madrid".to_string()),
        country: Some("España".to_string()),
        ..NewSponsor::default()
    }
}

pub(super) fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 0, 0)
        .single()
        .expect("valid instant")
}
