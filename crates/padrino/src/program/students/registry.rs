use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{
    EnrollmentDefaults, MatriculationNumber, NewStudent, PaymentStanding, Student, StudentId,
    StudentPatch, StudentStatus,
};
use super::repository::StudentStore;
use crate::program::candidates::domain::{derive_full_name, CandidateId};
use crate::program::payments::domain::TuitionSchedule;
use crate::store::StoreError;

/// Validation errors raised before any student write.
#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    #[error("first and last name are required")]
    MissingName,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD surface over the students collection, including matriculation
/// numbering and the inactive-transition sponsor rule.
pub struct StudentRegistry<S> {
    store: Arc<S>,
    schedule: TuitionSchedule,
    defaults: EnrollmentDefaults,
}

impl<S> Clone for StudentRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            schedule: self.schedule.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

impl<S> StudentRegistry<S>
where
    S: StudentStore,
{
    pub fn new(store: Arc<S>, schedule: TuitionSchedule, defaults: EnrollmentDefaults) -> Self {
        Self {
            store,
            schedule,
            defaults,
        }
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn defaults(&self) -> &EnrollmentDefaults {
        &self.defaults
    }

    pub(crate) fn schedule(&self) -> &TuitionSchedule {
        &self.schedule
    }

    /// Direct admin add: assigns the next matriculation number immediately and
    /// starts the tuition standing at its creation-time default.
    pub fn create(&self, intake: NewStudent, now: DateTime<Utc>) -> Result<Student, StudentError> {
        let full_name = derive_full_name(&intake.first_name, &intake.last_name);
        if full_name.is_empty() {
            return Err(StudentError::MissingName);
        }

        let mut record = Student {
            id: StudentId(String::new()),
            matriculation_number: Some(self.next_matriculation(now)),
            candidate_id: None,
            first_name: intake.first_name,
            last_name: intake.last_name,
            full_name,
            document_id: intake.document_id,
            gender: intake.gender,
            birth_date: intake.birth_date,
            current_grade: intake
                .current_grade
                .unwrap_or_else(|| self.defaults.grade.clone()),
            academic_year: intake
                .academic_year
                .unwrap_or_else(|| self.defaults.academic_year.clone()),
            enrollment_date: now,
            city: intake.city.unwrap_or_else(|| self.defaults.city.clone()),
            province: intake
                .province
                .unwrap_or_else(|| self.defaults.province.clone()),
            country: intake
                .country
                .unwrap_or_else(|| self.defaults.country.clone()),
            notes: intake.notes,
            photo_url: intake.photo_url,
            photo_path: intake.photo_path,
            status: StudentStatus::Active,
            payment_status: PaymentStanding::Pending,
            total_paid: 0.0,
            total_due: 0.0,
            full_payment_amount: intake.full_payment_amount,
            enrollment_fee: intake.enrollment_fee,
            monthly_fee: intake.monthly_fee,
            months_in_year: intake.months_in_year,
            sponsor_id: None,
            sponsor: None,
            sponsor_assigned_date: None,
            created_at: now,
            updated_at: now,
        };
        record.total_due = self.schedule.total_due_for(&record);

        Ok(self.store.insert(record)?)
    }

    /// Apply the patch and rewrite the document. A transition into `inactive`
    /// clears the sponsor linkage and snapshot; payment caches are left alone
    /// (only the ledger rewrites those).
    pub fn update(
        &self,
        id: &StudentId,
        patch: StudentPatch,
        now: DateTime<Utc>,
    ) -> Result<Student, StudentError> {
        let mut record = self.get(id)?;
        let previous_status = record.status;

        if let Some(first_name) = patch.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            record.last_name = last_name;
        }
        if let Some(document_id) = patch.document_id {
            record.document_id = document_id;
        }
        if let Some(gender) = patch.gender {
            record.gender = Some(gender);
        }
        if let Some(birth_date) = patch.birth_date {
            record.birth_date = Some(birth_date);
        }
        if let Some(current_grade) = patch.current_grade {
            record.current_grade = current_grade;
        }
        if let Some(academic_year) = patch.academic_year {
            record.academic_year = academic_year;
        }
        if let Some(city) = patch.city {
            record.city = city;
        }
        if let Some(province) = patch.province {
            record.province = province;
        }
        if let Some(country) = patch.country {
            record.country = country;
        }
        if let Some(notes) = patch.notes {
            record.notes = Some(notes);
        }
        if let Some(photo_url) = patch.photo_url {
            record.photo_url = Some(photo_url);
        }
        if let Some(photo_path) = patch.photo_path {
            record.photo_path = Some(photo_path);
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(amount) = patch.full_payment_amount {
            record.full_payment_amount = Some(amount);
        }
        if let Some(fee) = patch.enrollment_fee {
            record.enrollment_fee = Some(fee);
        }
        if let Some(fee) = patch.monthly_fee {
            record.monthly_fee = Some(fee);
        }
        if let Some(months) = patch.months_in_year {
            record.months_in_year = Some(months);
        }

        let derived = derive_full_name(&record.first_name, &record.last_name);
        if !derived.is_empty() {
            record.full_name = derived;
        }

        if previous_status != StudentStatus::Inactive && record.status == StudentStatus::Inactive {
            record.clear_sponsor();
        }

        self.persist(record, now).map_err(StudentError::from)
    }

    /// Rewrite a record the caller already mutated, stamping `updated_at`.
    /// Used by the lifecycle module and the payment ledger.
    pub(crate) fn persist(
        &self,
        mut record: Student,
        now: DateTime<Utc>,
    ) -> Result<Student, StoreError> {
        record.updated_at = now;
        self.store.update(record.clone())?;
        Ok(record)
    }

    pub fn get(&self, id: &StudentId) -> Result<Student, StudentError> {
        Ok(self.store.fetch(id)?.ok_or(StoreError::NotFound)?)
    }

    pub fn list(&self) -> Result<Vec<Student>, StoreError> {
        self.store.list()
    }

    pub fn list_by_status(&self, status: StudentStatus) -> Result<Vec<Student>, StoreError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|student| student.status == status)
            .collect())
    }

    pub fn list_by_academic_year(&self, year: &str) -> Result<Vec<Student>, StoreError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|student| student.academic_year == year)
            .collect())
    }

    pub fn get_by_matriculation(
        &self,
        number: &MatriculationNumber,
    ) -> Result<Student, StudentError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .find(|student| student.matriculation_number.as_ref() == Some(number))
            .ok_or(StoreError::NotFound)?)
    }

    /// Next matriculation number: largest on record plus one, zero-padded.
    /// `MAT-001` on an empty collection. When the query itself fails, falls
    /// back to a timestamp-derived suffix. The fallback is not collision-free
    /// under concurrent creation, which this system's single-operator write
    /// rate tolerates; callers needing strict uniqueness must check again.
    pub fn next_matriculation(&self, now: DateTime<Utc>) -> MatriculationNumber {
        match self.store.latest_matriculation() {
            Ok(Some(latest)) => {
                MatriculationNumber::from_index(latest.numeric_suffix().unwrap_or(0) + 1)
            }
            Ok(None) => MatriculationNumber::from_index(1),
            Err(err) => {
                warn!(error = %err, "matriculation query failed, using timestamp fallback");
                let suffix = now.timestamp_millis().unsigned_abs() % 1_000_000;
                MatriculationNumber::new(format!(
                    "{}{suffix:06}",
                    MatriculationNumber::PREFIX
                ))
            }
        }
    }

    /// Scan for the student paired to a candidate. First match wins; more
    /// than one match is undefined data and only logged.
    pub fn find_by_candidate_id(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Option<Student>, StoreError> {
        let matches: Vec<Student> = self
            .store
            .list()?
            .into_iter()
            .filter(|student| student.candidate_id.as_ref() == Some(candidate_id))
            .collect();

        if matches.len() > 1 {
            warn!(
                candidate_id = %candidate_id.0,
                matches = matches.len(),
                "multiple students share one candidate id"
            );
        }

        Ok(matches.into_iter().next())
    }

    /// Set the paired student's status, applying the inactive-transition rule.
    /// Returns `None` when no student is paired to the candidate.
    pub fn set_status_by_candidate_id(
        &self,
        candidate_id: &CandidateId,
        status: StudentStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Student>, StudentError> {
        let Some(mut student) = self.find_by_candidate_id(candidate_id)? else {
            return Ok(None);
        };

        if student.status != StudentStatus::Inactive && status == StudentStatus::Inactive {
            student.clear_sponsor();
        }
        student.status = status;

        Ok(Some(self.persist(student, now)?))
    }

    pub fn delete(&self, id: &StudentId) -> Result<(), StoreError> {
        self.store.delete(id)
    }
}
