//! Cross-entity synchronization between candidates, students, and sponsors.
//!
//! The registries are pure field-setters; every rule about what a status
//! change must drag along lives here. Transitions are evaluated before the
//! candidate write, and every secondary write is a separate document write
//! with no transaction around the pair: callers get a composite outcome
//! instead of an exception when the second phase fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::candidates::domain::{Candidate, CandidateId, CandidateStatus};
use super::candidates::registry::{CandidateError, CandidateRegistry};
use super::candidates::repository::CandidateStore;
use super::sponsors::domain::{NewSponsor, Sponsor, SponsorId};
use super::sponsors::registry::{SponsorError, SponsorRegistry};
use super::sponsors::repository::SponsorStore;
use super::students::domain::{
    PaymentStanding, SponsorSnapshot, Student, StudentId, StudentPatch, StudentStatus,
};
use super::students::registry::{StudentError, StudentRegistry};
use super::students::repository::StudentStore;
use super::SyncStatus;
use crate::store::StoreError;

#[cfg(test)]
mod tests;

/// How the operator supplies a sponsor during approval: pick an existing
/// record or register a new one inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SponsorSelection {
    Existing(SponsorId),
    New(NewSponsor),
}

/// Result of a candidate status change: the persisted candidate plus what
/// happened to the paired student.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateTransition {
    pub candidate: Candidate,
    /// Present when the transition created or updated a paired student.
    pub student_id: Option<StudentId>,
    pub student_sync: SyncStatus,
}

/// Result of a student edit made through the lifecycle facade: the persisted
/// student plus the outcome of the reverse candidate sync.
#[derive(Debug, Clone, Serialize)]
pub struct StudentWrite {
    pub student: Student,
    pub candidate_sync: SyncStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("activating a pending candidate requires a sponsor")]
    SponsorRequired,
    #[error("releasing the assigned sponsor requires operator confirmation")]
    SponsorReleaseUnconfirmed,
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    #[error(transparent)]
    Sponsor(#[from] SponsorError),
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The candidate/student/sponsor state machine.
pub struct LifecycleSynchronizer<C, S, Z> {
    candidates: CandidateRegistry<C>,
    students: StudentRegistry<S>,
    sponsors: SponsorRegistry<Z>,
}

impl<C, S, Z> Clone for LifecycleSynchronizer<C, S, Z> {
    fn clone(&self) -> Self {
        Self {
            candidates: self.candidates.clone(),
            students: self.students.clone(),
            sponsors: self.sponsors.clone(),
        }
    }
}

impl<C, S, Z> LifecycleSynchronizer<C, S, Z>
where
    C: CandidateStore,
    S: StudentStore,
    Z: SponsorStore,
{
    pub fn new(
        candidates: CandidateRegistry<C>,
        students: StudentRegistry<S>,
        sponsors: SponsorRegistry<Z>,
    ) -> Self {
        Self {
            candidates,
            students,
            sponsors,
        }
    }

    /// Move a candidate to `active`.
    ///
    /// A pending candidate with no sponsor on record is refused until the
    /// operator supplies a selection; the candidate write happens only once a
    /// sponsor id exists. Re-approving an already-active candidate is allowed
    /// and re-runs the student mapping, which the candidate-id lookup keeps
    /// idempotent.
    pub fn approve_candidate(
        &self,
        id: &CandidateId,
        selection: Option<SponsorSelection>,
        now: DateTime<Utc>,
    ) -> Result<CandidateTransition, LifecycleError> {
        let candidate = self.candidates.get(id)?;

        if candidate.status == CandidateStatus::Pending
            && candidate.sponsor_id.is_none()
            && selection.is_none()
        {
            return Err(LifecycleError::SponsorRequired);
        }

        let sponsor = self.resolve_sponsor(&candidate, selection, now)?;
        self.activate(candidate, sponsor, now)
    }

    /// Apply a candidate status change with its cross-entity effects.
    ///
    /// `active` targets route through the approval path. Leaving `active`
    /// clears the sponsor linkage (refused without `sponsor_release_confirmed`
    /// while a sponsor is assigned) and best-effort deactivates the paired
    /// student. Transitions that never touch `active` are plain field updates.
    pub fn change_candidate_status(
        &self,
        id: &CandidateId,
        to: CandidateStatus,
        sponsor_release_confirmed: bool,
        now: DateTime<Utc>,
    ) -> Result<CandidateTransition, LifecycleError> {
        if to == CandidateStatus::Active {
            return self.approve_candidate(id, None, now);
        }

        let candidate = self.candidates.get(id)?;

        if candidate.status == CandidateStatus::Active {
            if candidate.sponsor_id.is_some() && !sponsor_release_confirmed {
                return Err(LifecycleError::SponsorReleaseUnconfirmed);
            }

            let mut record = candidate;
            record.clear_sponsor();
            record.status = to;
            let record = self.candidates.persist(record, now)?;

            let student_sync = match self.students.set_status_by_candidate_id(
                &record.id,
                StudentStatus::Inactive,
                now,
            ) {
                Ok(Some(_)) => SyncStatus::Applied,
                Ok(None) => SyncStatus::NotRequired,
                Err(err) => {
                    warn!(
                        candidate_id = %record.id.0,
                        error = %err,
                        "student deactivation failed after candidate left active"
                    );
                    SyncStatus::failed(err.to_string())
                }
            };

            return Ok(CandidateTransition {
                candidate: record,
                student_id: None,
                student_sync,
            });
        }

        let mut record = candidate;
        record.status = to;
        let record = self.candidates.persist(record, now)?;
        Ok(CandidateTransition {
            candidate: record,
            student_id: None,
            student_sync: SyncStatus::NotRequired,
        })
    }

    /// Create the paired student for a candidate, or update it if one already
    /// exists. Returns the student id.
    ///
    /// The lookup is a collection scan on `candidate_id`; the create path is
    /// not transactional with it, so two simultaneous approvals of the same
    /// candidate could still race into two students. Accepted for this
    /// system's single-operator usage.
    pub fn create_or_update_student_from_candidate(
        &self,
        candidate: &Candidate,
        sponsor: Option<&Sponsor>,
        now: DateTime<Utc>,
    ) -> Result<StudentId, LifecycleError> {
        let defaults = self.students.defaults().clone();

        if let Some(mut student) = self.students.find_by_candidate_id(&candidate.id)? {
            student.first_name = candidate.first_name.clone();
            student.last_name = candidate.last_name.clone();
            student.full_name = candidate.full_name.clone();
            student.document_id = candidate.document_id.clone();
            student.gender = candidate.gender.clone();
            student.birth_date = candidate.birth_date;
            student.current_grade = candidate
                .level
                .clone()
                .unwrap_or_else(|| defaults.grade.clone());
            student.academic_year = candidate
                .period
                .clone()
                .unwrap_or_else(|| defaults.academic_year.clone());
            student.city = candidate.city.clone().unwrap_or_else(|| defaults.city.clone());
            student.province = candidate
                .province
                .clone()
                .unwrap_or_else(|| defaults.province.clone());
            student.country = candidate
                .country
                .clone()
                .unwrap_or_else(|| defaults.country.clone());
            student.notes = candidate.notes.clone();
            student.photo_url = candidate.photo_url.clone();
            student.photo_path = candidate.photo_path.clone();
            student.status = StudentStatus::Active;
            if student.matriculation_number.is_none() {
                student.matriculation_number = Some(self.students.next_matriculation(now));
            }
            apply_sponsor(&mut student, candidate, sponsor, now);

            // Matriculation, enrollment date, creation stamp, and the
            // payment-derived caches all survive the rewrite untouched.
            let student = self.students.persist(student, now)?;
            return Ok(student.id);
        }

        let mut student = Student {
            id: StudentId(String::new()),
            matriculation_number: Some(self.students.next_matriculation(now)),
            candidate_id: Some(candidate.id.clone()),
            first_name: candidate.first_name.clone(),
            last_name: candidate.last_name.clone(),
            full_name: candidate.full_name.clone(),
            document_id: candidate.document_id.clone(),
            gender: candidate.gender.clone(),
            birth_date: candidate.birth_date,
            current_grade: candidate.level.clone().unwrap_or_else(|| defaults.grade.clone()),
            academic_year: candidate
                .period
                .clone()
                .unwrap_or_else(|| defaults.academic_year.clone()),
            enrollment_date: now,
            city: candidate.city.clone().unwrap_or_else(|| defaults.city.clone()),
            province: candidate
                .province
                .clone()
                .unwrap_or_else(|| defaults.province.clone()),
            country: candidate
                .country
                .clone()
                .unwrap_or_else(|| defaults.country.clone()),
            notes: candidate.notes.clone(),
            photo_url: candidate.photo_url.clone(),
            photo_path: candidate.photo_path.clone(),
            status: StudentStatus::Active,
            payment_status: PaymentStanding::Pending,
            total_paid: 0.0,
            total_due: 0.0,
            full_payment_amount: None,
            enrollment_fee: None,
            monthly_fee: None,
            months_in_year: None,
            sponsor_id: None,
            sponsor: None,
            sponsor_assigned_date: None,
            created_at: now,
            updated_at: now,
        };
        student.total_due = self.students.schedule().total_due_for(&student);
        apply_sponsor(&mut student, candidate, sponsor, now);

        let student = self.students.store().insert(student)?;
        Ok(student.id)
    }

    /// Edit a student and mirror the shared fields back onto its candidate.
    /// The reverse sync is fire-and-forget: its failure never undoes the
    /// student write, it only shows up in the outcome.
    pub fn save_student(
        &self,
        id: &StudentId,
        patch: StudentPatch,
        now: DateTime<Utc>,
    ) -> Result<StudentWrite, LifecycleError> {
        let student = self.students.update(id, patch, now)?;
        let candidate_sync = self.update_candidate_from_student(&student, now);
        Ok(StudentWrite {
            student,
            candidate_sync,
        })
    }

    /// Overwrite the paired candidate's mirrored fields from a student record.
    pub fn update_candidate_from_student(&self, student: &Student, now: DateTime<Utc>) -> SyncStatus {
        let Some(candidate_id) = &student.candidate_id else {
            return SyncStatus::NotRequired;
        };

        let mut candidate = match self.candidates.get(candidate_id) {
            Ok(candidate) => candidate,
            Err(err) => {
                warn!(
                    candidate_id = %candidate_id.0,
                    student_id = %student.id.0,
                    error = %err,
                    "candidate mirror sync skipped: candidate unavailable"
                );
                return SyncStatus::failed(err.to_string());
            }
        };

        candidate.first_name = student.first_name.clone();
        candidate.last_name = student.last_name.clone();
        candidate.full_name = student.full_name.clone();
        candidate.document_id = student.document_id.clone();
        candidate.gender = student.gender.clone();
        candidate.birth_date = student.birth_date;
        candidate.level = Some(student.current_grade.clone());
        candidate.period = Some(student.academic_year.clone());
        candidate.city = Some(student.city.clone());
        candidate.province = Some(student.province.clone());
        candidate.country = Some(student.country.clone());
        candidate.notes = student.notes.clone();
        candidate.photo_url = student.photo_url.clone();
        candidate.photo_path = student.photo_path.clone();

        match self.candidates.persist(candidate, now) {
            Ok(_) => SyncStatus::Applied,
            Err(err) => {
                warn!(
                    candidate_id = %candidate_id.0,
                    student_id = %student.id.0,
                    error = %err,
                    "candidate mirror sync failed"
                );
                SyncStatus::failed(err.to_string())
            }
        }
    }

    /// Look up the sponsor to denormalize: the operator's selection wins,
    /// otherwise the id already on the candidate. A dangling id is tolerated;
    /// the linkage survives without a snapshot.
    fn resolve_sponsor(
        &self,
        candidate: &Candidate,
        selection: Option<SponsorSelection>,
        now: DateTime<Utc>,
    ) -> Result<Option<Sponsor>, LifecycleError> {
        match selection {
            Some(SponsorSelection::Existing(id)) => Ok(Some(self.sponsors.get(&id)?)),
            Some(SponsorSelection::New(intake)) => Ok(Some(self.sponsors.create(intake, now)?)),
            None => match &candidate.sponsor_id {
                Some(id) => match self.sponsors.get(id) {
                    Ok(sponsor) => Ok(Some(sponsor)),
                    Err(SponsorError::Store(StoreError::NotFound)) => {
                        warn!(
                            candidate_id = %candidate.id.0,
                            sponsor_id = %id.0,
                            "candidate references a missing sponsor"
                        );
                        Ok(None)
                    }
                    Err(other) => Err(other.into()),
                },
                None => Ok(None),
            },
        }
    }

    /// Persist the activated candidate, then create-or-update the paired
    /// student as the best-effort second phase.
    fn activate(
        &self,
        mut candidate: Candidate,
        sponsor: Option<Sponsor>,
        now: DateTime<Utc>,
    ) -> Result<CandidateTransition, LifecycleError> {
        if let Some(sponsor) = &sponsor {
            candidate.sponsor_id = Some(sponsor.id.clone());
            if candidate.sponsor_assigned_date.is_none() {
                candidate.sponsor_assigned_date = Some(now);
            }
        }
        candidate.status = CandidateStatus::Active;
        let candidate = self.candidates.persist(candidate, now)?;

        match self.create_or_update_student_from_candidate(&candidate, sponsor.as_ref(), now) {
            Ok(student_id) => Ok(CandidateTransition {
                candidate,
                student_id: Some(student_id),
                student_sync: SyncStatus::Applied,
            }),
            Err(err) => {
                warn!(
                    candidate_id = %candidate.id.0,
                    error = %err,
                    "student enrollment failed after candidate activation"
                );
                let detail = err.to_string();
                Ok(CandidateTransition {
                    candidate,
                    student_id: None,
                    student_sync: SyncStatus::failed(detail),
                })
            }
        }
    }
}

fn apply_sponsor(
    student: &mut Student,
    candidate: &Candidate,
    sponsor: Option<&Sponsor>,
    now: DateTime<Utc>,
) {
    if let Some(sponsor) = sponsor {
        student.sponsor_id = Some(sponsor.id.clone());
        student.sponsor = Some(SponsorSnapshot::from(sponsor));
        student.sponsor_assigned_date = candidate.sponsor_assigned_date.or(Some(now));
    } else if let Some(sponsor_id) = &candidate.sponsor_id {
        student.sponsor_id = Some(sponsor_id.clone());
        student.sponsor_assigned_date = candidate.sponsor_assigned_date.or(Some(now));
    }
}
