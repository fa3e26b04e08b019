//! The sponsorship program core: entity registries, the payment ledger, and
//! the lifecycle synchronizer that couples them.

pub mod candidates;
pub mod lifecycle;
pub mod payments;
pub mod router;
pub mod sponsors;
pub mod students;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use self::candidates::registry::CandidateRegistry;
use self::candidates::repository::CandidateStore;
use self::lifecycle::LifecycleSynchronizer;
use self::payments::domain::TuitionSchedule;
use self::payments::ledger::PaymentLedger;
use self::payments::repository::PaymentStore;
use self::sponsors::registry::SponsorRegistry;
use self::sponsors::repository::SponsorStore;
use self::students::domain::{EnrollmentDefaults, StudentId};
use self::students::registry::{StudentError, StudentRegistry};
use self::students::repository::StudentStore;

/// Outcome of the best-effort second phase of a two-phase write, so callers
/// can report "primary updated, sync failed" precisely instead of throwing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Applied,
    NotRequired,
    Failed { detail: String },
}

impl SyncStatus {
    pub fn failed(detail: impl Into<String>) -> Self {
        SyncStatus::Failed {
            detail: detail.into(),
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Failed { .. })
    }
}

/// Everything the back office operates on, wired over one set of stores.
pub struct ProgramContext<C, S, Z, P> {
    pub candidates: CandidateRegistry<C>,
    pub students: StudentRegistry<S>,
    pub sponsors: SponsorRegistry<Z>,
    pub ledger: PaymentLedger<P, S>,
    pub lifecycle: LifecycleSynchronizer<C, S, Z>,
}

impl<C, S, Z, P> ProgramContext<C, S, Z, P>
where
    C: CandidateStore,
    S: StudentStore,
    Z: SponsorStore,
    P: PaymentStore,
{
    pub fn new(
        candidates: Arc<C>,
        students: Arc<S>,
        sponsors: Arc<Z>,
        payments: Arc<P>,
        schedule: TuitionSchedule,
        defaults: EnrollmentDefaults,
    ) -> Self {
        let candidates = CandidateRegistry::new(candidates);
        let students = StudentRegistry::new(students, schedule, defaults);
        let sponsors = SponsorRegistry::new(sponsors);
        let ledger = PaymentLedger::new(payments, students.clone());
        let lifecycle =
            LifecycleSynchronizer::new(candidates.clone(), students.clone(), sponsors.clone());

        Self {
            candidates,
            students,
            sponsors,
            ledger,
            lifecycle,
        }
    }

    /// Remove a student along with its payments subcollection. Leaving the
    /// payments orphaned would skew every later program-wide total, so the
    /// cascade is deliberate; the count is logged for the audit trail.
    pub fn delete_student(&self, id: &StudentId) -> Result<usize, StudentError> {
        let removed = self.ledger.purge_student(id)?;
        self.students.delete(id)?;
        info!(student_id = %id.0, payments_removed = removed, "student deleted");
        Ok(removed)
    }
}
