//! Bonus reconciliation for groups whose answers now match.

pub mod domain;
pub mod reconciler;

use std::sync::Arc;

use crate::workflows::pairing::{PairingError, StudentId};

pub use domain::{BonusAmount, BonusLedger, BonusLedgerRow, BonusRecord, BonusStatus};
pub use reconciler::{
    BonusPolicy, BonusReconciler, BonusReconciliation, GroupCheck, DEFAULT_MATCH_THRESHOLD,
};

/// Outbound hook for adjusting a student's quiz submission.
pub trait SubmissionGateway: Send + Sync {
    fn apply_fudge_points(&self, student: StudentId, points: f64) -> Result<(), GatewayError>;
}

/// Submission update error.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no submission found for student {0}")]
    SubmissionNotFound(StudentId),
    #[error("submission transport unavailable: {0}")]
    Transport(String),
}

impl From<GatewayError> for PairingError {
    fn from(err: GatewayError) -> Self {
        PairingError::ExternalDependency(err.to_string())
    }
}

/// Pushes newly earned bonuses to the submission gateway.
pub struct BonusAwarder<G> {
    gateway: Arc<G>,
}

impl<G> BonusAwarder<G>
where
    G: SubmissionGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Applies each `Awarded` status once; previously recorded bonuses are
    /// skipped. Every successful update lands in `applied` before the next
    /// one is attempted, so after a failure `applied` holds exactly the
    /// students whose submissions already changed.
    pub fn award(
        &self,
        outcome: &BonusReconciliation,
        applied: &mut BonusRecord,
    ) -> Result<Vec<StudentId>, PairingError> {
        let mut students = Vec::new();
        for (student, points) in outcome.newly_awarded() {
            if let Err(err) = self.gateway.apply_fudge_points(student, points) {
                tracing::warn!(
                    %student,
                    applied = students.len(),
                    error = %err,
                    "bonus update failed"
                );
                return Err(err.into());
            }
            applied.record(student, points);
            tracing::info!(%student, points, "bonus applied to submission");
            students.push(student);
        }
        Ok(students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        applied: Mutex<Vec<(StudentId, f64)>>,
        missing: Option<StudentId>,
    }

    impl SubmissionGateway for RecordingGateway {
        fn apply_fudge_points(&self, student: StudentId, points: f64) -> Result<(), GatewayError> {
            if self.missing == Some(student) {
                return Err(GatewayError::SubmissionNotFound(student));
            }
            self.applied
                .lock()
                .expect("gateway mutex poisoned")
                .push((student, points));
            Ok(())
        }
    }

    fn outcome() -> BonusReconciliation {
        BonusReconciliation {
            bonus_points: 1.0,
            groups: Vec::new(),
            statuses: BTreeMap::from([
                (StudentId(1), BonusStatus::Awarded(1.0)),
                (StudentId(2), BonusStatus::AlreadyAwarded(1.0)),
                (StudentId(3), BonusStatus::NotEligible),
                (StudentId(4), BonusStatus::Awarded(1.0)),
            ]),
        }
    }

    #[test]
    fn only_new_awards_reach_the_gateway() {
        let gateway = Arc::new(RecordingGateway::default());
        let awarder = BonusAwarder::new(gateway.clone());

        let mut record = BonusRecord::new();
        let applied = awarder
            .award(&outcome(), &mut record)
            .expect("awards succeed");

        assert_eq!(applied, vec![StudentId(1), StudentId(4)]);
        assert!(record.already_awarded(StudentId(4)));
        let calls = gateway.applied.lock().expect("gateway mutex poisoned");
        assert_eq!(*calls, vec![(StudentId(1), 1.0), (StudentId(4), 1.0)]);
    }

    #[test]
    fn gateway_failures_surface_as_external_dependency() {
        let gateway = Arc::new(RecordingGateway {
            missing: Some(StudentId(4)),
            ..RecordingGateway::default()
        });
        let awarder = BonusAwarder::new(gateway);

        let mut record = BonusRecord::new();
        match awarder.award(&outcome(), &mut record) {
            Err(PairingError::ExternalDependency(message)) => {
                assert!(message.contains("student 4"));
            }
            other => panic!("expected external dependency error, got {other:?}"),
        }
    }

    #[test]
    fn failed_run_keeps_only_the_updates_that_went_through() {
        let gateway = Arc::new(RecordingGateway {
            missing: Some(StudentId(4)),
            ..RecordingGateway::default()
        });
        let awarder = BonusAwarder::new(gateway);
        let mut outcome = outcome();
        let mut record = BonusRecord::new();

        awarder
            .award(&outcome, &mut record)
            .expect_err("student 4 has no submission");
        assert!(record.already_awarded(StudentId(1)));
        assert!(!record.already_awarded(StudentId(4)));

        outcome.retain_applied(&record);
        assert_eq!(outcome.status(StudentId(1)), BonusStatus::Awarded(1.0));
        assert_eq!(outcome.status(StudentId(2)), BonusStatus::AlreadyAwarded(1.0));
        assert_eq!(outcome.status(StudentId(4)), BonusStatus::NotEligible);
        let kept: Vec<_> = outcome.record().iter().map(|(id, _)| id).collect();
        assert_eq!(kept, vec![StudentId(1), StudentId(2)]);
    }
}
